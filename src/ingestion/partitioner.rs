//! Decade partitioning of validated records into artifact files.

use crate::error::{LoaderError, LoaderResult};
use crate::ingestion::source::{count_rows, RecordStream};
use crate::logging::{DiagnosticEvent, Diagnostics, LogFeature};
use crate::schema::{field_names, MovieRecord, SchemaViolation};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Rows rejected in quarantine mode, next to the artifacts
pub const REJECTED_ROWS_FILE: &str = "rejected_rows.csv";
/// Validated rows between progress lines
pub const PROGRESS_INTERVAL: usize = 1000;

const ARTIFACT_PATTERN: &str = r"^([0-9]*0)s_movies\.csv$";

/// What to do with a row that fails validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidRowPolicy {
    /// The first invalid row fails the whole partition step
    #[default]
    Fail,
    /// Invalid rows go to `rejected_rows.csv`; the rest are partitioned
    Quarantine,
}

/// Records sharing one release decade, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct DecadePartition {
    pub decade: i32,
    pub records: Vec<MovieRecord>,
}

impl DecadePartition {
    pub fn file_name(&self) -> String {
        artifact_file_name(self.decade)
    }
}

/// One artifact on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub decade: i32,
    pub path: PathBuf,
    pub records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub rows_read: usize,
    pub rows_rejected: usize,
    /// Valid rows left out because their release year is unusable
    pub rows_excluded: usize,
    pub artifacts: Vec<ArtifactInfo>,
}

/// `1990` → `1990s_movies.csv`
pub fn artifact_file_name(decade: i32) -> String {
    format!("{}s_movies.csv", decade)
}

/// Decade of a four-digit year
pub fn decade_of(year: i32) -> i32 {
    (year / 10) * 10
}

/// Decade artifacts present in `dir`, ordered by decade
pub fn discover_artifacts(dir: &Path) -> LoaderResult<Vec<(i32, PathBuf)>> {
    let pattern = Regex::new(ARTIFACT_PATTERN)
        .map_err(|e| LoaderError::configuration(format!("Invalid artifact pattern: {}", e)))?;
    let entries = fs::read_dir(dir)
        .map_err(|e| LoaderError::transient_io(format!("listing {}", dir.display()), e))?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| LoaderError::transient_io(format!("listing {}", dir.display()), e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(decade) = pattern
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
        else {
            continue;
        };
        artifacts.push((decade, entry.path()));
    }
    artifacts.sort();
    Ok(artifacts)
}

/// Groups a source file's validated records by release decade and writes one artifact
/// per non-empty decade.
pub struct DecadePartitioner<'d> {
    diagnostics: &'d Diagnostics,
    policy: InvalidRowPolicy,
}

impl<'d> DecadePartitioner<'d> {
    pub fn new(diagnostics: &'d Diagnostics, policy: InvalidRowPolicy) -> Self {
        Self {
            diagnostics,
            policy,
        }
    }

    /// Validate `source` completely, then partition and write artifacts into `output_dir`.
    pub fn run(&self, source: &Path, output_dir: &Path) -> LoaderResult<PartitionSummary> {
        if !source.is_file() {
            return Err(LoaderError::configuration(format!(
                "Source file {} does not exist",
                source.display()
            )));
        }
        fs::create_dir_all(output_dir)
            .map_err(|e| LoaderError::transient_io(format!("creating {}", output_dir.display()), e))?;

        let total = count_rows(source)?;
        self.diagnostics.info(
            LogFeature::Partitioner,
            format!("Partitioning {} ({} rows)", source.display(), total),
        );

        let mut summary = PartitionSummary::default();
        let records = self.collect_valid(source, output_dir, total, &mut summary)?;
        let valid = records.len();

        let partitions = self.partition(records);
        let kept: usize = partitions.iter().map(|p| p.records.len()).sum();
        summary.rows_excluded = valid - kept;
        summary.artifacts = self.write_artifacts(&partitions, output_dir)?;

        self.diagnostics.info(
            LogFeature::Partitioner,
            format!(
                "Partitioned {} rows into {} artifacts ({} rejected, {} excluded)",
                summary.rows_read,
                summary.artifacts.len(),
                summary.rows_rejected,
                summary.rows_excluded
            ),
        );
        Ok(summary)
    }

    /// Group records by release decade, keeping source order within each decade.
    ///
    /// Records whose `release_date` does not start with four digits are excluded from
    /// every partition.
    pub fn partition<I>(&self, records: I) -> Vec<DecadePartition>
    where
        I: IntoIterator<Item = MovieRecord>,
    {
        let mut buckets: BTreeMap<i32, Vec<MovieRecord>> = BTreeMap::new();
        for record in records {
            match record.release_year() {
                Some(year) => buckets.entry(decade_of(year)).or_default().push(record),
                None => self.diagnostics.record(
                    DiagnosticEvent::warning(
                        LogFeature::Partitioner,
                        format!(
                            "Invalid release_date {:?} for movie {} (id {}); excluded from all partitions",
                            record.release_date, record.title, record.id
                        ),
                    )
                    .on_field("release_date"),
                ),
            }
        }

        buckets
            .into_iter()
            .map(|(decade, records)| DecadePartition { decade, records })
            .collect()
    }

    /// Serialize each partition to `{decade}s_movies.csv`, replacing stale artifacts.
    pub fn write_artifacts(
        &self,
        partitions: &[DecadePartition],
        output_dir: &Path,
    ) -> LoaderResult<Vec<ArtifactInfo>> {
        for (decade, path) in discover_artifacts(output_dir)? {
            if !partitions.iter().any(|p| p.decade == decade) {
                fs::remove_file(&path)
                    .map_err(|e| LoaderError::transient_io(format!("removing {}", path.display()), e))?;
                self.diagnostics.info(
                    LogFeature::Partitioner,
                    format!("Removed stale artifact {}", path.display()),
                );
            }
        }

        let mut written = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let path = output_dir.join(partition.file_name());
            let context = || format!("writing {}", path.display());

            let mut writer = csv::Writer::from_path(&path)
                .map_err(|e| LoaderError::transient_io(context(), e))?;
            writer
                .write_record(field_names())
                .map_err(|e| LoaderError::transient_io(context(), e))?;
            for record in &partition.records {
                writer
                    .write_record(record.to_artifact_row())
                    .map_err(|e| LoaderError::transient_io(context(), e))?;
            }
            writer
                .flush()
                .map_err(|e| LoaderError::transient_io(context(), e))?;

            self.diagnostics.info(
                LogFeature::Partitioner,
                format!(
                    "Created {} with {} records",
                    partition.file_name(),
                    partition.records.len()
                ),
            );
            written.push(ArtifactInfo {
                decade: partition.decade,
                path,
                records: partition.records.len(),
            });
        }
        Ok(written)
    }

    fn collect_valid(
        &self,
        source: &Path,
        output_dir: &Path,
        total: usize,
        summary: &mut PartitionSummary,
    ) -> LoaderResult<Vec<MovieRecord>> {
        let stream = RecordStream::open(source, self.diagnostics)?;
        let mut quarantine = match self.policy {
            InvalidRowPolicy::Fail => None,
            InvalidRowPolicy::Quarantine => Some(Quarantine::create(
                &output_dir.join(REJECTED_ROWS_FILE),
                stream.header(),
            )?),
        };

        let mut records = Vec::new();
        for result in stream {
            summary.rows_read += 1;
            match result {
                Ok(record) => {
                    records.push(record);
                    if records.len() % PROGRESS_INTERVAL == 0 {
                        self.diagnostics.info(
                            LogFeature::Partitioner,
                            format!("Processed {}/{} rows", summary.rows_read, total),
                        );
                    }
                }
                Err(LoaderError::SchemaViolation(violation)) => {
                    self.diagnostics.record(
                        DiagnosticEvent::error(LogFeature::Validator, violation.report())
                            .at_row(violation.row)
                            .on_field(violation.field.clone()),
                    );
                    match quarantine.as_mut() {
                        Some(quarantine) => {
                            quarantine.reject(&violation)?;
                            summary.rows_rejected += 1;
                        }
                        None => return Err(LoaderError::SchemaViolation(violation)),
                    }
                }
                Err(other) => return Err(other),
            }
        }

        if let Some(quarantine) = quarantine {
            quarantine.finish()?;
            if summary.rows_rejected > 0 {
                self.diagnostics.warn(
                    LogFeature::Validator,
                    format!(
                        "{} rows rejected; see {}",
                        summary.rows_rejected,
                        output_dir.join(REJECTED_ROWS_FILE).display()
                    ),
                );
            }
        }
        Ok(records)
    }
}

/// Writer for `rejected_rows.csv`
struct Quarantine {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl Quarantine {
    fn create(path: &Path, source_header: &[String]) -> LoaderResult<Self> {
        let context = || format!("writing {}", path.display());
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| LoaderError::transient_io(context(), e))?;
        let header = ["row", "field", "reason"]
            .into_iter()
            .chain(source_header.iter().map(String::as_str));
        writer
            .write_record(header)
            .map_err(|e| LoaderError::transient_io(context(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    fn reject(&mut self, violation: &SchemaViolation) -> LoaderResult<()> {
        let mut cells = vec![
            violation.row.to_string(),
            violation.field.clone(),
            violation.cause.to_string(),
        ];
        cells.extend(violation.raw_row.iter().map(|(_, value)| value.clone()));
        self.writer
            .write_record(&cells)
            .map_err(|e| LoaderError::transient_io(format!("writing {}", self.path.display()), e))
    }

    fn finish(mut self) -> LoaderResult<()> {
        self.writer
            .flush()
            .map_err(|e| LoaderError::transient_io(format!("writing {}", self.path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::movie;
    use tempfile::tempdir;

    #[test]
    fn decades_use_integer_division() {
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(2000), 2000);
        assert_eq!(decade_of(1880), 1880);
        assert_eq!(artifact_file_name(1990), "1990s_movies.csv");
    }

    #[test]
    fn partition_is_exclusive_and_keeps_order() {
        let diagnostics = Diagnostics::new();
        let partitioner = DecadePartitioner::new(&diagnostics, InvalidRowPolicy::Fail);
        let partitions = partitioner.partition(vec![
            movie(1, "A", "1999-12-31", &[]),
            movie(2, "B", "2000-01-01", &[]),
            movie(3, "C", "unknown", &[]),
            movie(4, "D", "1990-02-02", &[]),
            movie(5, "E", "199", &[]),
        ]);

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].decade, 1990);
        let ids: Vec<i64> = partitions[0].records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(partitions[1].decade, 2000);
        assert_eq!(partitions[1].records[0].id, 2);

        assert_eq!(diagnostics.counts_for(LogFeature::Partitioner).warnings, 2);
    }

    #[test]
    fn discovery_matches_only_decade_artifacts() {
        let dir = tempdir().unwrap();
        for name in [
            "2000s_movies.csv",
            "1990s_movies.csv",
            "1995s_movies.csv",
            "TMDB_all_movies.csv",
            "1990s_movies.csv.bak",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let found: Vec<i32> = discover_artifacts(dir.path())
            .unwrap()
            .into_iter()
            .map(|(decade, _)| decade)
            .collect();
        assert_eq!(found, vec![1990, 2000]);
    }
}
