//! Pre-validation normalization of numeric and list fields.
//!
//! Nothing in here rejects a row. Clamped, unparseable and suspicious values are
//! reported as warnings and the row moves on to validation.

use crate::logging::{DiagnosticEvent, Diagnostics, LogFeature};
use crate::schema::{CleanedRow, CleanedValue, FieldKind, RawRow, MOVIE_FIELDS};
use std::collections::HashMap;

/// Highest plausible `vote_average`
pub const MAX_VOTE_AVERAGE: f64 = 10.0;
/// Highest plausible `runtime`, in minutes
pub const MAX_RUNTIME_MINUTES: f64 = 500.0;
/// Plausible release years, inclusive
pub const RELEASE_YEAR_RANGE: (i32, i32) = (1880, 2025);

/// Result of cleaning a single numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericOutcome {
    /// Parsed as-is (or blank, resolved to the field's default)
    Clean(Option<f64>),
    /// Parsed but negative; clamped to `0.0`
    Clamped(f64),
    /// Could not be parsed; resolved to `0.0`
    Unparseable,
}

impl NumericOutcome {
    pub fn value(self) -> Option<f64> {
        match self {
            NumericOutcome::Clean(value) => value,
            NumericOutcome::Clamped(_) | NumericOutcome::Unparseable => Some(0.0),
        }
    }
}

/// Normalizes raw source rows ahead of validation
#[derive(Debug, Clone, Copy)]
pub struct FieldCleaner {
    report_anomalies: bool,
}

impl Default for FieldCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldCleaner {
    pub fn new() -> Self {
        Self {
            report_anomalies: true,
        }
    }

    /// Cleaner for decade artifacts. Their rows were already cleaned and reported
    /// during partitioning, so nothing is recorded a second time.
    pub fn for_artifacts() -> Self {
        Self {
            report_anomalies: false,
        }
    }

    /// Clean a row. Columns absent from the source stay absent.
    pub fn clean(&self, row: RawRow, diagnostics: &Diagnostics) -> CleanedRow {
        let mut values = HashMap::with_capacity(MOVIE_FIELDS.len());
        let record = |event: DiagnosticEvent| {
            if self.report_anomalies {
                diagnostics.record(event);
            }
        };

        for spec in MOVIE_FIELDS.iter() {
            let Some(raw) = row.get(spec.name) else {
                continue;
            };

            let value = match spec.kind {
                FieldKind::Number | FieldKind::NullableNumber => {
                    let outcome = clean_numeric(spec.kind, raw);
                    match outcome {
                        NumericOutcome::Clamped(original) => record(
                            DiagnosticEvent::warning(
                                LogFeature::Cleaner,
                                format!("Negative value found in {}: {}", spec.name, original),
                            )
                            .at_row(row.ordinal)
                            .on_field(spec.name),
                        ),
                        NumericOutcome::Unparseable => record(
                            DiagnosticEvent::warning(
                                LogFeature::Cleaner,
                                format!("Invalid numerical value in {}: {:?}", spec.name, raw),
                            )
                            .at_row(row.ordinal)
                            .on_field(spec.name),
                        ),
                        NumericOutcome::Clean(_) => {}
                    }
                    CleanedValue::Number(outcome.value())
                }
                FieldKind::List => {
                    let items = clean_list(raw);
                    if items.is_empty() && !raw.trim().is_empty() {
                        record(
                            DiagnosticEvent::warning(
                                LogFeature::Cleaner,
                                format!("Empty list found in {}: {:?}", spec.name, raw),
                            )
                            .at_row(row.ordinal)
                            .on_field(spec.name),
                        );
                    }
                    CleanedValue::List(items)
                }
                FieldKind::Integer | FieldKind::Text | FieldKind::NullableText => {
                    CleanedValue::Text(raw.to_string())
                }
            };
            values.insert(spec.name.to_string(), value);
        }

        let cleaned = CleanedRow { raw: row, values };
        if self.report_anomalies {
            self.flag_suspicious(&cleaned, diagnostics);
        }
        cleaned
    }

    /// Log values that are legal but unlikely. Never changes the row.
    fn flag_suspicious(&self, row: &CleanedRow, diagnostics: &Diagnostics) {
        let title = row.raw.display_title();
        let warn = |field: &str, message: String| {
            diagnostics.record(
                DiagnosticEvent::warning(LogFeature::Cleaner, message)
                    .at_row(row.ordinal())
                    .on_field(field),
            );
        };

        if let Some(CleanedValue::Number(Some(vote_average))) = row.value("vote_average") {
            if *vote_average > MAX_VOTE_AVERAGE {
                warn(
                    "vote_average",
                    format!("Suspicious vote_average: {} for movie {}", vote_average, title),
                );
            }
        }

        if let Some(CleanedValue::Number(Some(runtime))) = row.value("runtime") {
            if *runtime > MAX_RUNTIME_MINUTES {
                warn(
                    "runtime",
                    format!("Suspicious runtime: {} for movie {}", runtime, title),
                );
            }
        }

        if let Some(CleanedValue::Text(release_date)) = row.value("release_date") {
            if !release_date.is_empty() && !is_plausible_release_date(release_date) {
                warn(
                    "release_date",
                    format!("Suspicious release_date: {} for movie {}", release_date, title),
                );
            }
        }
    }
}

/// Apply the numeric cleaning rule to one cell.
///
/// Blank resolves to `null` for nullable fields and `0.0` otherwise. Thousands
/// separators and whitespace are stripped before parsing; negative values clamp to
/// `0.0` and unparseable or non-finite values resolve to `0.0`.
pub fn clean_numeric(kind: FieldKind, raw: &str) -> NumericOutcome {
    if raw.trim().is_empty() {
        return match kind {
            FieldKind::NullableNumber => NumericOutcome::Clean(None),
            _ => NumericOutcome::Clean(Some(0.0)),
        };
    }

    let stripped: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    match stripped.parse::<f64>() {
        Ok(value) if !value.is_finite() => NumericOutcome::Unparseable,
        Ok(value) if value < 0.0 => NumericOutcome::Clamped(value),
        // -0 parses as negative zero, which would serialize back as "-0"
        Ok(value) if value == 0.0 => NumericOutcome::Clean(Some(0.0)),
        Ok(value) => NumericOutcome::Clean(Some(value)),
        Err(_) => NumericOutcome::Unparseable,
    }
}

/// Split on commas, trim each element and drop empty ones
pub fn clean_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the leading four characters parse as a year inside [`RELEASE_YEAR_RANGE`]
pub fn is_plausible_release_date(release_date: &str) -> bool {
    let prefix: String = release_date.chars().take(4).collect();
    match prefix.parse::<i32>() {
        Ok(year) => (RELEASE_YEAR_RANGE.0..=RELEASE_YEAR_RANGE.1).contains(&year),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Severity;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            9,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn blank_numbers_resolve_by_nullability() {
        assert_eq!(clean_numeric(FieldKind::NullableNumber, "  ").value(), None);
        assert_eq!(clean_numeric(FieldKind::Number, "").value(), Some(0.0));
    }

    #[test]
    fn thousands_separators_and_whitespace_are_stripped() {
        assert_eq!(
            clean_numeric(FieldKind::Number, " 1,234,567.5 "),
            NumericOutcome::Clean(Some(1_234_567.5))
        );
    }

    #[test]
    fn negative_values_clamp_and_garbage_resolves_to_zero() {
        assert_eq!(
            clean_numeric(FieldKind::NullableNumber, "-12"),
            NumericOutcome::Clamped(-12.0)
        );
        assert_eq!(clean_numeric(FieldKind::NullableNumber, "-12").value(), Some(0.0));
        assert_eq!(clean_numeric(FieldKind::Number, "n/a"), NumericOutcome::Unparseable);
        assert_eq!(clean_numeric(FieldKind::Number, "NaN"), NumericOutcome::Unparseable);
        assert_eq!(clean_numeric(FieldKind::Number, "inf").value(), Some(0.0));
    }

    #[test]
    fn negative_zero_cleans_to_positive_zero() {
        let value = clean_numeric(FieldKind::Number, "-0").value().unwrap();
        assert_eq!(value, 0.0);
        assert!(value.is_sign_positive());
        assert_eq!(value.to_string(), "0");
    }

    #[test]
    fn list_cleaning_trims_and_drops_empties() {
        assert_eq!(
            clean_list(" Tom Hanks , ,Meg Ryan,"),
            vec!["Tom Hanks".to_string(), "Meg Ryan".to_string()]
        );
        assert!(clean_list("").is_empty());
        assert!(clean_list(" , , ").is_empty());
    }

    #[test]
    fn negative_budget_is_coerced_and_logged_not_rejected() {
        let diagnostics = Diagnostics::new();
        let cleaned = FieldCleaner::new().clean(
            row(&[("title", "Heat"), ("budget", "-500"), ("release_date", "1995-12-15")]),
            &diagnostics,
        );

        assert_eq!(cleaned.value("budget"), Some(&CleanedValue::Number(Some(0.0))));
        let events = diagnostics.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].field.as_deref(), Some("budget"));
        assert_eq!(events[0].row, Some(9));
    }

    #[test]
    fn suspicious_values_are_flagged_without_changes() {
        let diagnostics = Diagnostics::new();
        let cleaned = FieldCleaner::new().clean(
            row(&[
                ("title", "Long One"),
                ("vote_average", "11.5"),
                ("runtime", "873"),
                ("release_date", "1066-10-14"),
            ]),
            &diagnostics,
        );

        assert_eq!(cleaned.value("vote_average"), Some(&CleanedValue::Number(Some(11.5))));
        assert_eq!(cleaned.value("runtime"), Some(&CleanedValue::Number(Some(873.0))));
        let flagged: Vec<_> = diagnostics
            .events()
            .into_iter()
            .filter_map(|event| event.field)
            .collect();
        assert_eq!(flagged, vec!["vote_average", "runtime", "release_date"]);
    }

    #[test]
    fn artifact_cleaner_normalizes_without_reporting() {
        let diagnostics = Diagnostics::new();
        let cleaned = FieldCleaner::for_artifacts().clean(
            row(&[
                ("title", "Long One"),
                ("vote_average", "11.5"),
                ("budget", "-500"),
            ]),
            &diagnostics,
        );

        assert_eq!(cleaned.value("budget"), Some(&CleanedValue::Number(Some(0.0))));
        assert_eq!(cleaned.value("vote_average"), Some(&CleanedValue::Number(Some(11.5))));
        assert!(diagnostics.events().is_empty());
    }

    #[test]
    fn absent_columns_stay_absent_and_text_is_untouched() {
        let diagnostics = Diagnostics::new();
        let cleaned = FieldCleaner::new().clean(
            row(&[("id", " 12 "), ("overview", "  quiet  ")]),
            &diagnostics,
        );
        assert_eq!(cleaned.value("id"), Some(&CleanedValue::Text(" 12 ".to_string())));
        assert_eq!(
            cleaned.value("overview"),
            Some(&CleanedValue::Text("  quiet  ".to_string()))
        );
        assert!(cleaned.value("budget").is_none());
        assert!(diagnostics.events().is_empty());
    }

    #[test]
    fn plausible_release_dates() {
        assert!(is_plausible_release_date("1880-01-01"));
        assert!(is_plausible_release_date("2025"));
        assert!(!is_plausible_release_date("2026-01-01"));
        assert!(!is_plausible_release_date("unknown"));
    }
}
