//! Dataset archive download and extraction.

use crate::error::{LoaderError, LoaderResult};
use crate::logging::{Diagnostics, LogFeature};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Name of the downloaded archive inside the output directory
pub const ARCHIVE_FILE_NAME: &str = "archive.zip";

const PROGRESS_BYTES: u64 = 64 * 1024 * 1024;

/// The dataset archive in one output directory
pub struct DatasetArchive<'d> {
    output_dir: PathBuf,
    diagnostics: &'d Diagnostics,
}

impl<'d> DatasetArchive<'d> {
    pub fn new(output_dir: &Path, diagnostics: &'d Diagnostics) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            diagnostics,
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(ARCHIVE_FILE_NAME)
    }

    /// Fetch `url` into `archive.zip`, streaming the body to disk
    pub async fn download(&self, url: &str) -> LoaderResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                LoaderError::transient_io(format!("creating {}", self.output_dir.display()), e)
            })?;

        self.diagnostics
            .info(LogFeature::Archive, format!("Downloading {}", url));
        let mut response = reqwest::get(url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| LoaderError::transient_io(format!("downloading {}", url), e))?;

        let path = self.archive_path();
        let partial = self.partial_path();
        let written = match self.stream_to(&mut response, url, &partial).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    log::debug!(
                        target: "moviegraph::archive",
                        "Could not remove {}: {}",
                        partial.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| LoaderError::transient_io(format!("renaming {}", partial.display()), e))?;

        self.diagnostics.info(
            LogFeature::Archive,
            format!("Saved {} ({} bytes)", path.display(), written),
        );
        Ok(path)
    }

    /// Where the body is written until the transfer completes
    fn partial_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.part", ARCHIVE_FILE_NAME))
    }

    async fn stream_to(
        &self,
        response: &mut reqwest::Response,
        url: &str,
        path: &Path,
    ) -> LoaderResult<u64> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| LoaderError::transient_io(format!("creating {}", path.display()), e))?;

        let mut written: u64 = 0;
        let mut next_report = PROGRESS_BYTES;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LoaderError::transient_io(format!("downloading {}", url), e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| LoaderError::transient_io(format!("writing {}", path.display()), e))?;
            written += chunk.len() as u64;
            if written >= next_report {
                self.diagnostics.info(
                    LogFeature::Archive,
                    format!("Downloaded {} MiB", written / (1024 * 1024)),
                );
                next_report += PROGRESS_BYTES;
            }
        }
        file.flush()
            .await
            .map_err(|e| LoaderError::transient_io(format!("writing {}", path.display()), e))?;
        Ok(written)
    }

    /// Unpack `archive.zip` into the output directory, then delete the archive.
    ///
    /// Returns the names of the extracted entries.
    pub fn extract(&self) -> LoaderResult<Vec<String>> {
        let path = self.archive_path();
        if !path.is_file() {
            return Err(LoaderError::configuration(format!(
                "Archive {} not found; run download first",
                path.display()
            )));
        }

        let context = || format!("extracting {}", path.display());
        let file = File::open(&path).map_err(|e| LoaderError::transient_io(context(), e))?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| LoaderError::transient_io(context(), e))?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        archive
            .extract(&self.output_dir)
            .map_err(|e| LoaderError::transient_io(context(), e))?;
        drop(archive);

        fs::remove_file(&path)
            .map_err(|e| LoaderError::transient_io(format!("removing {}", path.display()), e))?;
        self.diagnostics.info(
            LogFeature::Archive,
            format!(
                "Extracted {} entries into {}",
                names.len(),
                self.output_dir.display()
            ),
        );
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extract_unpacks_and_removes_archive() {
        let dir = tempdir().unwrap();
        let diagnostics = Diagnostics::new();
        let archive = DatasetArchive::new(dir.path(), &diagnostics);
        write_zip(
            &archive.archive_path(),
            &[("TMDB_all_movies.csv", "id,title\n1,Heat\n")],
        );

        let names = archive.extract().unwrap();
        assert_eq!(names, vec!["TMDB_all_movies.csv"]);
        assert!(!archive.archive_path().exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("TMDB_all_movies.csv")).unwrap(),
            "id,title\n1,Heat\n"
        );
    }

    #[test]
    fn extract_without_archive_is_a_configuration_failure() {
        let dir = tempdir().unwrap();
        let diagnostics = Diagnostics::new();
        let result = DatasetArchive::new(dir.path(), &diagnostics).extract();
        assert!(matches!(result, Err(LoaderError::Configuration(_))));
    }

    #[test]
    fn corrupt_archive_is_an_io_failure_and_is_kept() {
        let dir = tempdir().unwrap();
        let diagnostics = Diagnostics::new();
        let archive = DatasetArchive::new(dir.path(), &diagnostics);
        fs::write(archive.archive_path(), b"not a zip").unwrap();

        assert!(matches!(
            archive.extract(),
            Err(LoaderError::TransientIo { .. })
        ));
        assert!(archive.archive_path().exists());
    }

    #[tokio::test]
    async fn interrupted_download_leaves_no_archive() {
        use tokio::io::AsyncWriteExt as _;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4096\r\n\r\nPK\x03\x04partial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let dir = tempdir().unwrap();
        let diagnostics = Diagnostics::new();
        let archive = DatasetArchive::new(dir.path(), &diagnostics);
        let result = archive
            .download(&format!("http://{}/archive.zip", addr))
            .await;
        server.await.unwrap();

        assert!(matches!(result, Err(LoaderError::TransientIo { .. })));
        assert!(!archive.archive_path().exists());
        assert!(!archive.partial_path().exists());
        assert!(matches!(
            archive.extract(),
            Err(LoaderError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_url_is_an_io_failure() {
        let dir = tempdir().unwrap();
        let diagnostics = Diagnostics::new();
        let result = DatasetArchive::new(dir.path(), &diagnostics)
            .download("http://127.0.0.1:9/archive.zip")
            .await;
        assert!(matches!(result, Err(LoaderError::TransientIo { .. })));
    }
}
