//! Archive fetching.
//!
//! Downloads a release archive into the run's scratch directory, streaming
//! the response body into a temp file. Fetching sits behind the
//! [`ArtifactFetcher`] trait so the resolver can be exercised in tests with a
//! fetcher that serves canned archives and counts its invocations.
//!
//! There is no retry: a failed download aborts the run before anything on
//! disk has been touched.

use crate::core::UpdaterError;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Retrieves a release archive to a local path inside `scratch`.
pub trait ArtifactFetcher {
    /// Download `url` into a new file under `scratch` and return its path.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::Network`] on connection or HTTP failure,
    /// [`UpdaterError::FileSystem`] / [`UpdaterError::Io`] on local write
    /// failure. Both are fatal to the run.
    async fn fetch(&self, url: &str, scratch: &Path) -> Result<PathBuf, UpdaterError>;
}

/// HTTP fetcher backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    show_progress: bool,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self { client: reqwest::Client::new(), show_progress: true }
    }
}

impl HttpFetcher {
    /// Create a fetcher with a fresh client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the download progress bar (scripted runs, tests).
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn network_error(url: &str, reason: impl ToString) -> UpdaterError {
        UpdaterError::Network { url: url.to_string(), reason: reason.to_string() }
    }
}

impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, scratch: &Path) -> Result<PathBuf, UpdaterError> {
        debug!(url, "starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::network_error(url, e))?
            .error_for_status()
            .map_err(|e| Self::network_error(url, e))?;

        let bar = if self.show_progress {
            let bar = match response.content_length() {
                Some(len) => {
                    let bar = ProgressBar::new(len);
                    bar.set_style(
                        ProgressStyle::with_template(
                            "{bar:30.cyan/blue} {bytes}/{total_bytes} {bytes_per_sec}",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                    );
                    bar
                }
                None => ProgressBar::new_spinner(),
            };
            Some(bar)
        } else {
            None
        };

        let temp = tempfile::Builder::new()
            .prefix("shiori-updater")
            .tempfile_in(scratch)
            .map_err(|e| UpdaterError::FileSystem {
                operation: format!("create temp file ({e})"),
                path: scratch.display().to_string(),
            })?;
        let (mut file, temp_path) = temp.keep().map_err(|e| UpdaterError::FileSystem {
            operation: format!("persist temp file ({e})"),
            path: scratch.display().to_string(),
        })?;

        let mut response = response;
        let mut written: u64 = 0;
        while let Some(chunk) =
            response.chunk().await.map_err(|e| Self::network_error(url, e))?
        {
            file.write_all(&chunk)?;
            written += chunk.len() as u64;
            if let Some(bar) = &bar {
                bar.set_position(written);
            }
        }
        file.flush()?;

        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        debug!(url, bytes = written, path = %temp_path.display(), "download complete");
        Ok(temp_path)
    }
}
