//! Error handling for shiori-updater.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`UpdaterError`]) so the replacement engine can
//!    decide per-variant whether a failure aborts the run or is recovered locally
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!    for the operator, since the tool is usually launched by double-click
//!
//! # Fatality
//!
//! Not every error terminates the run. The taxonomy is:
//!
//! | Variant | Handling |
//! |---------|----------|
//! | [`Network`] | fatal, aborts the run |
//! | [`Archive`] | fatal, aborts the run |
//! | [`FileSystem`] / [`Io`] | fatal, aborts the run |
//! | [`DirectoryUnreadable`] | recovered: subtree skipped, traversal continues |
//! | [`FileLocked`] | recovered: file skipped with an advisory, run continues |
//! | [`VersionRead`] | recovered: comparison skipped with a warning |
//!
//! The recoverable variants never bubble up to `main`; the directory scanner
//! and the replacement engine consume them at the point of failure. Anything
//! that does reach `main` is rendered through [`user_friendly_error`].
//!
//! [`Network`]: UpdaterError::Network
//! [`Archive`]: UpdaterError::Archive
//! [`FileSystem`]: UpdaterError::FileSystem
//! [`Io`]: UpdaterError::Io
//! [`DirectoryUnreadable`]: UpdaterError::DirectoryUnreadable
//! [`FileLocked`]: UpdaterError::FileLocked
//! [`VersionRead`]: UpdaterError::VersionRead

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for updater operations.
///
/// Each variant carries enough context (path, URL, reason) to produce a
/// message the operator can act on without reading logs.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// Downloading a release archive failed.
    ///
    /// Covers connection failures, timeouts, and non-success HTTP statuses.
    /// Always fatal: without the archive there is nothing to compare against.
    #[error("network error while fetching {url}: {reason}")]
    Network {
        /// The URL that was being fetched
        url: String,
        /// Description of the underlying failure
        reason: String,
    },

    /// A downloaded archive could not be opened or an entry could not be read.
    ///
    /// Always fatal: a partially extracted payload must never be used as a
    /// replacement source.
    #[error("archive error in {path}: {reason}")]
    Archive {
        /// Path of the offending archive
        path: String,
        /// Description of the underlying failure
        reason: String,
    },

    /// A filesystem operation outside the locked-file case failed.
    #[error("filesystem error: {operation} failed for {path}")]
    FileSystem {
        /// The operation that failed (e.g. "create directory", "read payload")
        operation: String,
        /// Path involved in the failed operation
        path: String,
    },

    /// A subtree could not be read during the directory scan.
    ///
    /// Recovered locally: the scanner records it, skips the subtree, and
    /// continues with siblings.
    #[error("cannot read directory {path}: {reason}")]
    DirectoryUnreadable {
        /// The unreadable directory
        path: String,
        /// Description of the underlying failure
        reason: String,
    },

    /// An installed file could not be overwritten because another process
    /// holds it open.
    ///
    /// Recovered locally: the engine skips the file and continues, emitting
    /// an advisory that names the host application when it is running.
    #[error("file is locked by another process: {path}")]
    FileLocked {
        /// The file that could not be replaced
        path: String,
    },

    /// Version metadata could not be extracted from a file.
    ///
    /// Recovered locally: the comparison is skipped with a warning.
    #[error("cannot read version metadata from {path}: {reason}")]
    VersionRead {
        /// The file whose version resource was unreadable
        path: String,
        /// Description of the underlying failure
        reason: String,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Semantic version parsing error (self-update path).
    #[error("version parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// Generic error with a message.
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl UpdaterError {
    /// True when the caller may recover from this error without aborting
    /// the run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnreadable { .. } | Self::FileLocked { .. } | Self::VersionRead { .. }
        )
    }
}

/// Error context wrapper that adds user-friendly information.
///
/// Wraps an [`UpdaterError`] with an optional suggestion and details. This is
/// how fatal errors are presented to the operator before the exit prompt.
///
/// # Display Format
///
/// 1. **Error**: the main message in red
/// 2. **Details**: extra context in yellow (optional)
/// 3. **Suggestion**: actionable next step in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying updater error
    pub error: UpdaterError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpdaterError) -> Self {
        Self { error, suggestion: None, details: None }
    }

    /// Add an actionable suggestion, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details, and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with suggestions.
///
/// Recognizes [`UpdaterError`] variants and common [`std::io::Error`] kinds
/// and attaches appropriate recovery hints; everything else is rendered with
/// its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(updater_error) = error.downcast_ref::<UpdaterError>() {
        return contextualize(updater_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(UpdaterError::FileSystem {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion(
                    "Check file ownership, or close the application using the file and re-run",
                )
                .with_details("The updater does not have permission to read or write a file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(UpdaterError::FileSystem {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the target directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error: include the full cause chain for diagnostics.
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UpdaterError::Other { message })
}

fn contextualize(error: &UpdaterError) -> ErrorContext {
    match error {
        UpdaterError::Network { url, reason } => ErrorContext::new(UpdaterError::Network {
            url: url.clone(),
            reason: reason.clone(),
        })
        .with_suggestion("Check your internet connection and proxy settings, then re-run")
        .with_details("The release archive could not be downloaded; nothing was modified"),
        UpdaterError::Archive { path, reason } => ErrorContext::new(UpdaterError::Archive {
            path: path.clone(),
            reason: reason.clone(),
        })
        .with_suggestion("Re-run to download a fresh copy of the archive")
        .with_details("The downloaded archive appears corrupt or truncated"),
        UpdaterError::FileSystem { operation, path } => {
            ErrorContext::new(UpdaterError::FileSystem {
                operation: operation.clone(),
                path: path.clone(),
            })
            .with_suggestion("Check free disk space and permissions on the target directory")
        }
        UpdaterError::FileLocked { path } => {
            ErrorContext::new(UpdaterError::FileLocked { path: path.clone() })
                .with_suggestion("Close the application holding the file open and re-run")
        }
        UpdaterError::VersionRead { path, reason } => {
            ErrorContext::new(UpdaterError::VersionRead {
                path: path.clone(),
                reason: reason.clone(),
            })
            .with_details("The file carries no readable version resource; it was not compared")
        }
        UpdaterError::DirectoryUnreadable { path, reason } => {
            ErrorContext::new(UpdaterError::DirectoryUnreadable {
                path: path.clone(),
                reason: reason.clone(),
            })
            .with_suggestion("Check permissions on the directory; its contents were skipped")
        }
        UpdaterError::Io(e) => ErrorContext::new(UpdaterError::Other {
            message: format!("IO error: {e}"),
        }),
        UpdaterError::Semver(e) => ErrorContext::new(UpdaterError::Other {
            message: format!("version parsing error: {e}"),
        })
        .with_details("The release feed returned a tag that is not a semantic version"),
        UpdaterError::Other { message } => {
            ErrorContext::new(UpdaterError::Other { message: message.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(UpdaterError::FileLocked { path: "yaya.dll".into() }.is_recoverable());
        assert!(
            UpdaterError::DirectoryUnreadable { path: "ghost".into(), reason: "denied".into() }
                .is_recoverable()
        );
        assert!(
            UpdaterError::VersionRead { path: "satori.dll".into(), reason: "no resource".into() }
                .is_recoverable()
        );
        assert!(
            !UpdaterError::Network { url: "https://example.com".into(), reason: "timeout".into() }
                .is_recoverable()
        );
        assert!(
            !UpdaterError::Archive { path: "satori.zip".into(), reason: "bad magic".into() }
                .is_recoverable()
        );
    }

    #[test]
    fn network_error_gets_connection_suggestion() {
        let err = anyhow::Error::from(UpdaterError::Network {
            url: "https://example.com/yaya.zip".into(),
            reason: "connection refused".into(),
        });
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.as_deref().unwrap_or("").contains("internet connection"));
    }

    #[test]
    fn generic_error_keeps_cause_chain() {
        use anyhow::Context;
        let err = Err::<(), _>(anyhow::anyhow!("payload truncated"))
            .context("reading plugin payload")
            .unwrap_err();
        let ctx = user_friendly_error(err);
        let rendered = ctx.to_string();
        assert!(rendered.contains("reading plugin payload"));
        assert!(rendered.contains("Caused by"));
    }
}
