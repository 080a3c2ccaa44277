//! Recursive directory scanning with graceful degradation.
//!
//! Ghost directories accumulate odd permissions over years of installs, so an
//! unreadable subtree must never kill the whole run. The scanner is a pure
//! function returning both the files it found and the errors it swallowed;
//! the caller decides what, if anything, is fatal.

use crate::core::UpdaterError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Result of a directory scan: everything reachable plus everything that
/// was not.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// All regular files found, in deterministic (name-sorted) order.
    pub files: Vec<PathBuf>,
    /// Non-fatal errors encountered; the subtrees behind them were skipped.
    pub errors: Vec<UpdaterError>,
}

impl ScanOutcome {
    /// Report the swallowed errors to the operator.
    ///
    /// One line per skipped subtree. Called by the engine and the resolver so
    /// the narration happens exactly once per scan.
    pub fn report_errors(&self) {
        for error in &self.errors {
            eprintln!("warning: {error} (subtree skipped)");
        }
    }
}

/// Recursively list all regular files under `root`.
///
/// Unreadable directories are recorded in [`ScanOutcome::errors`] and their
/// subtrees skipped; siblings are still visited. The traversal itself never
/// fails — a nonexistent `root` simply yields one error and no files.
#[must_use]
pub fn scan(root: &Path) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                outcome.files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(error) => {
                let path = error
                    .path()
                    .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                outcome.errors.push(UpdaterError::DirectoryUnreadable {
                    path: path.display().to_string(),
                    reason: error
                        .io_error()
                        .map_or_else(|| error.to_string(), ToString::to_string),
                });
            }
        }
    }

    debug!(
        root = %root.display(),
        files = outcome.files.len(),
        skipped = outcome.errors.len(),
        "scan complete"
    );
    outcome
}
