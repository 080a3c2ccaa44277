//! Version comparison strategies.
//!
//! Deciding whether an installed plugin is older than a fetched candidate is
//! the one place this tool has ever changed its mind, so the decision lives
//! behind a single trait with two implementations:
//!
//! - [`FileVersionStrategy`] (the default): reads the numeric file version
//!   embedded in the PE `VERSIONINFO` resource of both binaries and replaces
//!   only when the installed number is strictly lower.
//! - [`ModTimeStrategy`] (legacy): compares rendered modification timestamps
//!   for *equality*. Any difference — including a locally newer file — counts
//!   as outdated. Kept only for compatibility runs against hosts that strip
//!   version resources; never the default.
//!
//! An unreadable version resource yields [`UpdaterError::VersionRead`], which
//! the engine recovers from by skipping that file with a warning.

pub mod file_version;

pub use file_version::read_file_version;

use crate::core::UpdaterError;
use std::path::Path;

/// Outcome of comparing an installed file against a fetched candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonResult {
    /// The installed file is current; leave it alone.
    UpToDate,
    /// The installed file is older than the candidate; replace it.
    Outdated,
}

/// A pluggable rule for deciding whether `installed` should be replaced by
/// `candidate`.
pub trait CompareStrategy {
    /// Compare the two files.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::VersionRead`] when the inputs carry no usable version
    /// information; recoverable by the caller.
    fn compare(&self, installed: &Path, candidate: &Path)
    -> Result<ComparisonResult, UpdaterError>;
}

/// Numeric file-version comparison (preferred).
///
/// Reads the dotted `FileVersion` from each binary's `VERSIONINFO` resource,
/// normalizes it to an integer (see [`normalize_version`]), and reports
/// [`ComparisonResult::Outdated`] iff the installed number is strictly less
/// than the candidate's. Equal and locally-newer installs are both up to
/// date, so a completed replacement can never trigger again on the next run.
#[derive(Debug, Default)]
pub struct FileVersionStrategy;

impl CompareStrategy for FileVersionStrategy {
    fn compare(
        &self,
        installed: &Path,
        candidate: &Path,
    ) -> Result<ComparisonResult, UpdaterError> {
        let current = read_file_version(installed)?;
        let latest = read_file_version(candidate)?;
        Ok(compare_numeric(current, latest))
    }
}

/// Core numeric rule shared by [`FileVersionStrategy`] and its tests.
#[must_use]
pub const fn compare_numeric(installed: i64, candidate: i64) -> ComparisonResult {
    if installed < candidate {
        ComparisonResult::Outdated
    } else {
        ComparisonResult::UpToDate
    }
}

/// Collapse a dotted or comma-separated version string to an integer.
///
/// Spaces, commas, and dots are deleted and the remaining digits parsed:
/// `"1, 0, 0, 1"` → `1001`, `"1.0.0.0"` → `1000`. Field widths are not
/// positional — this matches the historical behavior the installed base was
/// compared under, and both sides of every comparison go through the same
/// normalization.
///
/// # Errors
///
/// [`UpdaterError::VersionRead`]-shaped `Other` is *not* used here; the
/// caller wraps failures with the file path. This function reports a plain
/// message when non-numeric characters remain after normalization.
pub fn normalize_version(raw: &str) -> Result<i64, String> {
    let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | ',' | '.')).collect();
    digits
        .parse::<i64>()
        .map_err(|_| format!("not a numeric version string: {raw:?}"))
}

/// Legacy timestamp-equality comparison (superseded).
///
/// Renders both modification times to RFC 2822 text and reports
/// [`ComparisonResult::Outdated`] iff the strings differ. This conflates
/// "different" with "older": a locally newer file gets replaced too. Retained
/// as an explicit opt-in, documented defect and all, so the asymmetry lives
/// in one place instead of being re-invented at call sites.
#[derive(Debug, Default)]
pub struct ModTimeStrategy;

impl ModTimeStrategy {
    fn rendered_mtime(path: &Path) -> Result<String, UpdaterError> {
        let meta = std::fs::metadata(path)?;
        let mtime = meta.modified()?;
        let rendered: chrono::DateTime<chrono::Utc> = mtime.into();
        Ok(rendered.to_rfc2822())
    }
}

impl CompareStrategy for ModTimeStrategy {
    fn compare(
        &self,
        installed: &Path,
        candidate: &Path,
    ) -> Result<ComparisonResult, UpdaterError> {
        let current = Self::rendered_mtime(installed)?;
        let latest = Self::rendered_mtime(candidate)?;
        if current == latest {
            Ok(ComparisonResult::UpToDate)
        } else {
            Ok(ComparisonResult::Outdated)
        }
    }
}
