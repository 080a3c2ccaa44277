//! Zip archive extraction.
//!
//! Unpacks a downloaded release archive into a directory, preserving what the
//! format records per entry: Unix permission bits and the modification
//! timestamp. Timestamps matter downstream — the replacement engine copies the
//! extracted payload's times onto replaced files so an updated install looks
//! exactly like a fresh one.
//!
//! Extraction failures are fatal to the run; there is no partial-extraction
//! recovery.

use crate::core::UpdaterError;
use filetime::FileTime;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, warn};

/// Extract `archive` into `dest`, creating `dest` and its parents.
///
/// For each entry: directories are created (mode applied where the archive
/// stores one); files are written in full, their Unix mode applied, and their
/// mtime/atime set to the entry's recorded modification time when present.
/// Entries whose names would escape `dest` are skipped with a warning.
///
/// # Errors
///
/// [`UpdaterError::Archive`] if the archive cannot be opened or an entry
/// cannot be read; [`UpdaterError::Io`] on write failure.
pub fn extract(archive: &Path, dest: &Path) -> Result<(), UpdaterError> {
    let archive_error = |reason: &dyn std::fmt::Display| UpdaterError::Archive {
        path: archive.display().to_string(),
        reason: reason.to_string(),
    };

    let file = File::open(archive).map_err(|e| archive_error(&e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| archive_error(&e))?;

    fs::create_dir_all(dest)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| archive_error(&e))?;

        // enclosed_name rejects absolute paths and `..` components (zip-slip).
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            apply_unix_mode(&out_path, entry.unix_mode())?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out).map_err(|e| archive_error(&e))?;
        drop(out);

        apply_unix_mode(&out_path, entry.unix_mode())?;

        if let Some(mod_time) = entry.last_modified().and_then(zip_datetime_to_filetime) {
            filetime::set_file_times(&out_path, mod_time, mod_time)?;
        }

        debug!(path = %out_path.display(), "extracted");
    }

    Ok(())
}

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_unix_mode(_path: &Path, _mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

/// Convert a zip header timestamp to a [`FileTime`].
///
/// Zip timestamps are local wall-clock fields with no zone; they are treated
/// as UTC, which is what the reference hosts publish.
fn zip_datetime_to_filetime(dt: zip::DateTime) -> Option<FileTime> {
    let date = chrono::NaiveDate::from_ymd_opt(
        i32::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
    )?;
    let datetime = date.and_hms_opt(
        u32::from(dt.hour()),
        u32::from(dt.minute()),
        u32::from(dt.second()),
    )?;
    Some(FileTime::from_unix_time(datetime.and_utc().timestamp(), 0))
}
