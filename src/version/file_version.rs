//! Reading embedded file versions from PE binaries.
//!
//! SHIORI modules are Windows DLLs/EXEs carrying a `VERSIONINFO` resource.
//! The string table's `FileVersion` value is preferred because that is what
//! plugin authors actually bump; when a binary ships only the fixed-info
//! block, its file version is rendered and used instead. Either way the
//! string goes through [`normalize_version`] so both sides of a comparison
//! are reduced by the same rule.

use super::normalize_version;
use crate::core::UpdaterError;
use pelite::FileMap;
use pelite::PeFile;
use std::path::Path;
use tracing::trace;

fn version_read(path: &Path, reason: impl ToString) -> UpdaterError {
    UpdaterError::VersionRead {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read the embedded numeric file version of a PE binary.
///
/// # Errors
///
/// [`UpdaterError::VersionRead`] when the file is not a PE image, carries no
/// version resource, or its version string does not normalize to a number.
/// All of these are recoverable: the caller skips the file with a warning.
pub fn read_file_version(path: &Path) -> Result<i64, UpdaterError> {
    let map = FileMap::open(path).map_err(|e| version_read(path, e))?;
    let pe = PeFile::from_bytes(&map).map_err(|e| version_read(path, e))?;
    let resources = pe.resources().map_err(|e| version_read(path, e))?;
    let info = resources.version_info().map_err(|e| version_read(path, e))?;

    let raw = info
        .translation()
        .first()
        .and_then(|lang| info.value(*lang, "FileVersion"))
        .map(|value| value.trim_end_matches('\0').to_string())
        .or_else(|| info.fixed().map(|fixed| fixed.dwFileVersion.to_string()))
        .ok_or_else(|| version_read(path, "no FileVersion in version resource"))?;

    trace!(path = %path.display(), raw, "read version string");

    normalize_version(&raw).map_err(|reason| version_read(path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn non_pe_file_is_version_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notadll.txt");
        fs::write(&path, b"this is not a portable executable").unwrap();

        let err = read_file_version(&path).unwrap_err();
        assert!(matches!(err, UpdaterError::VersionRead { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn missing_file_is_version_read_error() {
        let dir = TempDir::new().unwrap();
        let err = read_file_version(&dir.path().join("ghost.dll")).unwrap_err();
        assert!(matches!(err, UpdaterError::VersionRead { .. }));
    }
}
