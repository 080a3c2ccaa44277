//! The replacement engine.
//!
//! Walks the target tree, matches installed files against the plugin list,
//! asks the comparison strategy whether each match is outdated, and performs
//! the safe overwrite: bytes first, then the installed file's permission bits
//! re-applied, then the fetched payload's timestamps copied on. Each file
//! moves through `Matched → {UpToDate, Outdated} → {Skipped, Replaced,
//! ReplaceFailed}`; only an unexpected write failure stops the run.
//!
//! Two failure classes are recovered per file instead of aborting:
//! - a locked target (the host application keeps loaded SHIORI modules open)
//!   gets an advisory naming the host when it is running, then is skipped
//! - unreadable version metadata gets a warning, then is skipped

use crate::config::{HOST_PROCESS, PluginSpec};
use crate::core::UpdaterError;
use crate::process::ProcessProbe;
use crate::scan;
use crate::version::{CompareStrategy, ComparisonResult};
use colored::Colorize;
use filetime::FileTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// A plugin payload staged in the scratch directory, ready to be copied over
/// outdated installs.
#[derive(Debug)]
pub struct FetchedArtifact {
    /// Plugin filename this artifact replaces.
    pub plugin_name: String,
    /// Extracted payload path in the scratch directory.
    pub local_path: PathBuf,
    /// Modification time recorded by the archive; copied onto replaced files.
    pub mod_time: SystemTime,
    /// Full payload content.
    pub bytes: Vec<u8>,
}

/// Load the artifacts for every plugin out of the resolver's map.
///
/// # Errors
///
/// A plugin missing from `resolved` is fatal here: the run promised to check
/// that plugin and has nothing to check it against. Read failures on the
/// extracted payload are fatal for the same reason.
pub fn load_artifacts(
    plugins: &[PluginSpec],
    resolved: &HashMap<String, PathBuf>,
) -> Result<HashMap<String, FetchedArtifact>, UpdaterError> {
    let mut artifacts = HashMap::new();

    for plugin in plugins {
        let path = resolved.get(&plugin.name).ok_or_else(|| UpdaterError::FileSystem {
            operation: "locate extracted payload".to_string(),
            path: plugin.name.clone(),
        })?;

        let meta = fs::metadata(path)?;
        let bytes = fs::read(path)?;

        artifacts.insert(
            plugin.name.clone(),
            FetchedArtifact {
                plugin_name: plugin.name.clone(),
                local_path: path.clone(),
                mod_time: meta.modified()?,
                bytes,
            },
        );
    }

    Ok(artifacts)
}

/// Tally of a full engine pass over the target tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Files overwritten with a newer payload.
    pub replaced: usize,
    /// Matched files already current.
    pub up_to_date: usize,
    /// Matched files skipped because another process held them open.
    pub locked: usize,
    /// Matched files skipped because version metadata was unreadable.
    pub unreadable: usize,
}

impl UpdateReport {
    /// Narrate the outcome to the operator.
    pub fn narrate(&self) {
        if self.replaced == 0 {
            println!("{}", "no update targets found".yellow());
        } else {
            println!("{} {} file(s) updated", "done:".green().bold(), self.replaced);
        }
        if self.locked > 0 {
            println!("{} file(s) were locked and skipped; re-run after closing the application", self.locked);
        }
    }
}

/// Run the engine over every file under `target`.
///
/// Scan errors are reported and skipped (the scanner already degraded
/// gracefully); every surviving file is checked against every plugin spec in
/// order, so a path matching two names is evaluated under both.
///
/// # Errors
///
/// Only unexpected write failures; locked files and unreadable version
/// resources are counted in the report instead.
pub fn run(
    target: &Path,
    plugins: &[PluginSpec],
    artifacts: &HashMap<String, FetchedArtifact>,
    strategy: &dyn CompareStrategy,
    probe: &dyn ProcessProbe,
) -> Result<UpdateReport, UpdaterError> {
    let mut report = UpdateReport::default();

    let outcome = scan::scan(target);
    outcome.report_errors();

    for file in &outcome.files {
        for plugin in plugins {
            if !plugin.matches(file) {
                continue;
            }
            let Some(artifact) = artifacts.get(&plugin.name) else {
                continue;
            };

            match strategy.compare(file, &artifact.local_path) {
                Ok(ComparisonResult::UpToDate) => {
                    println!("{} {}", "current:".dimmed(), file.display());
                    report.up_to_date += 1;
                }
                Ok(ComparisonResult::Outdated) => match replace_file(file, artifact) {
                    Ok(()) => {
                        println!("{} {}", "updated:".green(), file.display());
                        report.replaced += 1;
                    }
                    Err(error @ UpdaterError::FileLocked { .. }) => {
                        warn!("{error}");
                        advise_locked(file, probe);
                        report.locked += 1;
                    }
                    Err(error) => return Err(error),
                },
                Err(error @ UpdaterError::VersionRead { .. }) => {
                    warn!("{error}");
                    println!("{} {} (no readable version, skipped)", "warning:".yellow(), file.display());
                    report.unreadable += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    Ok(report)
}

/// Overwrite `installed` with the artifact's bytes, keeping the installed
/// file's permission bits and taking on the artifact's timestamps.
///
/// # Errors
///
/// [`UpdaterError::FileLocked`] when the write fails with a sharing
/// violation; any other write failure as-is.
fn replace_file(installed: &Path, artifact: &FetchedArtifact) -> Result<(), UpdaterError> {
    let permissions = fs::metadata(installed)?.permissions();

    if let Err(error) = fs::write(installed, &artifact.bytes) {
        if is_locked_error(&error) {
            debug!(path = %installed.display(), %error, "write blocked, treating as locked");
            return Err(UpdaterError::FileLocked { path: installed.display().to_string() });
        }
        return Err(error.into());
    }

    fs::set_permissions(installed, permissions)?;

    let times = FileTime::from_system_time(artifact.mod_time);
    filetime::set_file_times(installed, times, times)?;

    debug!(
        path = %installed.display(),
        plugin = %artifact.plugin_name,
        "replaced"
    );
    Ok(())
}

/// A write refusal that means "someone has this file open", not "the disk is
/// broken". Windows reports sharing violations as raw os errors 32/33.
fn is_locked_error(error: &std::io::Error) -> bool {
    error.kind() == std::io::ErrorKind::PermissionDenied
        || matches!(error.raw_os_error(), Some(32 | 33))
}

fn advise_locked(file: &Path, probe: &dyn ProcessProbe) {
    if probe.is_running(HOST_PROCESS) {
        println!(
            "{} cannot write {}; SSP appears to be running. Close it and re-run. Skipped.",
            "error:".red(),
            file.display()
        );
    } else {
        println!(
            "{} cannot write {}; close the application using it and re-run. Skipped.",
            "error:".red(),
            file.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginSpec;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Compares by file content length: longer content is newer. Lets the
    /// engine be exercised without real PE version resources.
    struct LengthStrategy;

    impl CompareStrategy for LengthStrategy {
        fn compare(
            &self,
            installed: &Path,
            candidate: &Path,
        ) -> Result<ComparisonResult, UpdaterError> {
            let installed_len = fs::read(installed)?.len();
            let candidate_len = fs::read(candidate)?.len();
            Ok(crate::version::compare_numeric(installed_len as i64, candidate_len as i64))
        }
    }

    struct IdleProbe;
    impl ProcessProbe for IdleProbe {
        fn is_running(&self, _name: &str) -> bool {
            false
        }
    }

    fn stage_artifact(dir: &Path, name: &str, bytes: &[u8]) -> FetchedArtifact {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        FetchedArtifact {
            plugin_name: name.to_string(),
            local_path: path,
            mod_time: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            bytes: bytes.to_vec(),
        }
    }

    fn plugin(name: &str) -> PluginSpec {
        PluginSpec::new(name, "https://example.com/archive.zip")
    }

    #[test]
    fn replaces_only_outdated_matches() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();

        fs::create_dir(target.path().join("plugin")).unwrap();
        fs::create_dir(target.path().join("other")).unwrap();
        fs::write(target.path().join("plugin/yaya.dll"), b"old").unwrap();
        fs::write(target.path().join("other/notadll.txt"), b"text file").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"newer-and-longer"),
        );

        let report =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();

        assert_eq!(report.replaced, 1);
        assert_eq!(
            fs::read(target.path().join("plugin/yaya.dll")).unwrap(),
            b"newer-and-longer"
        );
        assert_eq!(
            fs::read(target.path().join("other/notadll.txt")).unwrap(),
            b"text file"
        );
    }

    #[test]
    fn replacement_copies_artifact_timestamps() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("yaya.dll"), b"old").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"much longer payload"),
        );

        run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();

        let meta = fs::metadata(target.path().join("yaya.dll")).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert_eq!(mtime.unix_seconds(), 1_700_000_000);
    }

    #[test]
    fn up_to_date_files_are_left_alone() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("yaya.dll"), b"already-the-long-one").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"short"),
        );

        let report =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();

        assert_eq!(report.replaced, 0);
        assert_eq!(report.up_to_date, 1);
        assert_eq!(
            fs::read(target.path().join("yaya.dll")).unwrap(),
            b"already-the-long-one"
        );
    }

    #[test]
    fn replacement_is_idempotent() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("yaya.dll"), b"old").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"the new payload"),
        );

        let first =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();
        assert_eq!(first.replaced, 1);

        let second =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();
        assert_eq!(second.replaced, 0);
        assert_eq!(second.up_to_date, 1);
    }

    #[test]
    fn empty_target_reports_nothing_found() {
        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("readme.txt"), b"no plugins here").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"payload"),
        );

        let report =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();
        assert_eq!(report, UpdateReport::default());
    }

    #[test]
    fn unreadable_version_is_skipped_not_fatal() {
        struct AlwaysUnreadable;
        impl CompareStrategy for AlwaysUnreadable {
            fn compare(
                &self,
                installed: &Path,
                _candidate: &Path,
            ) -> Result<ComparisonResult, UpdaterError> {
                Err(UpdaterError::VersionRead {
                    path: installed.display().to_string(),
                    reason: "no version resource".to_string(),
                })
            }
        }

        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("yaya.dll"), b"old").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"payload"),
        );

        let report =
            run(target.path(), &plugins, &artifacts, &AlwaysUnreadable, &IdleProbe).unwrap();
        assert_eq!(report.unreadable, 1);
        assert_eq!(report.replaced, 0);
        assert_eq!(fs::read(target.path().join("yaya.dll")).unwrap(), b"old");
    }

    #[test]
    fn locked_error_classification() {
        use std::io::{Error, ErrorKind};
        assert!(is_locked_error(&Error::from(ErrorKind::PermissionDenied)));
        assert!(is_locked_error(&Error::from_raw_os_error(32)));
        assert!(is_locked_error(&Error::from_raw_os_error(33)));
        assert!(!is_locked_error(&Error::from(ErrorKind::NotFound)));
    }

    #[cfg(unix)]
    #[test]
    fn blocked_write_surfaces_as_recoverable_file_locked() {
        use std::os::unix::fs::PermissionsExt;

        // Write denial does not apply to root.
        let euid = std::process::Command::new("id").arg("-u").output().unwrap();
        if String::from_utf8_lossy(&euid.stdout).trim() == "0" {
            return;
        }

        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let installed = target.path().join("yaya.dll");
        fs::write(&installed, b"old").unwrap();
        fs::set_permissions(&installed, fs::Permissions::from_mode(0o444)).unwrap();

        let artifact = stage_artifact(scratch.path(), "yaya.dll", b"new payload");
        let err = replace_file(&installed, &artifact).unwrap_err();

        assert!(matches!(err, UpdaterError::FileLocked { .. }));
        assert!(err.is_recoverable());
        assert_eq!(fs::read(&installed).unwrap(), b"old");
    }

    #[cfg(unix)]
    #[test]
    fn locked_file_is_skipped_and_run_continues() {
        use std::os::unix::fs::PermissionsExt;

        // Write denial does not apply to root.
        let euid = std::process::Command::new("id").arg("-u").output().unwrap();
        if String::from_utf8_lossy(&euid.stdout).trim() == "0" {
            return;
        }

        let scratch = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("satori.dll"), b"old").unwrap();
        fs::write(target.path().join("yaya.dll"), b"old").unwrap();
        fs::set_permissions(
            target.path().join("satori.dll"),
            fs::Permissions::from_mode(0o444),
        )
        .unwrap();

        let plugins = vec![plugin("satori.dll"), plugin("yaya.dll")];
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "satori.dll".to_string(),
            stage_artifact(scratch.path(), "satori.dll", b"longer payload"),
        );
        artifacts.insert(
            "yaya.dll".to_string(),
            stage_artifact(scratch.path(), "yaya.dll", b"longer payload"),
        );

        let report =
            run(target.path(), &plugins, &artifacts, &LengthStrategy, &IdleProbe).unwrap();

        // satori.dll was locked; yaya.dll was still replaced.
        assert_eq!(report.locked, 1);
        assert_eq!(report.replaced, 1);
        assert_eq!(
            fs::read(target.path().join("yaya.dll")).unwrap(),
            b"longer payload"
        );
    }

    #[test]
    fn load_artifacts_fails_on_missing_plugin() {
        let plugins = vec![plugin("yaya.dll")];
        let resolved = HashMap::new();
        let err = load_artifacts(&plugins, &resolved).unwrap_err();
        assert!(matches!(err, UpdaterError::FileSystem { .. }));
    }

    #[test]
    fn load_artifacts_reads_bytes_and_mtime() {
        let scratch = TempDir::new().unwrap();
        let payload = scratch.path().join("yaya.dll");
        fs::write(&payload, b"payload-bytes").unwrap();

        let plugins = vec![plugin("yaya.dll")];
        let mut resolved = HashMap::new();
        resolved.insert("yaya.dll".to_string(), payload);

        let artifacts = load_artifacts(&plugins, &resolved).unwrap();
        assert_eq!(artifacts["yaya.dll"].bytes, b"payload-bytes");
    }
}
