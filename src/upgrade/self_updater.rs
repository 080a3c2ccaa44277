//! Core self-update logic against GitHub releases.

use crate::config::SELF_UPDATE_REPO;
use crate::core::UpdaterError;
use self_update::backends::github::{ReleaseList, Update};
use self_update::cargo_crate_version;
use tracing::{debug, info};

/// What the self-update pass concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdateOutcome {
    /// Running binary matches the published release; continue normally.
    UpToDate,
    /// The executable was replaced; the operator must relaunch.
    Updated {
        /// Version that was running.
        from: String,
        /// Version now on disk.
        to: String,
    },
}

/// Self-update manager for the updater binary.
///
/// The published release is compared for semver *equality* against the
/// running version: any difference, including an older "latest", counts as
/// an update. Release feeds for this tool only ever move forward, and the
/// equality rule also makes a yanked-and-republished release take effect.
pub struct SelfUpdater {
    repo_owner: String,
    repo_name: String,
    bin_name: String,
    current_version: String,
}

impl Default for SelfUpdater {
    fn default() -> Self {
        let (owner, name) = SELF_UPDATE_REPO;
        Self {
            repo_owner: owner.to_string(),
            repo_name: name.to_string(),
            bin_name: "shiori-updater".to_string(),
            current_version: cargo_crate_version!().to_string(),
        }
    }
}

impl SelfUpdater {
    /// Create a self-updater for the official repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the running binary, from build time.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Check the feed and return the published version when it differs from
    /// the running one.
    ///
    /// # Errors
    ///
    /// Network failures from the GitHub API, or unparsable version tags.
    pub fn check_for_update(&self) -> Result<Option<String>, UpdaterError> {
        debug!("checking release feed {}/{}", self.repo_owner, self.repo_name);

        let list = ReleaseList::configure()
            .repo_owner(&self.repo_owner)
            .repo_name(&self.repo_name)
            .build()
            .map_err(|e| self.feed_error(e))?;
        let releases = list.fetch().map_err(|e| self.feed_error(e))?;

        let Some(latest) = releases.first() else {
            debug!("no releases published");
            return Ok(None);
        };

        let current = semver::Version::parse(&self.current_version)?;
        let published = semver::Version::parse(&latest.version)?;

        if needs_update(&current, &published) {
            info!("published version differs: {current} -> {published}");
            Ok(Some(latest.version.clone()))
        } else {
            debug!("running the published version {current}");
            Ok(None)
        }
    }

    /// Replace the running executable with the given published version.
    ///
    /// # Errors
    ///
    /// Download or binary-replacement failures.
    pub fn apply(&self, version: &str) -> Result<(), UpdaterError> {
        let update = Update::configure()
            .repo_owner(&self.repo_owner)
            .repo_name(&self.repo_name)
            .bin_name(&self.bin_name)
            .show_download_progress(true)
            // The equality rule means we may install a version the library's
            // own greater-than check would refuse; claiming an ancient
            // current version forces the install either way.
            .current_version("0.0.0")
            .target_version_tag(&format!("v{}", version.trim_start_matches('v')))
            .build()
            .map_err(|e| self.feed_error(e))?;
        let status = update.update().map_err(|e| self.feed_error(e))?;

        info!("self-update installed {}", status.version());
        Ok(())
    }

    fn feed_error(&self, error: self_update::errors::Error) -> UpdaterError {
        UpdaterError::Network {
            url: format!("github.com/{}/{}", self.repo_owner, self.repo_name),
            reason: error.to_string(),
        }
    }

    /// Full pass: check, and if the feed differs, replace the executable.
    ///
    /// # Errors
    ///
    /// Propagates check and apply failures; the caller treats them as
    /// non-fatal to the plugin-update flow.
    pub fn run(&self) -> Result<SelfUpdateOutcome, UpdaterError> {
        match self.check_for_update()? {
            None => Ok(SelfUpdateOutcome::UpToDate),
            Some(version) => {
                self.apply(&version)?;
                Ok(SelfUpdateOutcome::Updated {
                    from: self.current_version.clone(),
                    to: version,
                })
            }
        }
    }
}

/// Whether the published release should replace the running binary.
///
/// Equality is the rule: any difference, including an older published
/// version, counts as an update. Release feeds for this tool only move
/// forward, and the rule makes a yanked-and-republished release take
/// effect.
#[must_use]
pub fn needs_update(current: &semver::Version, published: &semver::Version) -> bool {
    published != current
}
