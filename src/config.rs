//! Static plugin configuration.
//!
//! The set of known SHIORI plugins is a fixed, ordered list baked into the
//! binary: there is no manifest file and no persisted configuration. The list
//! is an immutable value passed explicitly into the release resolver and the
//! replacement engine rather than process-wide state, so tests can run with
//! their own plugin sets.
//!
//! # Matching rule
//!
//! A plugin matches an on-disk file when the file's *name* ends with the
//! plugin name ([`PluginSpec::matches`]). The same rule is used when locating
//! the payload inside an extracted archive and when scanning the target tree,
//! so a file can never be updated under one rule and skipped under another.

use std::path::Path;

/// Executable name of the host mascot application.
///
/// Used only to produce a friendlier advisory when a plugin file is locked:
/// SSP keeps loaded SHIORI modules open while a ghost is running.
pub const HOST_PROCESS: &str = "ssp.exe";

/// GitHub repository the tool self-updates from, as `owner/name`.
pub const SELF_UPDATE_REPO: (&str, &str) = ("apxxxxxxe", "shioriupdater");

/// A known plugin: the filename it ships under and the release archive that
/// carries its latest build.
///
/// Multiple plugins may point at the same archive URL; the resolver downloads
/// each unique URL once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    /// Filename of the plugin binary, e.g. `yaya.dll`. Matched as a
    /// filename suffix against candidate paths.
    pub name: String,
    /// URL of the release archive containing the latest build.
    pub source_url: String,
}

impl PluginSpec {
    /// Create a plugin spec from a name and source URL.
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self { name: name.into(), source_url: source_url.into() }
    }

    /// Whether `path` names this plugin.
    ///
    /// Suffix match on the file name only: `ghost/master/yaya.dll` and
    /// `emily4-yaya.dll` both match `yaya.dll`, but a directory named
    /// `yaya.dll.backup/` or a file `yaya.dll.txt` does not.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().ends_with(&self.name))
            .unwrap_or(false)
    }
}

/// The built-in plugin list, in evaluation order.
///
/// `satori.dll`, `ssu.dll`, and `satorite.exe` all ship in the satoriya
/// archive; the resolver's URL deduplication keeps that to a single download.
#[must_use]
pub fn default_plugins() -> Vec<PluginSpec> {
    vec![
        PluginSpec::new(
            "yaya.dll",
            "https://github.com/ponapalt/yaya-shiori/releases/latest/download/yaya.zip",
        ),
        PluginSpec::new(
            "satori.dll",
            "https://github.com/ponapalt/satoriya-shiori/releases/latest/download/satori.zip",
        ),
        PluginSpec::new(
            "ssu.dll",
            "https://github.com/ponapalt/satoriya-shiori/releases/latest/download/satori.zip",
        ),
        PluginSpec::new(
            "satorite.exe",
            "https://github.com/ponapalt/satoriya-shiori/releases/latest/download/satori.zip",
        ),
    ]
}
