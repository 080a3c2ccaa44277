//! Release resolution: from plugin specs to extracted payloads.
//!
//! For each known plugin the resolver materializes the latest released build
//! in the scratch directory, downloading and extracting each unique archive
//! URL exactly once per run — the satoriya archive carries three of the four
//! default plugins, so deduplication saves two downloads every run.
//!
//! A plugin whose payload cannot be found in its archive is simply absent
//! from the returned map; the stage that loads artifacts decides that this
//! is fatal. Network and archive failures propagate immediately.

use crate::archive;
use crate::config::PluginSpec;
use crate::core::UpdaterError;
use crate::fetcher::ArtifactFetcher;
use crate::scan;
use colored::Colorize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolve each plugin to the path of its freshly extracted payload.
///
/// Downloads go through `fetcher` into `scratch`; extraction lands beside
/// each download in a `<download>_out` directory. Returns a map from plugin
/// name to extracted file path. Plugins whose name matches nothing in their
/// archive are omitted.
///
/// # Errors
///
/// Propagates fetch and extraction failures; both abort the run.
pub async fn resolve<F: ArtifactFetcher>(
    fetcher: &F,
    plugins: &[PluginSpec],
    scratch: &Path,
) -> Result<HashMap<String, PathBuf>, UpdaterError> {
    let mut resolved = HashMap::new();
    let mut extracted_for_url: HashMap<String, PathBuf> = HashMap::new();

    for plugin in plugins {
        let extract_dir = match extracted_for_url.get(&plugin.source_url) {
            Some(dir) => dir.clone(),
            None => {
                println!("{} {}", "downloading".cyan(), plugin.source_url);

                let download = fetcher.fetch(&plugin.source_url, scratch).await?;
                let extract_dir = sibling_out_dir(&download);
                archive::extract(&download, &extract_dir)?;

                extracted_for_url.insert(plugin.source_url.clone(), extract_dir.clone());
                extract_dir
            }
        };

        let outcome = scan::scan(&extract_dir);
        outcome.report_errors();

        match outcome.files.iter().find(|path| plugin.matches(path)) {
            Some(path) => {
                debug!(plugin = %plugin.name, path = %path.display(), "payload located");
                resolved.insert(plugin.name.clone(), path.clone());
            }
            None => {
                warn!(plugin = %plugin.name, "payload not present in archive");
            }
        }
    }

    Ok(resolved)
}

/// Extraction directory for a downloaded archive: the download path with
/// `_out` appended, so related scratch entries sort together.
fn sibling_out_dir(download: &Path) -> PathBuf {
    let mut name = download
        .file_name()
        .map_or_else(|| "download".to_string(), |n| n.to_string_lossy().into_owned());
    name.push_str("_out");
    download.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_dir_is_sibling_with_suffix() {
        let out = sibling_out_dir(Path::new("/tmp/scratch/shiori-updaterab12"));
        assert_eq!(out, Path::new("/tmp/scratch/shiori-updaterab12_out"));
    }
}
