//! Command-line interface.
//!
//! One positional argument — the directory tree to scan, defaulting to the
//! current working directory — plus flags for verbosity and for the two
//! interactive behaviors that get in the way of scripted runs (the exit
//! prompt and the self-update check). `--version` is handled by clap and
//! short-circuits everything else.

use crate::config;
use crate::engine;
use crate::fetcher::HttpFetcher;
use crate::process::SystemProbe;
use crate::resolver;
use crate::upgrade::{SelfUpdateOutcome, SelfUpdater};
use crate::utils;
use crate::version::FileVersionStrategy;
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Top-level CLI for shiori-updater.
#[derive(Parser, Debug)]
#[command(
    name = "shiori-updater",
    about = "Update installed SHIORI plugin binaries to their latest releases",
    version
)]
pub struct Cli {
    /// Directory tree to scan for installed plugins.
    ///
    /// Defaults to the current working directory, which is where the tool
    /// lands when dropped next to an Ukagaka install and double-clicked.
    #[arg(value_name = "TARGET_DIR")]
    pub target: Option<PathBuf>,

    /// Enable debug-level diagnostics on stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors; no progress bars.
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip the final "press Enter to close" prompt.
    #[arg(long)]
    pub no_pause: bool,

    /// Skip the self-update check against the release feed.
    #[arg(long)]
    pub skip_self_update: bool,
}

impl Cli {
    /// Install the tracing subscriber according to the verbosity flags.
    ///
    /// `RUST_LOG` still wins when set, so an operator can always dial up one
    /// module without editing anything.
    pub fn init_logging(&self) {
        let default_level = if self.verbose {
            "shiori_updater=debug"
        } else if self.quiet {
            "shiori_updater=warn"
        } else {
            "shiori_updater=info"
        };

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Run the whole update flow: self-update check, fetch, compare, replace.
    ///
    /// # Errors
    ///
    /// Fatal errors only (network, archive, unexpected filesystem failures);
    /// `main` renders them and exits non-zero. Locked files, unreadable
    /// subtrees, and unreadable version resources are handled inside the run.
    pub async fn execute(self) -> Result<()> {
        if self.skip_self_update {
            tracing::debug!("self-update check skipped by flag");
        } else if self.self_update_pass().await {
            // Executable replaced; the relaunch finishes the job.
            self.pause();
            return Ok(());
        }

        let target = match &self.target {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine current directory")?,
        };

        // Scratch space for downloads and extractions. TempDir removes the
        // whole tree on drop, so fatal returns clean up too.
        let scratch = tempfile::Builder::new()
            .prefix("shiori-updater")
            .tempdir()
            .context("cannot create scratch directory")?;

        let plugins = config::default_plugins();
        let fetcher = if self.quiet { HttpFetcher::new().quiet() } else { HttpFetcher::new() };

        println!("\n{}", "fetching the latest plugin releases...".bold());
        let resolved = resolver::resolve(&fetcher, &plugins, scratch.path())
            .await
            .context("failed to fetch plugin releases")?;
        let artifacts = engine::load_artifacts(&plugins, &resolved)
            .context("failed to stage plugin payloads")?;
        println!("fetch complete");

        println!("\n{}", "searching for update targets".bold());
        let report = engine::run(
            &target,
            &plugins,
            &artifacts,
            &FileVersionStrategy,
            &SystemProbe,
        )
        .context("update run failed")?;

        report.narrate();

        self.pause();
        Ok(())
    }

    /// Check the release feed and replace the running executable when the
    /// published version differs. Returns `true` when a relaunch is needed.
    ///
    /// Feed failures are warnings, never fatal: an unreachable feed must not
    /// stop plugin updates.
    async fn self_update_pass(&self) -> bool {
        println!("{}", "checking for updater updates...".bold());

        // self_update's HTTP layer is blocking; keep it off the runtime
        // worker threads.
        let outcome = tokio::task::spawn_blocking(|| SelfUpdater::new().run()).await;
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(join_error) => {
                warn!("self-update task failed: {join_error}");
                return false;
            }
        };

        match outcome {
            Ok(SelfUpdateOutcome::UpToDate) => {
                println!("updater is current");
                false
            }
            Ok(SelfUpdateOutcome::Updated { from, to }) => {
                println!("{} {} -> {}", "updater replaced:".green().bold(), from, to);
                println!("close this window and run the new version");
                true
            }
            Err(error) => {
                warn!("self-update check failed: {error}");
                println!(
                    "{} self-update check failed ({error}); continuing with plugin updates",
                    "warning:".yellow()
                );
                false
            }
        }
    }

    fn pause(&self) {
        if !self.no_pause {
            utils::wait_for_enter();
        }
    }
}
