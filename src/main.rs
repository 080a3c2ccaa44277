//! shiori-updater CLI entry point.
//!
//! Parses arguments, runs the update flow, and renders fatal errors in a
//! user-friendly form. The exit prompt runs even on the failure path so
//! output stays visible when the tool was launched by double-click.

use clap::Parser;
use shiori_updater::cli::Cli;
use shiori_updater::core::user_friendly_error;
use shiori_updater::utils;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let pause_on_error = !cli.no_pause;

    if let Err(e) = cli.execute().await {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        if pause_on_error {
            utils::wait_for_enter();
        }
        std::process::exit(1);
    }
}
