//! Self-update for the updater binary itself.
//!
//! Before touching any plugin, the tool checks its own GitHub release feed
//! and replaces the running executable when the published version differs
//! from the built-in one. The operator is then told to relaunch: the new
//! binary cannot finish the old process's run.
//!
//! Feed failures are deliberately non-fatal — an unreachable release feed
//! should never stop plugin updates. The caller logs the error and moves on.

pub mod self_updater;

pub use self_updater::{SelfUpdateOutcome, SelfUpdater};
