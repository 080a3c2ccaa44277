//! shiori-updater — keeps installed SHIORI plugin binaries up to date.
//!
//! SHIORI modules are the dialogue engines loaded by Ukagaka desktop-mascot
//! hosts; each ghost carries its own copy, so a single install can hold the
//! same DLL at a dozen paths in a dozen versions. This tool downloads the
//! latest released archive for each known plugin, then walks a target tree
//! replacing every outdated copy in place, preserving permissions and
//! timestamps so the install looks freshly deployed.
//!
//! # Pipeline
//!
//! ```text
//! fetch ──> extract ──> locate payload ─┐
//!                                       v
//!            scan target tree ──> compare versions ──> safe replace
//! ```
//!
//! - [`fetcher`] downloads each unique archive URL once per run into a
//!   scratch directory
//! - [`archive`] extracts it, preserving entry timestamps and modes
//! - [`resolver`] drives both and locates each plugin's payload by filename
//!   suffix
//! - [`scan`] lists the target tree, skipping unreadable subtrees instead of
//!   aborting
//! - [`version`] decides outdated-or-not behind a pluggable strategy; the
//!   default reads the numeric PE file version from both sides
//! - [`engine`] performs the metadata-preserving overwrite and tallies the
//!   run
//!
//! # Failure model
//!
//! Fetch, extraction, and unexpected filesystem failures abort the run.
//! Everything that can reasonably happen on a decade-old ghost directory —
//! unreadable subtrees, files locked by the running host, binaries without
//! version resources — is recovered per file and reported at the end. See
//! [`core::error`] for the full taxonomy.
//!
//! # Supporting modules
//!
//! - [`cli`] — argument parsing and the run orchestration
//! - [`config`] — the built-in, immutable plugin list
//! - [`process`] — host-process liveness, for friendlier lock advisories
//! - [`upgrade`] — self-update of the tool from its own release feed

pub mod archive;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod fetcher;
pub mod process;
pub mod resolver;
pub mod scan;
pub mod upgrade;
pub mod utils;
pub mod version;
