// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters cannot overflow
#![allow(clippy::float_arithmetic)] // Required for size formatting
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # profsnap - guarded browser profile backups
//!
//! profsnap packs one or more browser profile directories into dated,
//! zstd-compressed tar archives, leaving out caches and other volatile data,
//! and refuses to run while the browser itself is running.
//!
//! ## Architecture
//!
//! - [`config`]: TOML configuration and per-machine variant selection
//! - [`detect`]: running-application check against the OS process list
//! - [`scanner`]: profile enumeration with first-level exclusions
//! - [`archive`]: streaming archive construction and naming
//! - [`backup`]: the per-run orchestration of the above
//! - [`output`]: console status lines
//! - [`logging`]: `tracing` subscriber setup
//!
//! ## Example Usage
//!
//! ```no_run
//! use profsnap::backup::{BackupOrchestrator, RunOptions};
//! use profsnap::config::Config;
//! use profsnap::detect::{CommandLister, RunningAppDetector};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(std::path::Path::new("config.toml"))?.resolve(Some("laptop"))?;
//! let lister = CommandLister::from_argv(config.process_list_command.as_deref())?;
//! let orchestrator =
//!     BackupOrchestrator::new(config, RunningAppDetector::new(lister), RunOptions::default());
//! orchestrator.run_all()?;
//! # Ok(())
//! # }
//! ```

/// Streaming archive construction and archive naming.
pub mod archive;

/// Backup orchestration across configured profiles.
pub mod backup;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Configuration parsing, validation, and variant resolution.
pub mod config;

/// Running-application detection.
pub mod detect;

/// Diagnostic logging setup.
pub mod logging;

/// Console output and progress display.
pub mod output;

/// Profile directory scanning.
pub mod scanner;

/// Utility functions and helpers.
pub mod utils;

#[cfg(test)]
mod test_utils;

/// Current version of the profsnap binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PROFSNAP_CONFIG";

/// Default configuration file path relative to the platform config directory.
pub const DEFAULT_CONFIG_PATH: &str = "profsnap/config.toml";
