//! Command-line interface definitions for profsnap.
//!
//! The CLI definition is shared between the main binary and the `xtask`
//! man page generator.
//!
//! Note: Field-level documentation is provided via clap doc comments, so we
//! allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for profsnap.
#[derive(Parser, Debug)]
#[command(
    name = "profsnap",
    version = crate::VERSION,
    about = "Back up browser profiles into dated archives",
    long_about = "Archives each configured profile directory into \
                  <name>-<YYYYMMDDHHMMSS>.tar.zst, leaving out caches and other \
                  volatile first-level directories. Nothing is backed up while \
                  the browser is running."
)]
pub struct Cli {
    /// Configuration variant to use (falls back to "default")
    pub tag: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, env = crate::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Write archives here instead of the configured destination
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Continue with the remaining profiles when one fails
    #[arg(short, long)]
    pub keep_going: bool,

    /// Scan and report file counts without writing archives
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show per-file detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long)]
    pub debug: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
