//! Console reporting for backup runs.
//!
//! Everything a user sees during a run goes through here:
//! - Bold markers for run-level events (start, early exit, completion)
//! - Dimmed detail lines for per-profile progress
//! - Yellow warnings for skipped files, red errors for failures
//!
//! Lines go to stderr so stdout stays free for shell completions.

mod progress;

use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

pub use progress::Progress;

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet = 0,
    /// Run and profile milestones.
    Normal = 1,
    /// Milestones plus per-file detail.
    Verbose = 2,
}

impl Verbosity {
    /// Pick a level from the `--quiet` / `--verbose` flags; quiet wins.
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Run-level milestone, e.g. "[*] Profile backup started".
pub fn banner(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{} {}", "[*]".cyan().bold(), message.bold());
}

/// Start of a profile, e.g. "[+] Backing up: firefox-profile".
pub fn section(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("\n{} {}", "[+]".green().bold(), message);
}

/// Indented detail under the current profile.
pub fn detail(label: &str, value: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("    {} {}", format!("{label}:").dimmed(), value);
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{} {}", "[!]".yellow().bold(), message.yellow().bold());
}

/// A file left out of an archive for a reason other than having vanished.
pub fn skipped(relative: &str, reason: &str) {
    eprintln!("    {} {} ({})", "[skip]".yellow(), relative, reason.dimmed());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a verbose debug message (only in verbose mode).
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Starts an archiving progress display for `total` files.
#[must_use]
pub fn start_progress(title: &str, total: usize) -> Progress {
    Progress::new(title, total)
}
