//! Detection of a running application from the OS process list.
//!
//! Any doubt counts as "running": when the process list cannot be read the
//! run is blocked, not allowed through.

use anyhow::{Context, Result, bail};
use std::process::{Command, Stdio};

/// Something that can produce a text listing of running processes.
pub trait ProcessLister {
    /// Return the listing, one process per line in whatever format the
    /// platform tool uses.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be obtained.
    fn list(&self) -> Result<String>;
}

/// Runs an external command and takes its stdout as the process listing.
#[derive(Debug, Clone)]
pub struct CommandLister {
    program: String,
    args: Vec<String>,
}

impl CommandLister {
    /// Build a lister from `argv`, or the platform default when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is given but empty.
    pub fn from_argv(argv: Option<&[String]>) -> Result<Self> {
        match argv {
            None => Ok(Self::platform_default()),
            Some([program, args @ ..]) => Ok(Self {
                program: program.clone(),
                args: args.to_vec(),
            }),
            Some([]) => bail!("Process list command is empty"),
        }
    }

    /// `tasklist` on Windows, `ps -A -o comm=` elsewhere.
    #[must_use]
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self {
                program: "tasklist".to_string(),
                args: Vec::new(),
            }
        } else {
            Self {
                program: "ps".to_string(),
                args: ["-A", "-o", "comm="].map(String::from).to_vec(),
            }
        }
    }
}

impl ProcessLister for CommandLister {
    fn list(&self) -> Result<String> {
        let program = which::which(&self.program)
            .with_context(|| format!("Process list command not found: {}", self.program))?;

        let output = Command::new(&program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", program.display()))?;

        if !output.status.success() {
            bail!("{} exited with {}", self.program, output.status);
        }

        // Localized tasklist headers come in the console code page
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Decides whether the protected application is active.
pub struct RunningAppDetector<L> {
    lister: L,
}

impl<L: ProcessLister> RunningAppDetector<L> {
    pub const fn new(lister: L) -> Self {
        Self { lister }
    }

    /// Whether `process_name` appears in the process listing, compared
    /// case-insensitively.
    ///
    /// Returns `true` when the listing cannot be obtained.
    pub fn is_running(&self, process_name: &str) -> bool {
        match self.lister.list() {
            Ok(listing) => {
                let found = listing
                    .to_lowercase()
                    .contains(&process_name.to_lowercase());
                tracing::debug!(process = process_name, found, "process list checked");
                found
            }
            Err(e) => {
                let reason = format!("{e:#}");
                tracing::warn!(
                    process = process_name,
                    error = %reason,
                    "process list unavailable, assuming the application is running"
                );
                true
            }
        }
    }
}
