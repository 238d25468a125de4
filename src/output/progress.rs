//! In-place progress line for archiving a profile.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

/// Counts files as they are packed and redraws a single status line.
///
/// Renders as "Archiving firefox-profile: 42% (420/1000)" and finishes with
/// "..., 3 skipped, done." Silent when stderr is not a terminal or the run is
/// quiet.
pub struct Progress {
    /// Title displayed before the counts
    title: String,
    /// Files in the job
    total: usize,
    /// Files handled so far, added or skipped
    done: usize,
    /// Files that did not make it into the archive
    skipped: usize,
    /// Whether anything is drawn at all
    visible: bool,
    /// Last drawn percentage, to avoid redundant redraws
    last_percent: u8,
    /// A partial line is on screen
    line_open: bool,
}

impl Progress {
    #[must_use]
    pub fn new(title: &str, total: usize) -> Self {
        let visible = io::stderr().is_terminal()
            && super::get_verbosity() != super::Verbosity::Quiet
            && total > 0;

        let mut progress = Self {
            title: title.to_string(),
            total,
            done: 0,
            skipped: 0,
            visible,
            last_percent: 0,
            line_open: false,
        };
        progress.draw();
        progress
    }

    /// Record one file that was added to the archive.
    pub fn added(&mut self) {
        self.advance();
    }

    /// Record one file that was left out.
    pub fn skipped(&mut self) {
        self.skipped += 1;
        self.advance();
    }

    /// End the partial line so another message can be printed on its own
    /// line. The next update redraws the progress below it.
    pub fn interrupt(&mut self) {
        if self.visible && self.line_open {
            eprintln!();
            self.line_open = false;
        }
    }

    fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total);
        let percent = self.percent();
        if percent != self.last_percent || !self.line_open {
            self.last_percent = percent;
            self.draw();
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.done as f64 / self.total as f64) * 100.0) as u8
    }

    fn draw(&mut self) {
        if !self.visible {
            return;
        }
        self.line_open = true;
        eprint!(
            "\r    {}: {}% ({}/{})",
            self.title.dimmed(),
            self.last_percent.to_string().dimmed(),
            self.done,
            self.total
        );
        let _ = io::stderr().flush();
    }

    /// Print the closing line. Consumes the progress so it cannot be reused.
    pub fn finish(mut self) {
        if self.visible {
            let suffix = if self.skipped > 0 {
                format!(", {} skipped", self.skipped)
            } else {
                String::new()
            };
            eprintln!(
                "\r    {}: 100% ({}/{}){suffix}, done.",
                self.title.dimmed(),
                self.done,
                self.total
            );
        }
        self.visible = false;
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        // Abandoned mid-way (job failed): end the partial line
        if self.visible && self.line_open {
            eprintln!();
        }
    }
}
