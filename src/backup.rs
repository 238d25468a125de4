//! Running a backup across all configured profiles.

use crate::archive::{ArchiveJob, ArchiveReport, ArchiveWriter, naming};
use crate::config::{ProfileSpec, ResolvedConfig};
use crate::detect::{ProcessLister, RunningAppDetector};
use crate::output;
use crate::scanner::scan_profile;
use crate::utils::formatters::{format_elapsed, format_size};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Switches that change how a run treats its profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Carry on with the next profile when one fails
    pub keep_going: bool,
    /// Scan and count, but write no archives
    pub dry_run: bool,
}

/// How one profile ended.
#[derive(Debug)]
pub enum ProfileStatus {
    Archived(ArchiveReport),
    /// Dry run: scanned only
    Scanned,
    /// Only recorded when running with `keep_going`
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct ProfileReport {
    pub archive: String,
    /// Files found by the scan (0 when the scan itself failed)
    pub files: usize,
    pub status: ProfileStatus,
    pub elapsed: Duration,
}

/// Overall result of [`BackupOrchestrator::run_all`].
#[derive(Debug)]
pub enum RunOutcome {
    /// The protected application is (or may be) running; nothing was touched
    AppRunning,
    /// Every profile was attempted, in configured order
    Completed(Vec<ProfileReport>),
}

impl RunOutcome {
    /// Profiles that failed under `keep_going`.
    #[must_use]
    pub fn failures(&self) -> Vec<&ProfileReport> {
        match self {
            Self::AppRunning => Vec::new(),
            Self::Completed(reports) => reports
                .iter()
                .filter(|r| matches!(r.status, ProfileStatus::Failed(_)))
                .collect(),
        }
    }
}

/// Drives detection, scanning and archiving for a resolved configuration.
pub struct BackupOrchestrator<L> {
    config: ResolvedConfig,
    detector: RunningAppDetector<L>,
    writer: ArchiveWriter,
    options: RunOptions,
}

impl<L: ProcessLister> BackupOrchestrator<L> {
    pub fn new(
        config: ResolvedConfig,
        detector: RunningAppDetector<L>,
        options: RunOptions,
    ) -> Self {
        let writer = ArchiveWriter::new(config.compression_level);
        Self {
            config,
            detector,
            writer,
            options,
        }
    }

    /// Back up every profile, one after another.
    ///
    /// The running-application check happens once, before any profile is
    /// read. Within a profile the scan finishes before archiving starts.
    ///
    /// # Errors
    ///
    /// Without `keep_going`, the first profile that fails to scan or archive
    /// aborts the run and its error is returned. With `keep_going`, failures
    /// are recorded in the outcome instead.
    pub fn run_all(&self) -> Result<RunOutcome> {
        output::banner(&format!(
            "Profile backup started (variant: {})",
            self.config.variant
        ));

        if self.detector.is_running(&self.config.process_name) {
            output::warning(&format!(
                "{} is running, backup skipped",
                self.config.process_name
            ));
            return Ok(RunOutcome::AppRunning);
        }

        let mut reports = Vec::with_capacity(self.config.profiles.len());
        for profile in &self.config.profiles {
            let started = Instant::now();
            match self.backup_profile(profile) {
                Ok(report) => reports.push(report),
                Err(e) if self.options.keep_going => {
                    let reason = format!("{e:#}");
                    output::error(&format!("    Failed: {reason}"));
                    tracing::error!(archive = %profile.archive, error = %reason, "profile failed");
                    reports.push(ProfileReport {
                        archive: profile.archive.clone(),
                        files: 0,
                        status: ProfileStatus::Failed(e),
                        elapsed: started.elapsed(),
                    });
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Backup of '{}' failed", profile.archive));
                }
            }
        }

        if self.options.keep_going {
            output::section("Summary");
            for report in &reports {
                let line = format!("    {:<24} {} files", report.archive, report.files);
                match &report.status {
                    ProfileStatus::Failed(_) => output::error(&format!("{line}  FAILED")),
                    _ => output::success(&format!("{line}  ok")),
                }
            }
        }

        let outcome = RunOutcome::Completed(reports);
        let failed = outcome.failures().len();
        if failed == 0 {
            output::banner("All profile backups finished");
        } else {
            output::warning(&format!(
                "{failed} of {} profile backups failed",
                self.config.profiles.len()
            ));
        }
        Ok(outcome)
    }

    /// Scan one profile, then pack what the scan found.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be scanned or the archive
    /// cannot be written.
    pub fn backup_profile(&self, profile: &ProfileSpec) -> Result<ProfileReport> {
        let started = Instant::now();
        output::section(&format!("Backing up: {}", profile.archive));
        output::verbose(&format!("    Source: {}", profile.path.display()));

        let stamp = naming::timestamp(&chrono::Local::now());
        let files = scan_profile(&profile.path, &self.config.exclusions)?;
        let count = files.len();
        tracing::info!(archive = %profile.archive, files = count, "profile scanned");
        output::detail("Files", &count.to_string());

        if self.options.dry_run {
            output::detail("Dry run", "no archive written");
            return Ok(ProfileReport {
                archive: profile.archive.clone(),
                files: count,
                status: ProfileStatus::Scanned,
                elapsed: started.elapsed(),
            });
        }

        let destination =
            naming::unique_destination(&self.config.destination, &profile.archive, &stamp);
        let job = ArchiveJob { destination, files };
        let report = self.writer.write(&job)?;

        let elapsed = started.elapsed();
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output::detail(
            "Done",
            &format!(
                "{name} ({}, {})",
                format_size(report.bytes),
                format_elapsed(elapsed)
            ),
        );
        if !report.skipped.is_empty() {
            output::detail("Skipped", &report.skipped.len().to_string());
        }
        if report.missing > 0 {
            output::verbose(&format!(
                "    {} file(s) vanished before they could be archived",
                report.missing
            ));
        }

        Ok(ProfileReport {
            archive: profile.archive.clone(),
            files: count,
            status: ProfileStatus::Archived(report),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionSet;
    use crate::test_utils::fixtures::{list_dir, write_files};
    use std::cell::Cell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Listing that counts how often it was asked
    struct CountingLister {
        listing: &'static str,
        calls: Cell<usize>,
    }

    impl ProcessLister for &CountingLister {
        fn list(&self) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.listing.to_string())
        }
    }

    struct FailingLister;

    impl ProcessLister for FailingLister {
        fn list(&self) -> Result<String> {
            anyhow::bail!("no process list")
        }
    }

    fn config(destination: &Path, profiles: Vec<ProfileSpec>) -> ResolvedConfig {
        ResolvedConfig {
            variant: "default".to_string(),
            profiles,
            destination: destination.to_path_buf(),
            exclusions: ExclusionSet::new(["cache2"]),
            process_name: "firefox.exe".to_string(),
            process_list_command: None,
            compression_level: 1,
        }
    }

    fn spec(path: PathBuf, archive: &str) -> ProfileSpec {
        ProfileSpec {
            path,
            archive: archive.to_string(),
        }
    }

    #[test]
    fn test_running_app_skips_everything() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let lister = CountingLister {
            listing: "explorer.exe\nfirefox.exe\n",
            calls: Cell::new(0),
        };
        // Profile path does not exist: any scan attempt would fail the run
        let profiles = vec![spec(temp.path().join("missing"), "p")];

        let orchestrator = BackupOrchestrator::new(
            config(&dest, profiles),
            RunningAppDetector::new(&lister),
            RunOptions::default(),
        );
        let outcome = orchestrator.run_all().unwrap();

        assert!(matches!(outcome, RunOutcome::AppRunning));
        assert_eq!(lister.calls.get(), 1);
        assert!(list_dir(&dest).is_empty());
    }

    #[test]
    fn test_failed_detection_skips_everything() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("profile");
        write_files(&profile, &["prefs.js"]);

        let orchestrator = BackupOrchestrator::new(
            config(temp.path(), vec![spec(profile, "p")]),
            RunningAppDetector::new(FailingLister),
            RunOptions::default(),
        );

        assert!(matches!(orchestrator.run_all().unwrap(), RunOutcome::AppRunning));
        assert_eq!(list_dir(temp.path()), vec!["profile"]);
    }

    #[test]
    fn test_profiles_archived_in_order() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        write_files(&first, &["prefs.js", "cache2/entry1", "storage/default/x.sqlite"]);
        write_files(&second, &["times.json"]);
        let lister = CountingLister {
            listing: "",
            calls: Cell::new(0),
        };

        let orchestrator = BackupOrchestrator::new(
            config(&dest, vec![spec(first, "alpha"), spec(second, "beta")]),
            RunningAppDetector::new(&lister),
            RunOptions::default(),
        );
        let RunOutcome::Completed(reports) = orchestrator.run_all().unwrap() else {
            panic!("expected a completed run");
        };

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].archive, "alpha");
        assert_eq!(reports[0].files, 2);
        assert_eq!(reports[1].archive, "beta");
        let ProfileStatus::Archived(report) = &reports[0].status else {
            panic!("expected an archive");
        };
        assert_eq!(report.entries, vec!["prefs.js", "storage/default/x.sqlite"]);

        let names = list_dir(&dest);
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("alpha-") && names[0].ends_with(".tar.zst"));
        assert!(names[1].starts_with("beta-"));
    }

    #[test]
    fn test_shared_base_name_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        write_files(&a, &["one"]);
        write_files(&b, &["two"]);
        let lister = CountingLister {
            listing: "",
            calls: Cell::new(0),
        };

        let orchestrator = BackupOrchestrator::new(
            config(&dest, vec![spec(a, "same"), spec(b, "same")]),
            RunningAppDetector::new(&lister),
            RunOptions::default(),
        );
        orchestrator.run_all().unwrap();

        assert_eq!(list_dir(&dest).len(), 2);
    }

    #[test]
    fn test_failure_aborts_run_by_default() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let good = temp.path().join("good");
        write_files(&good, &["prefs.js"]);
        let lister = CountingLister {
            listing: "",
            calls: Cell::new(0),
        };

        let orchestrator = BackupOrchestrator::new(
            config(
                &dest,
                vec![spec(temp.path().join("missing"), "bad"), spec(good, "good")],
            ),
            RunningAppDetector::new(&lister),
            RunOptions::default(),
        );
        let err = orchestrator.run_all().unwrap_err();

        assert!(err.to_string().contains("Backup of 'bad' failed"));
        assert!(list_dir(&dest).is_empty());
    }

    #[test]
    fn test_keep_going_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let good = temp.path().join("good");
        write_files(&good, &["prefs.js"]);
        let lister = CountingLister {
            listing: "",
            calls: Cell::new(0),
        };

        let orchestrator = BackupOrchestrator::new(
            config(
                &dest,
                vec![spec(temp.path().join("missing"), "bad"), spec(good, "good")],
            ),
            RunningAppDetector::new(&lister),
            RunOptions {
                keep_going: true,
                dry_run: false,
            },
        );
        let outcome = orchestrator.run_all().unwrap();

        let failures = outcome.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].archive, "bad");
        let names = list_dir(&dest);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("good-"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let profile = temp.path().join("profile");
        write_files(&profile, &["prefs.js", "cache2/entry1"]);
        let lister = CountingLister {
            listing: "",
            calls: Cell::new(0),
        };

        let orchestrator = BackupOrchestrator::new(
            config(&dest, vec![spec(profile, "p")]),
            RunningAppDetector::new(&lister),
            RunOptions {
                keep_going: false,
                dry_run: true,
            },
        );
        let RunOutcome::Completed(reports) = orchestrator.run_all().unwrap() else {
            panic!("expected a completed run");
        };

        assert_eq!(reports[0].files, 1);
        assert!(matches!(reports[0].status, ProfileStatus::Scanned));
        assert!(list_dir(&dest).is_empty());
    }
}
