//! Packing scanned profile files into a compressed archive.
//!
//! Archives are tar streams compressed with zstd. They are built in a
//! temporary file next to the destination and renamed into place only after
//! the stream has been finished, flushed and synced, so a file under the
//! final name is always a complete archive.

pub mod naming;

use crate::output;
use crate::scanner::ScannedFile;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// zstd level used unless the config asks for another.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 1;

/// One archive to produce: where it goes and what goes in it.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    /// Final archive path; its parent directory must exist
    pub destination: PathBuf,
    pub files: Vec<ScannedFile>,
}

/// What happened to one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Stored in the archive
    Added,
    /// Gone by the time it was opened; not worth reporting
    SkippedNotFound,
    /// Could not be opened for another reason
    Skipped { error: io::Error },
}

impl FileOutcome {
    /// Reason to show on the console, if this outcome deserves one.
    /// Files that vanished since the scan are expected and get none.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::Skipped { error } => Some(describe(error)),
            Self::Added | Self::SkippedNotFound => None,
        }
    }
}

/// Result of a finished archive job.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub path: PathBuf,
    /// Entry names stored, in archive order
    pub entries: Vec<String>,
    /// Files that disappeared between scan and archive
    pub missing: usize,
    /// Files left out for other reasons, with the reason
    pub skipped: Vec<(String, String)>,
    /// Size of the finished archive on disk
    pub bytes: u64,
}

impl ArchiveReport {
    fn record(&mut self, file: &ScannedFile, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Added => self.entries.push(file.entry_name()),
            FileOutcome::SkippedNotFound => self.missing += 1,
            FileOutcome::Skipped { error } => {
                self.skipped.push((file.entry_name(), error.to_string()));
            }
        }
    }
}

/// Streams files into a single zstd-compressed tar archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveWriter {
    compression_level: i32,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ArchiveWriter {
    #[must_use]
    pub const fn new(compression_level: i32) -> Self {
        Self { compression_level }
    }

    /// Write `job.files` into `job.destination`.
    ///
    /// A file that cannot be opened is skipped and the job carries on: a
    /// missing file silently, any other error with a warning. Every entry is
    /// named after the file's path relative to its profile root.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination directory is missing or not
    /// writable, if writing the stream fails, or if the destination name is
    /// taken by the time the archive is moved into place. No file is left
    /// under the destination name in that case.
    pub fn write(&self, job: &ArchiveJob) -> Result<ArchiveReport> {
        let dir = job
            .destination
            .parent()
            .context("Archive destination has no parent directory")?;
        let name = job
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(".profsnap-")
            .suffix(".partial")
            .tempfile_in(dir)
            .with_context(|| format!("Failed to create archive in {}", dir.display()))?;

        let mut report = ArchiveReport {
            path: job.destination.clone(),
            ..ArchiveReport::default()
        };

        {
            let buffered = BufWriter::new(temp.as_file());
            let encoder = zstd::Encoder::new(buffered, self.compression_level)
                .context("Failed to start zstd stream")?;
            let mut builder = tar::Builder::new(encoder);
            let mut progress =
                output::start_progress(&format!("Archiving {name}"), job.files.len());

            for file in &job.files {
                let outcome = Self::append(&mut builder, file)?;
                if let Some(reason) = outcome.diagnostic() {
                    tracing::warn!(path = %file.absolute.display(), %reason, "file skipped");
                    progress.interrupt();
                    output::skipped(&file.entry_name(), &reason);
                }
                match &outcome {
                    FileOutcome::Added => progress.added(),
                    FileOutcome::SkippedNotFound => {
                        tracing::debug!(
                            path = %file.absolute.display(),
                            "vanished before archiving"
                        );
                        progress.skipped();
                    }
                    FileOutcome::Skipped { .. } => progress.skipped(),
                }
                report.record(file, outcome);
            }

            let encoder = builder.into_inner().context("Failed to finish tar stream")?;
            let buffered = encoder.finish().context("Failed to finish zstd stream")?;
            let out = buffered
                .into_inner()
                .map_err(io::IntoInnerError::into_error)
                .context("Failed to flush archive")?;
            out.sync_all().context("Failed to sync archive to disk")?;
            progress.finish();
        }

        report.bytes = temp
            .as_file()
            .metadata()
            .context("Failed to read archive size")?
            .len();

        temp.persist_noclobber(&job.destination)
            .map_err(|e| e.error)
            .with_context(|| {
                format!(
                    "Failed to move archive into place: {}",
                    job.destination.display()
                )
            })?;

        tracing::info!(
            archive = %job.destination.display(),
            entries = report.entries.len(),
            missing = report.missing,
            skipped = report.skipped.len(),
            bytes = report.bytes,
            "archive written"
        );
        Ok(report)
    }

    /// Open `file` and stream it into the archive.
    ///
    /// Failing to open is a per-file outcome; failing to write is an error
    /// for the whole job.
    fn append<W: io::Write>(
        builder: &mut tar::Builder<W>,
        file: &ScannedFile,
    ) -> Result<FileOutcome> {
        let mut handle = match File::open(&file.absolute) {
            Ok(handle) => handle,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileOutcome::SkippedNotFound);
            }
            Err(e) => return Ok(FileOutcome::Skipped { error: e }),
        };

        builder
            .append_file(&file.relative, &mut handle)
            .with_context(|| format!("Failed to add {} to archive", file.absolute.display()))?;
        Ok(FileOutcome::Added)
    }
}

/// Short reason for a skipped file, e.g. "PermissionDenied".
fn describe(error: &io::Error) -> String {
    match error.raw_os_error() {
        Some(code) => format!("{:?}, os error {code}", error.kind()),
        None => format!("{:?}", error.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionSet;
    use crate::scanner::scan_profile;
    use crate::test_utils::fixtures::{list_dir, profile_with, read_archive};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_archive_contains_every_scanned_file() {
        let profile = profile_with(&["prefs.js", "storage/default/x.sqlite", "a/b/c/d.txt"]);
        let dest = TempDir::new().unwrap();
        let files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();
        let job = ArchiveJob {
            destination: dest.path().join("p-20260101000000.tar.zst"),
            files,
        };

        let report = ArchiveWriter::default().write(&job).unwrap();

        let stored = read_archive(&job.destination);
        let names: Vec<&str> = stored.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a/b/c/d.txt", "prefs.js", "storage/default/x.sqlite"]);
        assert_eq!(report.entries, names);
        assert_eq!(stored[1].1, b"prefs.js");
        assert!(report.bytes > 0);
        assert_eq!(report.bytes, fs::metadata(&job.destination).unwrap().len());
    }

    #[test]
    fn test_vanished_file_is_skipped_quietly() {
        let profile = profile_with(&["keep.txt", "gone.txt"]);
        let dest = TempDir::new().unwrap();
        let files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();
        fs::remove_file(profile.path().join("gone.txt")).unwrap();
        let job = ArchiveJob {
            destination: dest.path().join("p.tar.zst"),
            files,
        };

        let report = ArchiveWriter::default().write(&job).unwrap();

        assert_eq!(report.entries, vec!["keep.txt"]);
        assert_eq!(report.missing, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(read_archive(&job.destination).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped_with_reason() {
        use std::os::unix::fs::PermissionsExt;

        let profile = profile_with(&["open.txt", "locked.txt"]);
        let locked = profile.path().join("locked.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if File::open(&locked).is_ok() {
            // Running as root; permissions are not enforced
            return;
        }
        let dest = TempDir::new().unwrap();
        let files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();
        let job = ArchiveJob {
            destination: dest.path().join("p.tar.zst"),
            files,
        };

        let report = ArchiveWriter::default().write(&job).unwrap();

        assert_eq!(report.entries, vec!["open.txt"]);
        assert_eq!(report.missing, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "locked.txt");
    }

    /// A path below a regular file fails to open with something other than
    /// NotFound, even for root.
    #[cfg(unix)]
    fn not_a_directory(profile: &Path) -> ScannedFile {
        ScannedFile {
            absolute: profile.join("prefs.js").join("child"),
            relative: PathBuf::from("prefs.js").join("child"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_only_non_missing_failures_get_a_diagnostic() {
        let profile = profile_with(&["prefs.js"]);
        let vanished = ScannedFile {
            absolute: profile.path().join("gone.txt"),
            relative: PathBuf::from("gone.txt"),
        };
        let mut builder = tar::Builder::new(Vec::new());

        let outcome = ArchiveWriter::append(&mut builder, &vanished).unwrap();
        assert!(matches!(outcome, FileOutcome::SkippedNotFound));
        assert!(outcome.diagnostic().is_none());

        let outcome = ArchiveWriter::append(&mut builder, &not_a_directory(profile.path())).unwrap();
        assert!(matches!(outcome, FileOutcome::Skipped { .. }));
        assert!(outcome.diagnostic().is_some());

        assert!(FileOutcome::Added.diagnostic().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unopenable_file_is_skipped_and_job_continues() {
        let profile = profile_with(&["prefs.js", "times.json"]);
        let dest = TempDir::new().unwrap();
        let mut files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();
        files.insert(1, not_a_directory(profile.path()));
        let job = ArchiveJob {
            destination: dest.path().join("p.tar.zst"),
            files,
        };

        let report = ArchiveWriter::default().write(&job).unwrap();

        assert_eq!(report.entries, vec!["prefs.js", "times.json"]);
        assert_eq!(report.missing, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "prefs.js/child");
        assert_eq!(read_archive(&job.destination).len(), 2);
    }

    #[test]
    fn test_missing_destination_directory_fails() {
        let profile = profile_with(&["prefs.js"]);
        let dest = TempDir::new().unwrap();
        let destination = dest.path().join("no-such-dir").join("p.tar.zst");
        let files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();

        let err = ArchiveWriter::default()
            .write(&ArchiveJob {
                destination: destination.clone(),
                files,
            })
            .unwrap_err();

        assert!(err.to_string().contains("Failed to create archive"));
        assert!(!destination.exists());
    }

    #[test]
    fn test_existing_archive_is_never_overwritten() {
        let profile = profile_with(&["prefs.js"]);
        let dest = TempDir::new().unwrap();
        let destination = dest.path().join("p.tar.zst");
        fs::write(&destination, b"previous").unwrap();
        let files = scan_profile(profile.path(), &ExclusionSet::default()).unwrap();

        let result = ArchiveWriter::default().write(&ArchiveJob {
            destination: destination.clone(),
            files,
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&destination).unwrap(), b"previous");
        assert_eq!(list_dir(dest.path()), vec!["p.tar.zst"], "temporary file left behind");
    }

    #[test]
    fn test_empty_job_produces_valid_archive() {
        let dest = TempDir::new().unwrap();
        let job = ArchiveJob {
            destination: dest.path().join("empty.tar.zst"),
            files: Vec::new(),
        };

        let report = ArchiveWriter::new(3).write(&job).unwrap();

        assert!(report.entries.is_empty());
        assert!(read_archive(&job.destination).is_empty());
    }
}
