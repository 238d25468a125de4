use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// File extension of every archive written.
pub const ARCHIVE_EXTENSION: &str = "tar.zst";

/// Second-resolution stamp used in archive names, e.g. `20261019143005`.
#[must_use]
pub fn timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d%H%M%S").to_string()
}

/// `<base>-<stamp>.tar.zst`, or `<base>-<stamp>-<n>.tar.zst` for `n > 0`.
#[must_use]
pub fn archive_file_name(base: &str, stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{base}-{stamp}.{ARCHIVE_EXTENSION}")
    } else {
        format!("{base}-{stamp}-{attempt}.{ARCHIVE_EXTENSION}")
    }
}

/// First archive path in `dir` for `base` at `stamp` that does not exist yet.
///
/// Two profiles sharing a base name and finishing within the same second
/// get `-1`, `-2`, ... suffixes instead of overwriting each other.
#[must_use]
pub fn unique_destination(dir: &Path, base: &str, stamp: &str) -> PathBuf {
    (0..)
        .map(|attempt| dir.join(archive_file_name(base, stamp, attempt)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| dir.join(archive_file_name(base, stamp, 0)))
}
