/// Profile enumeration with first-level exclusions.
pub mod profile;

pub use profile::scan_profile;

use std::path::{Path, PathBuf};

/// A regular file found under a profile root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Where the file lives on disk
    pub absolute: PathBuf,
    /// Path below the profile root; never starts with `..` or a root
    pub relative: PathBuf,
}

impl ScannedFile {
    /// First component of the relative path, i.e. the entry directly under
    /// the profile root this file belongs to.
    #[must_use]
    pub fn top_level(&self) -> Option<&std::ffi::OsStr> {
        self.relative.components().next().map(|c| c.as_os_str())
    }

    /// Archive entry name: the relative path with `/` separators.
    #[must_use]
    pub fn entry_name(&self) -> String {
        entry_name(&self.relative)
    }
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
