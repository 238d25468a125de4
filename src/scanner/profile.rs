use super::ScannedFile;
use crate::config::ExclusionSet;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Enumerate every regular file under `root`, skipping first-level entries
/// named in `exclusions`.
///
/// Excluded directories are pruned before they are read, so nothing below
/// them is visited. Symlinks are not followed and not reported. Entries come
/// back in a stable depth-first, name-sorted order.
///
/// No existence or readability check is made on the files themselves; they
/// may vanish before they are archived.
///
/// # Errors
///
/// Returns an error if the root is missing or not a directory, or if the
/// root or any non-excluded directory cannot be read.
pub fn scan_profile(root: &Path, exclusions: &ExclusionSet) -> Result<Vec<ScannedFile>> {
    let metadata = fs::metadata(root)
        .with_context(|| format!("Failed to scan profile: {}", root.display()))?;
    if !metadata.is_dir() {
        bail!("Profile path is not a directory: {}", root.display());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e, exclusions));

    for entry in walker {
        let entry = entry.map_err(|e| scan_error(root, e))?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| {
                format!("{} is outside {}", entry.path().display(), root.display())
            })?
            .to_path_buf();

        tracing::trace!(path = %relative.display(), "scanned");
        files.push(ScannedFile {
            absolute: entry.into_path(),
            relative,
        });
    }

    tracing::debug!(root = %root.display(), files = files.len(), "profile scanned");
    Ok(files)
}

/// Wrap the underlying I/O error once; walkdir's own message repeats it.
fn scan_error(root: &Path, err: walkdir::Error) -> anyhow::Error {
    let context = match err.path() {
        Some(path) if path != root => format!(
            "Failed to scan profile {}: cannot read {}",
            root.display(),
            path.display()
        ),
        _ => format!("Failed to scan profile: {}", root.display()),
    };
    match err.into_io_error() {
        Some(io) => anyhow::Error::new(io).context(context),
        None => anyhow::anyhow!("{context}: filesystem loop"),
    }
}

/// Only entries directly below the root are candidates for exclusion
fn is_excluded(entry: &DirEntry, exclusions: &ExclusionSet) -> bool {
    entry.depth() == 1
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| exclusions.contains(name))
}
