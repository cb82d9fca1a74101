use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

const STAGING_MARKER: &str = ".tmp.";

/// Directory that holds `destination`, treating a bare file name as the
/// current directory.
fn parent_dir(destination: &Path) -> &Path {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// File-name prefix shared by every staging file of `destination`.
pub fn staging_prefix(destination: &Path) -> Result<OsString> {
    let name = destination
        .file_name()
        .ok_or_else(|| Error::NoFileName(destination.to_path_buf()))?;
    let mut prefix = name.to_os_string();
    prefix.push(STAGING_MARKER);
    Ok(prefix)
}

/// A fresh, uniquely suffixed staging path beside `destination`.
pub fn staging_path(destination: &Path) -> Result<PathBuf> {
    let mut name = staging_prefix(destination)?;
    name.push(uuid::Uuid::new_v4().simple().to_string());
    Ok(parent_dir(destination).join(name))
}

/// Create the destination's parent directory if it is missing.
pub fn ensure_parent(destination: &Path) -> Result<()> {
    let parent = parent_dir(destination);
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Rename `from` over `to` in one step. Both must live on the same
/// filesystem; there is no copy fallback.
pub fn atomic_replace(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| Error::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// Best-effort removal of leftover staging files for `destination`.
///
/// Returns how many files were removed. Individual failures are logged and
/// skipped.
pub fn sweep_staging(destination: &Path) -> usize {
    let Ok(prefix) = staging_prefix(destination) else {
        return 0;
    };
    let prefix = prefix.to_string_lossy().into_owned();
    let Ok(entries) = fs::read_dir(parent_dir(destination)) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::debug!(path = %entry.path().display(), error = %e, "stale staging file not removed"),
        }
    }
    removed
}

/// A staging file that is removed on drop unless committed.
#[derive(Debug)]
pub struct StagedFile {
    path:        PathBuf,
    destination: PathBuf,
    committed:   bool,
}

impl StagedFile {
    /// Reserve a new staging path for `destination`.
    ///
    /// The parent directory is created if needed; the file itself is created
    /// by whoever writes to [`StagedFile::path`].
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref();
        ensure_parent(destination)?;
        Ok(Self {
            path:        staging_path(destination)?,
            destination: destination.to_path_buf(),
            committed:   false,
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn destination(&self) -> &Path { &self.destination }

    /// Promote the staging file to its destination.
    pub fn commit(mut self) -> Result<PathBuf> {
        atomic_replace(&self.path, &self.destination)?;
        self.committed = true;
        Ok(self.destination.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}
