//! Filesystem collaborators.
//!
//! The policy code never touches `std::fs` directly. It lists roots through a
//! [`DirectoryLister`] and mutates through a [`Mutator`], so the same policy runs
//! against the real filesystem ([`Fs`]) or against an in-memory fake in tests.
//!
//! Platform differences are confined here. Hard links are detected from the Unix link
//! count. On Windows the standard library reports junctions and symbolic links alike
//! (both are name-surrogate reparse points), so this lister tags both as
//! [`LinkKind::SymbolicLink`] and never produces [`LinkKind::Junction`]. Either way the
//! link itself is removed and its target is left alone. Read-only attributes are cleared
//! before removal on Windows, where they would otherwise block it.

use chrono::{DateTime, Utc};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use crate::archive::{self, CompressionLevel};
use crate::common::{Entry, LinkKind};
use crate::error::{Result, RotateError};

/// Enumerates the direct children of a root.
pub trait DirectoryLister {
    /// Lists every child, hidden entries included, in a stable order.
    /// Fails with [`RotateError::PathNotFound`] when `root` is not an existing directory.
    fn list(&self, root: &Path) -> Result<Vec<Entry>>;
}

/// Mutating filesystem operations used by the actions.
pub trait Mutator {
    /// True if something (including a dangling link) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Removes `path` recursively. Links are removed, never followed.
    fn remove(&self, path: &Path) -> Result<()>;

    fn create_dir_all(&self, dir: &Path) -> Result<()>;

    /// Writes a single-entry archive of `source` to `destination`, replacing any existing file.
    fn create_archive(
        &self,
        source: &Path,
        destination: &Path,
        level: CompressionLevel,
    ) -> Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fs;

impl DirectoryLister for Fs {
    fn list(&self, root: &Path) -> Result<Vec<Entry>> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(RotateError::PathNotFound { path: root.to_path_buf() }),
        }

        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for item in walker {
            let item = item.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                RotateError::io(e.into(), path)
            })?;
            let metadata = item.metadata().map_err(io::Error::from);
            let Some(meta) = listed_metadata(item.path(), metadata)? else {
                continue;
            };
            entries.push(entry_from_metadata(item.path(), &meta));
        }
        Ok(entries)
    }
}

impl Mutator for Fs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| RotateError::io(e, path))?;
        remove_with(path, &meta).map_err(|e| RotateError::io(e, path))
    }

    fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| RotateError::io(e, dir))
    }

    fn create_archive(
        &self,
        source: &Path,
        destination: &Path,
        level: CompressionLevel,
    ) -> Result<()> {
        archive::write_single_entry_archive(source, destination, level)
    }
}

/// Metadata of a child that was just read from its directory. A child removed in the
/// meantime is dropped from the listing rather than failing the whole root.
fn listed_metadata(path: &Path, metadata: io::Result<Metadata>) -> Result<Option<Metadata>> {
    match metadata {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "entry vanished while listing, skipping");
            Ok(None)
        }
        Err(e) => Err(RotateError::io(e, path)),
    }
}

/// Builds an [`Entry`] from unfollowed metadata.
pub fn entry_from_metadata(path: &Path, meta: &Metadata) -> Entry {
    Entry {
        path: path.to_path_buf(),
        created: meta.created().ok().map(DateTime::<Utc>::from),
        modified: meta.modified().ok().map(DateTime::<Utc>::from),
        accessed: meta.accessed().ok().map(DateTime::<Utc>::from),
        size: meta.len(),
        is_dir: meta.is_dir(),
        link: link_kind(meta),
    }
}

#[cfg(unix)]
fn link_kind(meta: &Metadata) -> Option<LinkKind> {
    use std::os::unix::fs::MetadataExt;
    if meta.file_type().is_symlink() {
        Some(LinkKind::SymbolicLink)
    } else if !meta.is_dir() && meta.nlink() > 1 {
        Some(LinkKind::HardLink)
    } else {
        None
    }
}

#[cfg(not(unix))]
fn link_kind(meta: &Metadata) -> Option<LinkKind> {
    meta.file_type().is_symlink().then_some(LinkKind::SymbolicLink)
}

fn remove_with(path: &Path, meta: &Metadata) -> io::Result<()> {
    let ft = meta.file_type();
    if ft.is_symlink() {
        #[cfg(windows)]
        {
            use std::os::windows::fs::FileTypeExt;
            if ft.is_symlink_dir() {
                return fs::remove_dir(path);
            }
        }
        fs::remove_file(path)
    } else if ft.is_dir() {
        #[cfg(windows)]
        clear_readonly(path)?;
        fs::remove_dir_all(path)
    } else {
        #[cfg(windows)]
        clear_readonly(path)?;
        fs::remove_file(path)
    }
}

/// Clears the read-only attribute on `path` and everything below it. Links are not followed.
#[cfg(windows)]
#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(path: &Path) -> io::Result<()> {
    for item in WalkDir::new(path).follow_links(false) {
        let item = item?;
        let meta = item.metadata()?;
        let mut perms = meta.permissions();
        if perms.readonly() && !meta.file_type().is_symlink() {
            perms.set_readonly(false);
            fs::set_permissions(item.path(), perms)?;
        }
    }
    Ok(())
}
