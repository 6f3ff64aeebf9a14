//! # Single-Entry Archives
//!
//! This module writes the zip archives produced by the archival action. Each archive
//! holds exactly one source entry: a file becomes one member, a directory becomes
//! itself plus its whole subtree rooted at its own name.
//!
//! Archives are staged in a temporary file next to the destination and persisted
//! over it once complete, so an existing archive is replaced in one step and a
//! failed write never leaves a truncated file behind.

use chrono::{DateTime, Datelike, Local, Timelike};
use clap::ValueEnum;
use std::fs::{self, File, Metadata};
use std::io::{self, Seek, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, RotateError};

/// Extension of the archives this crate produces (without the dot).
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Trade-off between archive size and speed.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Smallest output (deflate level 9).
    #[default]
    Optimal,
    /// Quickest deflate (level 1).
    Fastest,
    /// Store members uncompressed.
    NoCompression,
}

impl CompressionLevel {
    fn file_options(self) -> FileOptions {
        let base = FileOptions::default();
        match self {
            CompressionLevel::Optimal => base
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(9)),
            CompressionLevel::Fastest => base
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(1)),
            CompressionLevel::NoCompression => base.compression_method(CompressionMethod::Stored),
        }
    }
}

/// True if `path` already carries the archive extension (case-insensitive).
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// Where the archive for `source` goes: `<dir>/<stem>.zip`.
/// `dir` defaults to the source's parent.
pub fn archive_path_for(source: &Path, destination_dir: Option<&Path>) -> PathBuf {
    let dir = destination_dir
        .map(Path::to_path_buf)
        .or_else(|| source.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| source.as_os_str().to_os_string());
    let mut name = stem;
    name.push(".");
    name.push(ARCHIVE_EXTENSION);
    dir.join(name)
}

/// Writes `source` into a fresh archive at `destination`, replacing any existing file there.
/// The destination's parent directory must exist.
pub fn write_single_entry_archive(
    source: &Path,
    destination: &Path,
    level: CompressionLevel,
) -> Result<()> {
    let dest_dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(&dest_dir).map_err(|e| RotateError::io(e, &dest_dir))?;

    {
        let mut writer = SingleEntryWriter::new(staged.as_file_mut(), destination, level);
        writer.add_root(source)?;
        writer.finish()?;
    }

    staged
        .persist(destination)
        .map_err(|e| RotateError::io(e.error, destination))?;
    Ok(())
}

/// Thin wrapper over `ZipWriter` that tags every failure with the archive path.
struct SingleEntryWriter<'a, W: Write + Seek> {
    zip: ZipWriter<W>,
    destination: &'a Path,
    options: FileOptions,
}

impl<'a, W: Write + Seek> SingleEntryWriter<'a, W> {
    fn new(inner: W, destination: &'a Path, level: CompressionLevel) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            destination,
            options: level.file_options(),
        }
    }

    fn zip_err(&self, source: zip::result::ZipError) -> RotateError {
        RotateError::Archive { source, path: self.destination.to_path_buf() }
    }

    fn add_root(&mut self, source: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(source).map_err(|e| RotateError::io(e, source))?;
        let name = member_name(Path::new(source.file_name().unwrap_or(source.as_os_str())));
        self.add_member(source, &name, &meta)?;
        if !meta.is_dir() {
            return Ok(());
        }

        for item in WalkDir::new(source).min_depth(1).follow_links(false).sort_by_file_name() {
            let item = item.map_err(|e| {
                let path = e.path().unwrap_or(source).to_path_buf();
                RotateError::io(e.into(), path)
            })?;
            let rel = item.path().strip_prefix(source).unwrap_or(item.path());
            let meta = item.metadata().map_err(|e| {
                let path = item.path().to_path_buf();
                RotateError::io(e.into(), path)
            })?;
            let member = format!("{name}/{}", member_name(rel));
            self.add_member(item.path(), &member, &meta)?;
        }
        Ok(())
    }

    fn add_member(&mut self, path: &Path, member: &str, meta: &Metadata) -> Result<()> {
        let options = self.member_options(meta);
        if meta.file_type().is_symlink() {
            let target = fs::read_link(path).map_err(|e| RotateError::io(e, path))?;
            self.zip
                .add_symlink(member, target.to_string_lossy(), options)
                .map_err(|e| self.zip_err(e))
        } else if meta.is_dir() {
            self.zip.add_directory(member, options).map_err(|e| self.zip_err(e))
        } else {
            self.zip.start_file(member, options).map_err(|e| self.zip_err(e))?;
            let mut src = File::open(path).map_err(|e| RotateError::io(e, path))?;
            io::copy(&mut src, &mut self.zip).map_err(|e| RotateError::io(e, self.destination))?;
            Ok(())
        }
    }

    fn member_options(&self, meta: &Metadata) -> FileOptions {
        let mut options = self.options;
        if let Some(ts) = meta.modified().ok().and_then(zip_timestamp) {
            options = options.last_modified_time(ts);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            options = options.unix_permissions(meta.permissions().mode() & 0o7777);
        }
        options
    }

    fn finish(mut self) -> Result<()> {
        self.zip.finish().map_err(|e| self.zip_err(e))?;
        Ok(())
    }
}

/// Zip member names always use `/`.
fn member_name(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip stores local wall-clock time from 1980 onwards; anything else keeps the writer default.
fn zip_timestamp(t: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = t.into();
    let year = u16::try_from(local.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
