//! Common types shared by the policy modules.
// Entries, their classification, and the records produced per action.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::error::RotateError;

/// Link metadata reported by the directory lister, absent for ordinary files and directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    SymbolicLink,
    HardLink,
    Junction,
}

/// A direct child of a root, as reported by a [`crate::fsx::DirectoryLister`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub path: PathBuf,
    /// `None` when the filesystem does not record the timestamp.
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub size: u64,
    pub is_dir: bool,
    pub link: Option<LinkKind>,
}

impl Entry {
    /// The final path component, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Which timestamp of an entry drives selection.
#[derive(ValueEnum, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeAttribute {
    #[default]
    CreationTime,
    LastWriteTime,
    LastAccessTime,
}

type TimeAccessor = fn(&Entry) -> Option<DateTime<Utc>>;

const ACCESSORS: [(TimeAttribute, TimeAccessor); 3] = [
    (TimeAttribute::CreationTime, |e| e.created),
    (TimeAttribute::LastWriteTime, |e| e.modified),
    (TimeAttribute::LastAccessTime, |e| e.accessed),
];

impl TimeAttribute {
    /// Reads this attribute from `entry`.
    pub fn of(self, entry: &Entry) -> Option<DateTime<Utc>> {
        ACCESSORS
            .iter()
            .find(|(attr, _)| *attr == self)
            .and_then(|(_, get)| get(entry))
    }
}

impl fmt::Display for TimeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeAttribute::CreationTime => "CreationTime",
            TimeAttribute::LastWriteTime => "LastWriteTime",
            TimeAttribute::LastAccessTime => "LastAccessTime",
        };
        f.pad(s)
    }
}

/// Classified kind of an entry. Link kinds win over file/directory.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    SymbolicLink,
    HardLink,
    Junction,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{self:?}"))
    }
}

/// The mutating action that produced a record.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Delete,
    Compress,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Action::Delete => "Delete",
            Action::Compress => "Compress",
        })
    }
}

/// Emitted once per entry that was actually mutated.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub attribute: TimeAttribute,
    pub value: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub action: Action,
    /// Destination written by a `Compress` action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
}

/// A recoverable failure isolated to one entry.
#[derive(Debug)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub action: Action,
    pub error: RotateError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for '{}': {}", self.action, self.path.display(), self.error)
    }
}

/// Everything a batch produced: successful records and isolated failures, both in processing order.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<ActionResult>,
    pub failures: Vec<ItemFailure>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
