//! Entry classification from listing metadata. No filesystem access.

use crate::common::{Entry, EntryKind, LinkKind};

/// Classifies `entry`. Link metadata takes precedence over the file/directory split.
pub fn classify(entry: &Entry) -> EntryKind {
    match entry.link {
        Some(LinkKind::SymbolicLink) => EntryKind::SymbolicLink,
        Some(LinkKind::HardLink) => EntryKind::HardLink,
        Some(LinkKind::Junction) => EntryKind::Junction,
        None if entry.is_dir => EntryKind::Directory,
        None => EntryKind::File,
    }
}
