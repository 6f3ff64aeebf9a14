//! # Actions
//!
//! The two mutating actions, usable on their own or from the rotation orchestrator:
//!
//! - [`delete`]: recursive, permanent removal of an entry.
//! - [`compress`]: single-entry zip archive of an entry, optionally removing the source.
//!
//! Each action works on one already-selected entry and reports an [`Outcome`] instead of
//! returning early, so a failing item never stops the rest of a batch.

pub mod compress;
pub mod delete;

pub use compress::{compress_entry, compress_old, CompressOptions};
pub use delete::{delete_entry, remove_old};

use std::path::{Path, PathBuf};

use crate::classify::classify;
use crate::common::{Action, ActionResult, Entry, ItemFailure, Report};
use crate::confirm::ConfirmationGate;
use crate::error::RotateError;
use crate::fsx::DirectoryLister;
use crate::select::select;
use crate::threshold::RetentionCriterion;

/// Why an entry was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// The entry lacks the criterion's timestamp.
    NoTimestamp,
    /// The entry disappeared between listing and acting.
    Vanished,
    /// The entry already is an archive.
    AlreadyArchived,
    /// The confirmation gate said no.
    Declined,
}

/// What one action did to one entry.
#[derive(Debug)]
pub enum Outcome {
    Applied {
        result: ActionResult,
        /// Removing the source after a successful archive failed. The archive still counts.
        cleanup_failure: Option<ItemFailure>,
    },
    Skipped(Skip),
    Failed(ItemFailure),
}

impl Outcome {
    pub(crate) fn applied(result: ActionResult) -> Self {
        Outcome::Applied { result, cleanup_failure: None }
    }

    /// Appends this outcome to `report`. Skips leave no trace.
    pub fn record(self, report: &mut Report) {
        match self {
            Outcome::Applied { result, cleanup_failure } => {
                report.results.push(result);
                report.failures.extend(cleanup_failure);
            }
            Outcome::Skipped(_) => {}
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }
}

fn build_result(
    entry: &Entry,
    criterion: &RetentionCriterion,
    action: Action,
    archive: Option<PathBuf>,
) -> Option<ActionResult> {
    Some(ActionResult {
        path: entry.path.clone(),
        kind: classify(entry),
        size: entry.size,
        attribute: criterion.attribute,
        value: criterion.attribute.of(entry)?,
        cutoff: criterion.cutoff,
        action,
        archive,
    })
}

fn failure(path: &Path, action: Action, error: RotateError) -> ItemFailure {
    tracing::warn!(
        path = %path.display(),
        %action,
        error = %error,
        "action failed, continuing with next entry"
    );
    ItemFailure { path: path.to_path_buf(), action, error }
}

fn is_not_found(error: &RotateError) -> bool {
    matches!(error, RotateError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
}

/// Lists each root, selects its children and applies `act` to each one in order.
/// An unreadable root is recorded as a failure for that root only.
fn run_standalone<F>(
    roots: &[PathBuf],
    criterion: &RetentionCriterion,
    action: Action,
    lister: &dyn DirectoryLister,
    mut act: F,
) -> Report
where
    F: FnMut(&Entry) -> Outcome,
{
    let mut report = Report::default();
    for root in roots {
        let entries = match lister.list(root) {
            Ok(entries) => entries,
            Err(error) => {
                tracing::error!(
                    root = %root.display(),
                    error = %error,
                    "cannot enumerate root, skipping it"
                );
                report.failures.push(ItemFailure { path: root.clone(), action, error });
                continue;
            }
        };
        tracing::debug!(root = %root.display(), entries = entries.len(), "enumerated root");
        for entry in select(&entries, criterion) {
            act(entry).record(&mut report);
        }
    }
    report
}

/// Asks the gate, logging declines.
pub(crate) fn gate_allows(gate: &mut dyn ConfirmationGate, action: Action, entry: &Entry) -> bool {
    let approved = gate.approve(action, entry);
    if !approved {
        tracing::debug!(path = %entry.path.display(), %action, "declined, skipping");
    }
    approved
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory filesystem for exercising actions and rotation without touching disk.

    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::io;
    use std::path::{Path, PathBuf};

    use crate::archive::CompressionLevel;
    use crate::common::Entry;
    use crate::error::{Result, RotateError};
    use crate::fsx::{DirectoryLister, Mutator};

    #[derive(Default)]
    pub struct FakeFs {
        pub roots: BTreeMap<PathBuf, Vec<Entry>>,
        pub present: RefCell<BTreeSet<PathBuf>>,
        pub archives: RefCell<Vec<(PathBuf, PathBuf, CompressionLevel)>>,
        pub dirs_created: RefCell<Vec<PathBuf>>,
        pub fail_remove: BTreeSet<PathBuf>,
        pub fail_archive: BTreeSet<PathBuf>,
        pub mutations: RefCell<usize>,
    }

    impl FakeFs {
        pub fn with_root(root: &str, entries: Vec<Entry>) -> Self {
            let mut fs = FakeFs::default();
            fs.add_root(root, entries);
            fs
        }

        pub fn add_root(&mut self, root: &str, entries: Vec<Entry>) {
            let root = PathBuf::from(root);
            self.present.borrow_mut().insert(root.clone());
            for e in &entries {
                self.present.borrow_mut().insert(e.path.clone());
            }
            self.roots.insert(root, entries);
        }

        pub fn has(&self, path: &str) -> bool {
            self.present.borrow().contains(Path::new(path))
        }
    }

    fn denied(path: &Path) -> RotateError {
        RotateError::io(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"), path)
    }

    impl DirectoryLister for FakeFs {
        fn list(&self, root: &Path) -> Result<Vec<Entry>> {
            self.roots
                .get(root)
                .cloned()
                .ok_or_else(|| RotateError::PathNotFound { path: root.to_path_buf() })
        }
    }

    impl Mutator for FakeFs {
        fn exists(&self, path: &Path) -> bool {
            self.present.borrow().contains(path)
        }

        fn remove(&self, path: &Path) -> Result<()> {
            if self.fail_remove.contains(path) {
                return Err(denied(path));
            }
            *self.mutations.borrow_mut() += 1;
            if self.present.borrow_mut().remove(path) {
                Ok(())
            } else {
                Err(RotateError::io(io::Error::from(io::ErrorKind::NotFound), path))
            }
        }

        fn create_dir_all(&self, dir: &Path) -> Result<()> {
            *self.mutations.borrow_mut() += 1;
            self.dirs_created.borrow_mut().push(dir.to_path_buf());
            self.present.borrow_mut().insert(dir.to_path_buf());
            Ok(())
        }

        fn create_archive(
            &self,
            source: &Path,
            destination: &Path,
            level: CompressionLevel,
        ) -> Result<()> {
            if self.fail_archive.contains(source) {
                return Err(denied(destination));
            }
            *self.mutations.borrow_mut() += 1;
            self.archives
                .borrow_mut()
                .push((source.to_path_buf(), destination.to_path_buf(), level));
            self.present.borrow_mut().insert(destination.to_path_buf());
            Ok(())
        }
    }
}
