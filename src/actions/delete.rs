//! Deletion of selected entries.

use std::path::PathBuf;

use super::{build_result, failure, gate_allows, is_not_found, run_standalone, Outcome, Skip};
use crate::common::{Action, Entry, Report};
use crate::confirm::ConfirmationGate;
use crate::fsx::{DirectoryLister, Mutator};
use crate::threshold::RetentionCriterion;

/// Permanently removes one selected entry (subtrees included).
///
/// An entry that is already gone is skipped, not reported as a failure.
pub fn delete_entry(
    entry: &Entry,
    criterion: &RetentionCriterion,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
) -> Outcome {
    let Some(result) = build_result(entry, criterion, Action::Delete, None) else {
        return Outcome::Skipped(Skip::NoTimestamp);
    };
    if !mutator.exists(&entry.path) {
        tracing::debug!(path = %entry.path.display(), "entry vanished before deletion, skipping");
        return Outcome::Skipped(Skip::Vanished);
    }
    if !gate_allows(gate, Action::Delete, entry) {
        return Outcome::Skipped(Skip::Declined);
    }

    match mutator.remove(&entry.path) {
        Ok(()) => {
            tracing::info!(
                path = %entry.path.display(),
                kind = %result.kind,
                value = %result.value,
                "deleted"
            );
            Outcome::applied(result)
        }
        Err(e) if is_not_found(&e) => {
            tracing::debug!(
                path = %entry.path.display(),
                "entry vanished during deletion, skipping"
            );
            Outcome::Skipped(Skip::Vanished)
        }
        Err(e) => Outcome::Failed(failure(&entry.path, Action::Delete, e)),
    }
}

/// Deletes every direct child of each root selected by `criterion`.
pub fn remove_old(
    roots: &[PathBuf],
    criterion: &RetentionCriterion,
    lister: &dyn DirectoryLister,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
) -> Report {
    run_standalone(roots, criterion, Action::Delete, lister, |entry| {
        delete_entry(entry, criterion, mutator, gate)
    })
}
