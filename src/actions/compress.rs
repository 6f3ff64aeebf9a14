//! Archival of selected entries into single-entry zip files.

use std::path::{Path, PathBuf};

use super::{build_result, failure, gate_allows, is_not_found, run_standalone, Outcome, Skip};
use crate::archive::{archive_path_for, is_archive, CompressionLevel};
use crate::common::{Action, Entry, ItemFailure, Report};
use crate::confirm::ConfirmationGate;
use crate::fsx::{DirectoryLister, Mutator};
use crate::threshold::RetentionCriterion;

/// Where and how archives are written.
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    /// Directory receiving the archives. `None` puts each archive next to its source.
    pub destination: Option<PathBuf>,
    /// Remove the source once its archive is written.
    pub remove_after: bool,
    pub level: CompressionLevel,
}

/// Archives one selected entry to `<destination>/<stem>.zip`, overwriting an existing archive.
///
/// Entries that already are archives, and entries that disappeared, are skipped.
/// When `remove_after` is set and removing the source fails, the archive is still
/// reported as applied and the removal failure travels alongside it.
pub fn compress_entry(
    entry: &Entry,
    criterion: &RetentionCriterion,
    options: &CompressOptions,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
) -> Outcome {
    if is_archive(&entry.path) {
        tracing::debug!(path = %entry.path.display(), "already an archive, skipping");
        return Outcome::Skipped(Skip::AlreadyArchived);
    }
    let destination = archive_path_for(&entry.path, options.destination.as_deref());
    let archive = Some(destination.clone());
    let Some(result) = build_result(entry, criterion, Action::Compress, archive) else {
        return Outcome::Skipped(Skip::NoTimestamp);
    };
    if !mutator.exists(&entry.path) {
        tracing::debug!(path = %entry.path.display(), "entry vanished before archiving, skipping");
        return Outcome::Skipped(Skip::Vanished);
    }
    if !gate_allows(gate, Action::Compress, entry) {
        return Outcome::Skipped(Skip::Declined);
    }

    if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !mutator.exists(dir) {
            if let Err(e) = mutator.create_dir_all(dir) {
                return Outcome::Failed(failure(&entry.path, Action::Compress, e));
            }
        }
    }

    if let Err(e) = mutator.create_archive(&entry.path, &destination, options.level) {
        if is_not_found(&e) && !mutator.exists(&entry.path) {
            tracing::debug!(
                path = %entry.path.display(),
                "entry vanished while archiving, skipping"
            );
            return Outcome::Skipped(Skip::Vanished);
        }
        return Outcome::Failed(failure(&entry.path, Action::Compress, e));
    }
    tracing::info!(
        path = %entry.path.display(),
        archive = %destination.display(),
        kind = %result.kind,
        value = %result.value,
        "archived"
    );

    let cleanup_failure = if options.remove_after {
        remove_source(&entry.path, mutator)
    } else {
        None
    };
    Outcome::Applied { result, cleanup_failure }
}

fn remove_source(path: &Path, mutator: &dyn Mutator) -> Option<ItemFailure> {
    match mutator.remove(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed source after archiving");
            None
        }
        Err(e) if is_not_found(&e) => None,
        Err(e) => Some(failure(path, Action::Delete, e)),
    }
}

/// Archives every direct child of each root selected by `criterion`.
pub fn compress_old(
    roots: &[PathBuf],
    criterion: &RetentionCriterion,
    options: &CompressOptions,
    lister: &dyn DirectoryLister,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
) -> Report {
    run_standalone(roots, criterion, Action::Compress, lister, |entry| {
        compress_entry(entry, criterion, options, mutator, gate)
    })
}
