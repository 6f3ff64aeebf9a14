//! # Rotation
//!
//! The combined retention policy: entries older than the deletion cutoff are removed,
//! entries older than the (more recent) compression cutoff are archived.
//!
//! Every root is listed exactly once, up front, so a missing root aborts the run before
//! anything is mutated. Each entry then goes through delete-then-maybe-compress: the
//! archive step only runs for entries that were not due for deletion or whose deletion
//! failed. An entry whose deletion was declined is left alone, so nothing old enough to
//! delete is ever archived instead.
//!
//! Existing archives are the product of earlier rotations and are left alone by both
//! steps, whatever their age.

use chrono::{DateTime, Local, TimeZone};
use std::path::PathBuf;

use crate::actions::{compress_entry, delete_entry, CompressOptions, Outcome};
use crate::archive::is_archive;
use crate::common::{Entry, Report, TimeAttribute};
use crate::confirm::ConfirmationGate;
use crate::error::{Result, RotateError};
use crate::fsx::{DirectoryLister, Mutator};
use crate::select::is_selected;
use crate::threshold::{RetentionCriterion, Threshold, TimeUnit};

/// Rotation as requested on the command line: magnitudes in one shared unit.
#[derive(Debug, Clone)]
pub struct RotationSettings {
    pub attribute: TimeAttribute,
    pub unit: TimeUnit,
    pub compression: Option<u32>,
    pub deletion: Option<u32>,
    pub options: CompressOptions,
}

impl RotationSettings {
    /// Validates and resolves against the local wall clock.
    pub fn into_policy(self) -> Result<RotationPolicy> {
        self.into_policy_at(Local::now())
    }

    /// Validates and resolves against `now`.
    pub fn into_policy_at<Tz: TimeZone>(self, now: DateTime<Tz>) -> Result<RotationPolicy> {
        for (name, magnitude) in [("compression", self.compression), ("deletion", self.deletion)] {
            if magnitude == Some(0) {
                return Err(RotateError::Validation(format!(
                    "{name} threshold must be greater than zero"
                )));
            }
        }
        let resolve = |magnitude: Option<u32>| -> Result<Option<RetentionCriterion>> {
            magnitude
                .map(|m| {
                    let threshold = Threshold::Ago { unit: self.unit, magnitude: m };
                    let cutoff = threshold.resolve_at(now.clone())?;
                    Ok(RetentionCriterion::new(self.attribute, cutoff))
                })
                .transpose()
        };
        RotationPolicy::new(resolve(self.compression)?, resolve(self.deletion)?, self.options)
    }
}

/// A validated rotation policy.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    compression: Option<RetentionCriterion>,
    deletion: Option<RetentionCriterion>,
    options: CompressOptions,
}

impl RotationPolicy {
    /// At least one criterion is required. With both, the compression cutoff must be
    /// strictly more recent than the deletion cutoff.
    pub fn new(
        compression: Option<RetentionCriterion>,
        deletion: Option<RetentionCriterion>,
        options: CompressOptions,
    ) -> Result<Self> {
        match (&compression, &deletion) {
            (None, None) => {
                return Err(RotateError::Validation(
                    "at least one of the compression or deletion thresholds is required".into(),
                ))
            }
            (Some(c), Some(d)) if c.cutoff <= d.cutoff => {
                return Err(RotateError::Validation(format!(
                    "compression cutoff ({}) must be more recent than deletion cutoff ({})",
                    c.cutoff, d.cutoff
                )))
            }
            _ => {}
        }
        Ok(Self { compression, deletion, options })
    }

    pub fn compression(&self) -> Option<&RetentionCriterion> {
        self.compression.as_ref()
    }

    pub fn deletion(&self) -> Option<&RetentionCriterion> {
        self.deletion.as_ref()
    }

    pub fn options(&self) -> &CompressOptions {
        &self.options
    }
}

/// Applies `policy` to every direct child of every root, in order.
///
/// Fails with [`RotateError::PathNotFound`] before mutating anything if any root cannot
/// be listed. Per-entry failures are collected in the returned [`Report`].
pub fn rotate(
    roots: &[PathBuf],
    policy: &RotationPolicy,
    lister: &dyn DirectoryLister,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
) -> Result<Report> {
    let listings = roots
        .iter()
        .map(|root| lister.list(root).map(|entries| (root, entries)))
        .collect::<Result<Vec<_>>>()?;

    let mut report = Report::default();
    for (root, entries) in listings {
        let _span = tracing::info_span!("rotate", root = %root.display()).entered();
        tracing::debug!(entries = entries.len(), "enumerated root");
        for entry in &entries {
            rotate_entry(entry, policy, mutator, gate, &mut report);
        }
    }
    Ok(report)
}

/// Delete, then compress whatever is left and eligible.
fn rotate_entry(
    entry: &Entry,
    policy: &RotationPolicy,
    mutator: &dyn Mutator,
    gate: &mut dyn ConfirmationGate,
    report: &mut Report,
) {
    if is_archive(&entry.path) {
        tracing::debug!(path = %entry.path.display(), "already an archive, skipping");
        return;
    }

    if let Some(criterion) = policy.deletion.as_ref().filter(|c| is_selected(entry, c)) {
        let outcome = delete_entry(entry, criterion, mutator, gate);
        // Only a failed deletion leaves the entry eligible for archiving.
        let failed = matches!(outcome, Outcome::Failed(_));
        outcome.record(report);
        if !failed {
            return;
        }
    }

    let Some(criterion) = policy.compression.as_ref().filter(|c| is_selected(entry, c)) else {
        return;
    };
    if !mutator.exists(&entry.path) {
        tracing::debug!(path = %entry.path.display(), "entry vanished before archiving, skipping");
        return;
    }
    compress_entry(entry, criterion, &policy.options, mutator, gate).record(report);
}

/// The cutoffs a policy resolved to, for logging.
pub fn describe(policy: &RotationPolicy) -> String {
    let show = |c: Option<&RetentionCriterion>| {
        c.map(|c| format!("{} <= {}", c.attribute, c.cutoff.to_rfc3339()))
            .unwrap_or_else(|| "off".into())
    };
    format!("compress: {}; delete: {}", show(policy.compression()), show(policy.deletion()))
}
