//! # Rotarch Core Library
//!
//! Age-based retention for directories that grow without bound (logs, build output,
//! exports). Each direct child of a root is judged by one of its timestamps and then
//! either deleted, archived into its own zip file, or left alone.
//!
//! ## Key Modules
//!
//! - [`threshold`]: turns "N units ago" or a literal timestamp into a cutoff instant.
//! - [`classify`] and [`select`]: classify entries and pick those at or before a cutoff.
//! - [`actions`]: the deletion and archival actions, with per-entry failure isolation.
//! - [`rotate`]: the combined delete-then-compress policy.
//! - [`fsx`]: the filesystem collaborators the policy runs against.
//! - [`archive`]: single-entry zip archives.
//!
//! ## Examples
//!
//! ```no_run
//! use rotarch::actions::CompressOptions;
//! use rotarch::common::TimeAttribute;
//! use rotarch::confirm::AutoApprove;
//! use rotarch::fsx::Fs;
//! use rotarch::rotate::{rotate, RotationSettings};
//! use rotarch::threshold::TimeUnit;
//!
//! let policy = RotationSettings {
//!     attribute: TimeAttribute::LastWriteTime,
//!     unit: TimeUnit::Month,
//!     compression: Some(6),
//!     deletion: Some(9),
//!     options: CompressOptions { remove_after: true, ..CompressOptions::default() },
//! }
//! .into_policy()?;
//! let report = rotate(&["/var/log/myapp".into()], &policy, &Fs, &Fs, &mut AutoApprove)?;
//! for failure in &report.failures {
//!     eprintln!("{failure}");
//! }
//! # Ok::<(), rotarch::RotateError>(())
//! ```

pub mod actions;
pub mod archive;
pub mod classify;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod confirm;
pub mod error;
pub use error::RotateError;

// Filesystem collaborators
pub mod fsx;

pub mod rotate;
pub mod select;
pub mod threshold;
