//! Command-line runner: wires parsed arguments to the policy code, the real
//! filesystem and the confirmation gates, then prints the outcome.
//!
//! Result records go to stdout; failures and logs go to stderr.

use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

use crate::actions::{compress_old, remove_old, CompressOptions};
use crate::cli::{self, Commands, CommonArgs};
use crate::common::{ActionResult, Report};
use crate::confirm::{
    AutoApprove, ConfirmationGate, DryRun, Prompt, ROTATE_CONFIRMS_BY_DEFAULT,
    STANDALONE_CONFIRMS_BY_DEFAULT,
};
use crate::fsx::Fs;
use crate::rotate::{self, RotationSettings};
use crate::threshold::RetentionCriterion;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "ROTARCH_LOG";

/// Public entry for running CLI logic.
pub fn run_cli_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run();
    init_logging(args.verbose);

    let (common, report) = match args.command {
        Commands::Rotate {
            common,
            unit,
            compression,
            deletion,
            destination,
            keep_original,
            level,
            confirm,
        } => {
            let policy = RotationSettings {
                attribute: common.property,
                unit,
                compression,
                deletion,
                options: CompressOptions { destination, remove_after: !keep_original, level },
            }
            .into_policy()?;
            tracing::info!(policy = %rotate::describe(&policy), "rotating");

            let mut gate = gate_for(&common, confirm || ROTATE_CONFIRMS_BY_DEFAULT);
            let report = rotate::rotate(&common.paths, &policy, &Fs, &Fs, gate.as_mut())?;
            (common, report)
        }
        Commands::Remove { common, unit, cutoff, yes } => {
            let criterion = RetentionCriterion::resolve(common.property, &cutoff.threshold(unit)?)?;
            tracing::info!(
                cutoff = %criterion.cutoff,
                attribute = %criterion.attribute,
                "removing"
            );

            let mut gate = gate_for(&common, !yes && STANDALONE_CONFIRMS_BY_DEFAULT);
            let report = remove_old(&common.paths, &criterion, &Fs, &Fs, gate.as_mut());
            (common, report)
        }
        Commands::Compress { common, unit, cutoff, destination, remove_after, level, yes } => {
            let criterion = RetentionCriterion::resolve(common.property, &cutoff.threshold(unit)?)?;
            tracing::info!(
                cutoff = %criterion.cutoff,
                attribute = %criterion.attribute,
                "compressing"
            );

            let options = CompressOptions { destination, remove_after, level };
            let mut gate = gate_for(&common, !yes && STANDALONE_CONFIRMS_BY_DEFAULT);
            let report = compress_old(&common.paths, &criterion, &options, &Fs, &Fs, gate.as_mut());
            (common, report)
        }
    };

    print_report(&report, common.json)?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn gate_for(common: &CommonArgs, confirm: bool) -> Box<dyn ConfirmationGate> {
    if common.dry_run {
        Box::new(DryRun)
    } else if confirm {
        Box::new(Prompt::stdio())
    } else {
        Box::new(AutoApprove)
    }
}

fn print_report(report: &Report, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for result in &report.results {
        if json {
            serde_json::to_writer(&mut out, result)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_row(result))?;
        }
    }
    out.flush()?;

    for failure in &report.failures {
        eprintln!("Error: {}", failure);
    }
    Ok(())
}

fn format_row(r: &ActionResult) -> String {
    let mut row = format!(
        "{:<8} {:<12} {:<14} {} {}",
        r.action,
        r.kind,
        r.attribute,
        r.value.format("%Y-%m-%d %H:%M:%S"),
        r.path.display()
    );
    if let Some(archive) = &r.archive {
        row.push_str(&format!(" -> {}", archive.display()));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::at;
    use crate::common::{Action, EntryKind, TimeAttribute};
    use std::path::PathBuf;

    #[test]
    fn table_row_shows_archive_destination() {
        let r = ActionResult {
            path: PathBuf::from("/logs/a.log"),
            kind: EntryKind::File,
            size: 3,
            attribute: TimeAttribute::LastWriteTime,
            value: at(2023, 5, 6),
            cutoff: at(2024, 1, 1),
            action: Action::Compress,
            archive: Some(PathBuf::from("/logs/a.zip")),
        };
        let row = format_row(&r);
        assert!(row.starts_with("Compress File"));
        assert!(row.contains("2023-05-06 00:00:00 /logs/a.log -> /logs/a.zip"));
    }
}
