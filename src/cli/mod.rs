use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::archive::CompressionLevel;
use crate::common::TimeAttribute;
use crate::error::{Result, RotateError};
use crate::threshold::{parse_timestamp, Threshold, TimeUnit};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `ROTARCH_LOG` overrides it.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(ClapArgs, Clone, Debug)]
pub struct CommonArgs {
    /// One or more directories whose direct children are examined.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Which timestamp decides an entry's age.
    #[arg(long, value_enum, default_value_t = TimeAttribute::CreationTime)]
    pub property: TimeAttribute,

    /// Print one JSON object per processed entry instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Report what would be done without touching anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Cutoff for the standalone commands: relative age or fixed instant.
#[derive(ClapArgs, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct CutoffArgs {
    /// Act on entries at least this many units old.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub older_than: Option<u32>,

    /// Act on entries at or before this timestamp.
    /// Accepts RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD' (local time).
    #[arg(long, value_name = "TIMESTAMP")]
    pub before: Option<String>,
}

impl CutoffArgs {
    pub fn threshold(&self, unit: TimeUnit) -> Result<Threshold> {
        match (&self.older_than, &self.before) {
            (_, Some(ts)) => Ok(Threshold::At(parse_timestamp(ts)?)),
            (Some(magnitude), None) => Ok(Threshold::Ago { unit, magnitude: *magnitude }),
            (None, None) => Err(RotateError::Validation(
                "either --older-than or --before is required".into(),
            )),
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Delete entries past the deletion age and archive entries past the compression age.
    #[command(alias = "r")]
    Rotate {
        #[command(flatten)]
        common: CommonArgs,

        /// Unit for --compression and --deletion.
        #[arg(long, value_enum, default_value_t = TimeUnit::Month)]
        unit: TimeUnit,

        /// Archive entries at least this many units old.
        #[arg(long, value_name = "N")]
        compression: Option<u32>,

        /// Delete entries at least this many units old. Must be older than --compression.
        #[arg(long, value_name = "N")]
        deletion: Option<u32>,

        /// Directory receiving the archives. Defaults to each entry's own directory.
        #[arg(long, value_name = "DIR")]
        destination: Option<PathBuf>,

        /// Keep originals next to their archives.
        #[arg(long)]
        keep_original: bool,

        #[arg(long, value_enum, default_value_t = CompressionLevel::Optimal)]
        level: CompressionLevel,

        /// Ask before every deletion and archive.
        #[arg(long)]
        confirm: bool,
    },

    /// Permanently delete old entries.
    #[command(alias = "rm")]
    Remove {
        #[command(flatten)]
        common: CommonArgs,

        /// Unit for --older-than.
        #[arg(long, value_enum, default_value_t = TimeUnit::Month)]
        unit: TimeUnit,

        #[command(flatten)]
        cutoff: CutoffArgs,

        /// Do not ask before each deletion.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Archive old entries, one zip per entry.
    #[command(alias = "c")]
    Compress {
        #[command(flatten)]
        common: CommonArgs,

        /// Unit for --older-than.
        #[arg(long, value_enum, default_value_t = TimeUnit::Month)]
        unit: TimeUnit,

        #[command(flatten)]
        cutoff: CutoffArgs,

        /// Directory receiving the archives. Defaults to each entry's own directory.
        #[arg(long, value_name = "DIR")]
        destination: Option<PathBuf>,

        /// Delete each original once its archive is written.
        #[arg(long)]
        remove_after: bool,

        #[arg(long, value_enum, default_value_t = CompressionLevel::Optimal)]
        level: CompressionLevel,

        /// Do not ask before each archive.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Args {
    Args::parse()
}
