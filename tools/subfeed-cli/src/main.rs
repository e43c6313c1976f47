//! Subfeed CLI — drive the subtitle delivery engine from the command line.
//!
//! Usage:
//!   subfeed run [OPTIONS] <EVENTS>   Feed a JSONL event file through the engine
//!   subfeed inspect <EVENTS>         Report timing anomalies in an event file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "subfeed",
    about = "Subtitle event timing and delivery",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed an event file through the delivery engine
    Run {
        /// Path to the JSONL event file
        events: PathBuf,

        /// Delivery mode: repeat|scatter|forward
        #[arg(long, default_value = "repeat")]
        mode: String,

        /// Output cadence interval in milliseconds (0 = default)
        #[arg(long, default_value = "200")]
        cadence_ms: i64,

        /// Disable duration inference from the following event
        #[arg(long)]
        no_fix_durations: bool,

        /// Drop stale out-of-order events and trim overlaps
        #[arg(long)]
        fix_overlap: bool,

        /// Durations at or above this are treated as unknown (ms)
        #[arg(long, default_value = "29000")]
        threshold_ms: i64,

        /// Emit frames as JSON, one object per line
        #[arg(long)]
        json: bool,
    },

    /// Report timing anomalies in an event file
    Inspect {
        /// Path to the JSONL event file
        events: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    subfeed_common::logging::init_logging(&subfeed_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Run {
            events,
            mode,
            cadence_ms,
            no_fix_durations,
            fix_overlap,
            threshold_ms,
            json,
        } => commands::run::run(
            events,
            mode,
            cadence_ms,
            !no_fix_durations,
            fix_overlap,
            threshold_ms,
            json,
        ),
        Commands::Inspect { events } => commands::inspect::run(events),
    }
}
