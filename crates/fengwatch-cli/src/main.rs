//! fengwatch command-line interface.
//!
//! `fengwatch run` polls a fleet of simulated F-engines on a fixed cadence
//! and persists status to file-backed sinks; `fengwatch once` runs a single
//! diagnostic cycle and prints it.

mod commands;
mod sim;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fengwatch")]
#[command(version = fengwatch_core::VERSION)]
#[command(about = "Poll an F-engine fleet and persist its status")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the fleet on a fixed cadence until interrupted
    Run {
        /// Fleet file: JSON array of endpoints and their static properties
        #[arg(long)]
        fleet: String,

        /// Polling interval in seconds
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,

        /// Directory for the persisted sink files
        #[arg(long, default_value = "data")]
        out: String,

        /// Discard previously persisted state instead of resuming it
        #[arg(long)]
        clean_start: bool,
    },

    /// Run one diagnostic cycle and print the result
    Once {
        /// Fleet file: JSON array of endpoints and their static properties
        #[arg(long)]
        fleet: String,

        /// Print flat records as JSON instead of a summary table
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            fleet,
            interval,
            out,
            clean_start,
        } => commands::run::execute(&fleet, interval, &out, clean_start),
        Commands::Once { fleet, json } => commands::once::execute(&fleet, json),
    }
}
