//! Subcommand implementations.

pub mod once;
pub mod run;

use std::process;

use fengwatch_core::StaticRegistry;

use crate::sim;

/// Load the fleet file and build a simulated registry, or exit.
fn load_registry(fleet_path: &str) -> StaticRegistry {
    let entries = match sim::load_fleet(fleet_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    if entries.is_empty() {
        eprintln!("Error: fleet file {fleet_path} lists no endpoints");
        process::exit(1);
    }
    sim::build_registry(&entries)
}
