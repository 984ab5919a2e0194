//! `fengwatch once`: a single diagnostic cycle, printed to stdout.

use std::collections::BTreeMap;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use fengwatch_core::flatten::{flat_fields, unreachable_fields};
use fengwatch_core::{EndpointRegistry, FieldValue, StatusRecord, run_cycle};

pub fn execute(fleet_path: &str, json: bool) {
    let registry = super::load_registry(fleet_path);
    let snapshot = registry.snapshot();
    let wall_s = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    let cycle = run_cycle(&snapshot, wall_s);

    if json {
        let mut flat: BTreeMap<&String, BTreeMap<String, FieldValue>> = BTreeMap::new();
        for (name, record) in &cycle.records {
            let fields = match record {
                StatusRecord::Ok(status) => flat_fields(status),
                StatusRecord::Unreachable { reason } => unreachable_fields(reason),
            };
            flat.insert(name, fields);
        }
        match serde_json::to_string_pretty(&flat) {
            Ok(doc) => println!("{doc}"),
            Err(e) => {
                eprintln!("Error: cannot serialize cycle: {e}");
                process::exit(1);
            }
        }
        return;
    }

    println!(
        "{:<10} {:<6} {:<6} {:<8} {:<8} {:>12}  {}",
        "ENDPOINT", "LOCK", "SYNC", "PARITY", "CLOCK", "DISPLACEMENT", "STATUS"
    );
    for (name, record) in &cycle.records {
        match record {
            StatusRecord::Ok(status) => {
                println!(
                    "{:<10} {:<6} {:<6} {:<8} {:<8} {:>12.3}  OK",
                    name,
                    yes_no(status.locked),
                    yes_no(status.synced),
                    yes_no(status.parity_ok),
                    yes_no(status.time_correct),
                    status.displacement,
                );
            }
            StatusRecord::Unreachable { reason } => {
                println!(
                    "{:<10} {:<6} {:<6} {:<8} {:<8} {:>12}  {reason}",
                    name, "-", "-", "-", "-", "-"
                );
            }
        }
    }
    println!(
        "\n{} of {} endpoints reachable",
        cycle.ok_count(),
        cycle.records.len()
    );

    if !cycle.unreachable.is_empty() {
        process::exit(2);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
