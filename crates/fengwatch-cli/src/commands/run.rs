//! `fengwatch run`: poll the fleet until interrupted.

use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fengwatch_core::{
    EndpointRegistry, JsonLatestSink, JsonlPointSink, LogHeartbeat, PollScheduler, SchedulerConfig,
};
use log::info;
use uuid::Uuid;

pub fn execute(fleet_path: &str, interval_secs: u64, out_dir: &str, clean_start: bool) {
    let registry = super::load_registry(fleet_path);
    let endpoints = registry.snapshot().len();

    let out = Path::new(out_dir);
    if let Err(e) = fs::create_dir_all(out) {
        eprintln!("Error: cannot create {out_dir}: {e}");
        process::exit(1);
    }
    let mut latest = match JsonLatestSink::create(&out.join("latest.json"), clean_start) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error: cannot open latest-state sink: {e}");
            process::exit(1);
        }
    };
    let mut series = match JsonlPointSink::create(&out.join("points.jsonl"), clean_start) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Error: cannot open time-series sink: {e}");
            process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
        eprintln!("\nStopping after the current cycle...");
    }) {
        eprintln!("Error: cannot install Ctrl-C handler: {e}");
        process::exit(1);
    }

    let run_id = Uuid::new_v4();
    info!(
        "fengwatch {} run {run_id}: {endpoints} endpoints, {interval_secs}s interval, sinks in {out_dir}",
        fengwatch_core::VERSION
    );

    let config = SchedulerConfig {
        interval: Duration::from_secs(interval_secs),
        ..SchedulerConfig::default()
    };
    let mut scheduler = PollScheduler::new(registry, config);
    if let Err(e) = scheduler.run(&mut latest, &mut series, &LogHeartbeat, &running) {
        eprintln!("Fatal: {e}");
        process::exit(1);
    }
    info!("run {run_id} stopped after {} cycles", scheduler.cycle_count());
}
