//! Per-cycle status collection with per-endpoint failure isolation.
//!
//! One cycle queries every registered endpoint in turn. Any transport
//! failure anywhere in an endpoint's query sequence makes *that* endpoint
//! `Unreachable` for the cycle and moves on — a flaky endpoint never
//! aborts the cycle or disturbs another endpoint's record. Failed polls
//! are not retried within the cycle; they get another chance next cycle.

use std::collections::BTreeMap;

use log::warn;

use crate::clock;
use crate::endpoint::{NUM_STREAMS, TimerSubsystem, TransportError};
use crate::flatten;
use crate::registry::{EndpointMap, RegisteredEndpoint};

/// Fully-typed status of one successfully-polled endpoint for one cycle.
///
/// Booleans stay booleans here; the flattener turns them into 0/1 integers
/// on the way to the sinks.
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    // Transmission path state
    pub locked: bool,
    pub synced: bool,
    pub parity_ok: bool,
    pub lane_parity_accs: Vec<f64>,
    pub lane_parity_counts: Vec<f64>,

    // Input statistics, one entry per tuning stream
    pub input_means: Vec<f64>,
    pub input_powers: Vec<f64>,
    pub input_rmss: Vec<f64>,

    // Equalization
    pub eq_mean_coeffs: Vec<f64>,
    pub eq_identical_coeffs: bool,

    // Clock checks
    pub timers_ms: [f64; 3],
    pub timers_mutually_consistent: bool,
    pub time_correct: bool,

    // Static installation properties
    pub server: String,
    pub pcie_id: u32,
    pub pipeline_id: u32,
    pub pad: String,
    /// Euclidean norm of the pad coordinate, or the sentinel −1.0 when any
    /// coordinate is missing.
    pub displacement: f64,
}

/// Result of one poll of one endpoint.
#[derive(Debug, Clone)]
pub enum StatusRecord {
    Ok(EndpointStatus),
    Unreachable { reason: String },
}

impl StatusRecord {
    pub fn is_ok(&self) -> bool {
        matches!(self, StatusRecord::Ok(_))
    }
}

/// All records for one cycle, plus the derived unreachable-name list.
///
/// Invariant: `records.len()` equals the size of the endpoint map the
/// cycle ran against — no endpoint is silently dropped.
#[derive(Debug, Clone, Default)]
pub struct CycleResult {
    pub records: BTreeMap<String, StatusRecord>,
    pub unreachable: Vec<String>,
}

impl CycleResult {
    pub fn ok_count(&self) -> usize {
        self.records.len() - self.unreachable.len()
    }
}

/// Poll every endpoint in the map once, producing exactly one record per
/// endpoint. `wall_clock_unix_s` is the wall-clock reading the clock check
/// compares the reference timer against.
pub fn run_cycle(map: &EndpointMap, wall_clock_unix_s: f64) -> CycleResult {
    let mut records = BTreeMap::new();
    let mut unreachable = Vec::new();

    for (name, endpoint) in map {
        match poll_endpoint(endpoint, wall_clock_unix_s) {
            Ok(status) => {
                records.insert(name.clone(), StatusRecord::Ok(status));
            }
            Err(e) => {
                warn!("endpoint {name} unreachable: {e}");
                unreachable.push(name.clone());
                records.insert(
                    name.clone(),
                    StatusRecord::Unreachable {
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    CycleResult {
        records,
        unreachable,
    }
}

/// Query one endpoint's full telemetry set and normalize it.
fn poll_endpoint(
    endpoint: &RegisteredEndpoint,
    wall_clock_unix_s: f64,
) -> Result<EndpointStatus, TransportError> {
    let parity = endpoint.handle.parity_status()?;
    let input = endpoint.handle.input_stats()?;

    let mut eq = Vec::with_capacity(NUM_STREAMS);
    for stream in 0..NUM_STREAMS {
        eq.push(endpoint.handle.equalization_coeffs(stream)?);
    }

    let mut ticks = [0u64; 3];
    for (slot, subsystem) in ticks.iter_mut().zip(TimerSubsystem::ALL) {
        *slot = endpoint.handle.timer_ticks(subsystem)?;
    }
    let check = clock::check_timers(ticks, wall_clock_unix_s);

    let props = &endpoint.props;
    Ok(EndpointStatus {
        locked: parity.locked,
        synced: parity.synced,
        parity_ok: parity.parity_ok,
        lane_parity_accs: parity.lane_errors.iter().map(|l| l.acc as f64).collect(),
        lane_parity_counts: parity.lane_errors.iter().map(|l| l.count as f64).collect(),
        input_means: input.means,
        input_powers: input.powers,
        input_rmss: input.rmss,
        eq_mean_coeffs: eq.iter().map(flatten::mean_coeff).collect(),
        eq_identical_coeffs: flatten::eq_identical(&eq),
        timers_ms: check.timers_ms,
        timers_mutually_consistent: check.mutually_consistent,
        time_correct: check.time_correct,
        server: props.server.clone(),
        pcie_id: props.pcie_id,
        pipeline_id: props.pipeline_id,
        pad: props.pad.clone(),
        displacement: flatten::displacement(props.x, props.y, props.z),
    })
}
