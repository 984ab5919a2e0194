//! Dual-sink publishing with isolated failure handling.
//!
//! One cycle produces one latest-state overwrite per endpoint (unreachable
//! endpoints included, as plain status strings) and one batched point
//! write covering every `Ok` record. The two sinks are always attempted
//! independently: a failure in either is logged and reported in the
//! outcome, never raised, so the scheduler keeps its cadence.

use log::warn;

use crate::collector::{CycleResult, StatusRecord};
use crate::flatten::{self, TimeSeriesPoint};
use crate::sink::{LatestStateSink, TimeSeriesSink};

/// What happened to each sink during one publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Every latest-state write succeeded.
    pub latest_ok: bool,
    /// The batched time-series write succeeded.
    pub series_ok: bool,
    /// Number of points in the batch (written or attempted).
    pub points: usize,
}

/// Publish one cycle to both sinks. All points share `timestamp_ms`, the
/// capture timestamp of the cycle.
pub fn publish(
    cycle: &CycleResult,
    latest: &mut dyn LatestStateSink,
    series: &mut dyn TimeSeriesSink,
    timestamp_ms: u64,
) -> PublishOutcome {
    let mut latest_ok = true;
    for (name, record) in &cycle.records {
        let fields = match record {
            StatusRecord::Ok(status) => flatten::flat_fields(status),
            StatusRecord::Unreachable { reason } => flatten::unreachable_fields(reason),
        };
        if let Err(e) = latest.write_hash(name, &fields) {
            warn!("latest-state write failed for {name}: {e}");
            latest_ok = false;
        }
    }

    let mut batch: Vec<TimeSeriesPoint> = Vec::new();
    for (name, record) in &cycle.records {
        if let StatusRecord::Ok(status) = record {
            batch.extend(flatten::expand_points(name, status, timestamp_ms));
        }
    }

    let series_ok = match series.write_points(&batch) {
        Ok(()) => true,
        Err(e) => {
            warn!("time-series write failed ({} points): {e}", batch.len());
            false
        }
    };

    PublishOutcome {
        latest_ok,
        series_ok,
        points: batch.len(),
    }
}
