//! Fixed-cadence poll scheduler with sustained-failure rediscovery.
//!
//! Single state: running. Each tick is either one full collect→publish
//! cycle or — after sustained endpoint failure — one registry rediscovery
//! that replaces the endpoint map wholesale. The loop sleeps for whatever
//! remains of the interval after the cycle's own cost, never a negative
//! duration; cycles that overrun the interval simply stretch the period,
//! which is accepted degradation rather than a bug.
//!
//! Only a registry refresh failure propagates out of the loop. Everything
//! else (endpoint failures, sink failures) is absorbed per cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::collector;
use crate::publish::{self, PublishOutcome};
use crate::registry::{EndpointMap, EndpointRegistry, RegistryError};
use crate::sink::{LatestStateSink, TimeSeriesSink};

/// Number of cycles with sustained failure before rediscovery triggers.
pub const REDISCOVERY_CYCLES: u64 = 20;

/// Liveness collaborator pinged once per tick.
pub trait Heartbeat {
    fn heartbeat(&self, service: &str);
}

/// Heartbeat that just logs at debug level.
pub struct LogHeartbeat;

impl Heartbeat for LogHeartbeat {
    fn heartbeat(&self, service: &str) {
        debug!("{service} heartbeat");
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Target polling period.
    pub interval: Duration,
    /// Name reported to the liveness collaborator.
    pub service_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            service_name: "fengwatch".to_string(),
        }
    }
}

/// What one scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A full collect→publish cycle ran.
    Polled {
        cycle: u64,
        ok: usize,
        unreachable: usize,
        publish: PublishOutcome,
    },
    /// The endpoint map was rediscovered instead of polling.
    Refreshed { endpoints: usize },
}

/// The polling scheduler. Owns the registry snapshot, the monotonic cycle
/// counter and the rolling unreachable count — the only state crossing
/// cycle boundaries.
pub struct PollScheduler<R: EndpointRegistry> {
    registry: R,
    snapshot: Arc<EndpointMap>,
    config: SchedulerConfig,
    cycle_count: u64,
    cycles_since_refresh: u64,
    last_unreachable: usize,
}

impl<R: EndpointRegistry> PollScheduler<R> {
    pub fn new(registry: R, config: SchedulerConfig) -> Self {
        let snapshot = registry.snapshot();
        Self {
            registry,
            snapshot,
            config,
            cycle_count: 0,
            cycles_since_refresh: 0,
            last_unreachable: 0,
        }
    }

    /// Monotonic count of completed poll cycles.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Current endpoint map snapshot.
    pub fn snapshot(&self) -> &Arc<EndpointMap> {
        &self.snapshot
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// One scheduler tick with an injected wall clock, for testability.
    /// `wall_clock_unix_s` feeds the clock-consistency check;
    /// `timestamp_ms` is the shared capture timestamp for the cycle's
    /// points.
    pub fn tick(
        &mut self,
        latest: &mut dyn LatestStateSink,
        series: &mut dyn TimeSeriesSink,
        heartbeat: &dyn Heartbeat,
        wall_clock_unix_s: f64,
        timestamp_ms: u64,
    ) -> Result<TickOutcome, RegistryError> {
        heartbeat.heartbeat(&self.config.service_name);

        if self.last_unreachable > 0 && self.cycles_since_refresh >= REDISCOVERY_CYCLES {
            self.snapshot = self.registry.refresh()?;
            self.cycles_since_refresh = 0;
            self.last_unreachable = 0;
            info!(
                "rediscovered endpoint map after sustained failure: {} endpoints",
                self.snapshot.len()
            );
            return Ok(TickOutcome::Refreshed {
                endpoints: self.snapshot.len(),
            });
        }

        let cycle = collector::run_cycle(&self.snapshot, wall_clock_unix_s);
        let outcome = publish::publish(&cycle, latest, series, timestamp_ms);

        self.cycle_count += 1;
        self.cycles_since_refresh += 1;
        self.last_unreachable = cycle.unreachable.len();

        let ok = cycle.ok_count();
        info!(
            "cycle {}: {} ok, {} unreachable, {} points (latest {}, series {})",
            self.cycle_count,
            ok,
            cycle.unreachable.len(),
            outcome.points,
            if outcome.latest_ok { "ok" } else { "FAILED" },
            if outcome.series_ok { "ok" } else { "FAILED" },
        );

        Ok(TickOutcome::Polled {
            cycle: self.cycle_count,
            ok,
            unreachable: cycle.unreachable.len(),
            publish: outcome,
        })
    }

    /// Run ticks until `running` is cleared, keeping an approximately
    /// fixed cadence. Propagates only registry refresh failure.
    pub fn run(
        &mut self,
        latest: &mut dyn LatestStateSink,
        series: &mut dyn TimeSeriesSink,
        heartbeat: &dyn Heartbeat,
        running: &AtomicBool,
    ) -> Result<(), RegistryError> {
        while running.load(Ordering::SeqCst) {
            let started = Instant::now();
            let (wall_s, ts_ms) = wall_clock_now();
            self.tick(latest, series, heartbeat, wall_s, ts_ms)?;

            let sleep = remaining_sleep(self.config.interval, started.elapsed());
            let deadline = Instant::now() + sleep;
            // Sleep in short slices so a stop request lands promptly.
            while Instant::now() < deadline && running.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(10));
            }
        }
        Ok(())
    }
}

/// How long to sleep after a cycle: `max(0, interval − duration)`.
pub fn remaining_sleep(interval: Duration, cycle_duration: Duration) -> Duration {
    interval.saturating_sub(cycle_duration)
}

fn wall_clock_now() -> (f64, u64) {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (since_epoch.as_secs_f64(), since_epoch.as_millis() as u64)
}
