//! # fengwatch-core
//!
//! Polling-and-aggregation core for a fleet of F-engine telemetry
//! endpoints: query every registered endpoint on a fixed cadence, build
//! one status record per endpoint per cycle (failures isolated per
//! endpoint), and fan the result out to a latest-state hash sink and an
//! append-only time-series sink.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use fengwatch_core::{
//!     LogHeartbeat, PollScheduler, SchedulerConfig, StaticRegistry,
//!     MemoryLatestSink, MemoryPointSink,
//! };
//!
//! let registry = StaticRegistry::new(Default::default());
//! let mut scheduler = PollScheduler::new(registry, SchedulerConfig::default());
//! let mut latest = MemoryLatestSink::new();
//! let mut series = MemoryPointSink::new();
//! let running = AtomicBool::new(true);
//! scheduler.run(&mut latest, &mut series, &LogHeartbeat, &running).unwrap();
//! ```
//!
//! ## Architecture
//!
//! Registry → Collector → Clock check → Flattener → Publisher → Sinks
//!
//! One cycle runs to completion before the next begins; no two cycles
//! overlap. A transport failure marks only that endpoint `Unreachable`, a
//! sink failure is logged and absorbed, and only registry rediscovery
//! failure is fatal.

pub mod clock;
pub mod collector;
pub mod endpoint;
pub mod flatten;
pub mod publish;
pub mod registry;
pub mod scheduler;
pub mod sink;

#[cfg(test)]
pub(crate) mod testutil;

pub use clock::{ClockCheck, check_timers, check_timers_ms, ticks_to_ms};
pub use collector::{CycleResult, EndpointStatus, StatusRecord, run_cycle};
pub use endpoint::{
    EqCoeffs, InputStats, LaneParity, NUM_STREAMS, ParityStatus, StaticProperties,
    TelemetryEndpoint, TimerSubsystem, TransportError,
};
pub use flatten::{FieldValue, TimeSeriesPoint};
pub use publish::{PublishOutcome, publish};
pub use registry::{
    EndpointMap, EndpointRegistry, RegisteredEndpoint, RegistryError, StaticRegistry,
};
pub use scheduler::{
    Heartbeat, LogHeartbeat, PollScheduler, REDISCOVERY_CYCLES, SchedulerConfig, TickOutcome,
};
pub use sink::{
    JsonLatestSink, JsonlPointSink, LatestStateSink, MemoryLatestSink, MemoryPointSink,
    SinkError, TimeSeriesSink,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
