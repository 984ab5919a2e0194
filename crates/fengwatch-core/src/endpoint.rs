//! Telemetry endpoint contract and raw reply types.
//!
//! Every hardware endpoint is reached through the [`TelemetryEndpoint`]
//! trait — an opaque RPC handle whose transport (and its timeout) lives
//! outside this crate. Any call may fail with [`TransportError`]; the
//! collector turns such failures into per-endpoint `Unreachable` records
//! without touching the rest of the fleet.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of tuning streams each F-engine pipeline carries.
pub const NUM_STREAMS: usize = 4;

/// Failure while querying one endpoint. Scoped to that endpoint only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport-level timeout expired before a reply arrived.
    #[error("query timed out")]
    Timeout,
    /// The endpoint replied, but not in the expected protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The reply parsed but carried nonsense (wrong arity, NaN counts, ...).
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// The three independently-clocked hardware timer subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSubsystem {
    /// Data transmission system timer.
    Dts,
    /// Sample clock timer on the ADC board.
    Adc,
    /// PPS-disciplined timer.
    Pps,
}

impl TimerSubsystem {
    /// Query order used by the collector. Index 0 is the wall-clock reference.
    pub const ALL: [TimerSubsystem; 3] = [Self::Dts, Self::Adc, Self::Pps];
}

impl std::fmt::Display for TimerSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dts => write!(f, "dts"),
            Self::Adc => write!(f, "adc"),
            Self::Pps => write!(f, "pps"),
        }
    }
}

/// Parity error accumulator for one data lane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneParity {
    /// Accumulated parity error bits since reset.
    pub acc: u64,
    /// Number of words checked.
    pub count: u64,
}

/// Lock/sync/parity state of the digital transmission path.
#[derive(Debug, Clone, PartialEq)]
pub struct ParityStatus {
    /// Bit lock on the incoming serial stream.
    pub locked: bool,
    /// Frame sync achieved.
    pub synced: bool,
    /// No parity errors in the last check window.
    pub parity_ok: bool,
    /// Per-lane parity accumulators, one entry per data lane.
    pub lane_errors: Vec<LaneParity>,
}

/// Input statistics, one entry per tuning stream.
#[derive(Debug, Clone)]
pub struct InputStats {
    pub means: Vec<f64>,
    pub powers: Vec<f64>,
    pub rmss: Vec<f64>,
}

/// Equalization coefficients for one tuning stream.
#[derive(Debug, Clone)]
pub struct EqCoeffs {
    /// Raw coefficient vector as loaded into the hardware.
    pub coeffs: Vec<f64>,
    /// Fixed-point scale factor the hardware applies.
    pub scale_factor: f64,
}

/// Opaque handle for issuing telemetry queries against one endpoint.
///
/// The transport enforces its own timeout; callers see any failure mode
/// (timeout, protocol error, malformed reply) as a [`TransportError`].
pub trait TelemetryEndpoint: Send + Sync {
    /// Lock/sync/parity state plus per-lane parity accumulators.
    fn parity_status(&self) -> Result<ParityStatus, TransportError>;

    /// Per-stream input means, powers and RMS values.
    fn input_stats(&self) -> Result<InputStats, TransportError>;

    /// Equalization coefficients for one tuning stream.
    fn equalization_coeffs(&self, stream: usize) -> Result<EqCoeffs, TransportError>;

    /// Raw tick count of one hardware timer subsystem.
    fn timer_ticks(&self, subsystem: TimerSubsystem) -> Result<u64, TransportError>;
}

/// Static installation properties of one endpoint, keyed by logical name
/// in the discovery source.
///
/// Coordinates are optional: an endpoint with an unsurveyed pad simply has
/// no X/Y/Z yet, and displacement falls back to a sentinel instead of
/// failing the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticProperties {
    /// Host the pipeline runs on.
    pub server: String,
    /// PCIe slot identifier of the capture card.
    pub pcie_id: u32,
    /// Processing pipeline index on that host.
    pub pipeline_id: u32,
    /// Antenna pad identifier.
    pub pad: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}
