//! Simulated endpoint transport and fleet-file loading.
//!
//! Real deployments reach F-engines over an RPC transport that lives
//! outside this workspace. The simulator stands in for it so the full
//! polling pipeline can run on a bench with no hardware attached: each
//! entry in the fleet file becomes a deterministic endpoint whose timers
//! track wall-clock time, with optional per-endpoint failure injection.

use std::fs;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use fengwatch_core::clock::TIMER_TICK_HZ;
use fengwatch_core::{
    EndpointMap, EqCoeffs, InputStats, LaneParity, NUM_STREAMS, ParityStatus, RegisteredEndpoint,
    StaticProperties, StaticRegistry, TelemetryEndpoint, TimerSubsystem, TransportError,
};

/// Number of data lanes the simulator reports per endpoint.
const NUM_LANES: usize = 8;

/// Coefficients per stream in the simulated equalizer.
const COEFFS_PER_STREAM: usize = 16;

/// One endpoint entry in the fleet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetEntry {
    pub name: String,
    #[serde(flatten)]
    pub props: StaticProperties,
    /// Simulate a dead endpoint (every query times out).
    #[serde(default)]
    pub unreachable: bool,
    /// Seed for the endpoint's deterministic noise.
    #[serde(default)]
    pub seed: u64,
}

/// Load a fleet file: a JSON array of [`FleetEntry`].
pub fn load_fleet(path: &str) -> Result<Vec<FleetEntry>, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("cannot parse {path}: {e}"))
}

/// Build a registry of simulated endpoints from fleet entries.
pub fn build_registry(entries: &[FleetEntry]) -> StaticRegistry {
    let mut map = EndpointMap::new();
    for entry in entries {
        map.insert(
            entry.name.clone(),
            RegisteredEndpoint {
                handle: Arc::new(SimulatedEndpoint {
                    seed: entry.seed,
                    unreachable: entry.unreachable,
                }) as Arc<dyn TelemetryEndpoint>,
                props: entry.props.clone(),
            },
        );
    }
    StaticRegistry::new(map)
}

/// Deterministic stand-in for one F-engine.
pub struct SimulatedEndpoint {
    seed: u64,
    unreachable: bool,
}

/// Cheap xorshift mix of seed and salt into a unit-interval float.
fn noise(seed: u64, salt: u64) -> f64 {
    let mut x = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ salt.wrapping_add(1);
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    (x % 10_000) as f64 / 10_000.0
}

impl TelemetryEndpoint for SimulatedEndpoint {
    fn parity_status(&self) -> Result<ParityStatus, TransportError> {
        if self.unreachable {
            return Err(TransportError::Timeout);
        }
        let lane_errors = (0..NUM_LANES)
            .map(|lane| LaneParity {
                acc: (noise(self.seed, lane as u64) * 3.0) as u64,
                count: 4096,
            })
            .collect();
        Ok(ParityStatus {
            locked: true,
            synced: true,
            parity_ok: noise(self.seed, 100) > 0.1,
            lane_errors,
        })
    }

    fn input_stats(&self) -> Result<InputStats, TransportError> {
        if self.unreachable {
            return Err(TransportError::Timeout);
        }
        let per_stream = |salt: u64| {
            (0..NUM_STREAMS)
                .map(|s| noise(self.seed, salt + s as u64))
                .collect::<Vec<f64>>()
        };
        Ok(InputStats {
            means: per_stream(200),
            powers: per_stream(300).iter().map(|v| v * 40.0).collect(),
            rmss: per_stream(400).iter().map(|v| v * 8.0).collect(),
        })
    }

    fn equalization_coeffs(&self, _stream: usize) -> Result<EqCoeffs, TransportError> {
        if self.unreachable {
            return Err(TransportError::Timeout);
        }
        // Same flat coefficient set on every stream: a freshly-initialized
        // equalizer, so eq_identical_coeffs reads true.
        Ok(EqCoeffs {
            coeffs: vec![16.0; COEFFS_PER_STREAM],
            scale_factor: 16.0,
        })
    }

    fn timer_ticks(&self, subsystem: TimerSubsystem) -> Result<u64, TransportError> {
        if self.unreachable {
            return Err(TransportError::Timeout);
        }
        // Timers track wall clock with a small fixed per-subsystem skew,
        // well inside the mutual tolerance.
        let now_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        let skew_ms = noise(self.seed, subsystem as u64) * 40.0;
        Ok(((now_s + skew_ms / 1000.0) * TIMER_TICK_HZ) as u64)
    }
}
