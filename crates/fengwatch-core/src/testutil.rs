//! Shared mock endpoints for unit tests.

use std::sync::Arc;

use crate::endpoint::{
    EqCoeffs, InputStats, LaneParity, ParityStatus, StaticProperties, TelemetryEndpoint,
    TimerSubsystem, TransportError,
};
use crate::registry::{EndpointMap, RegisteredEndpoint};

/// Deterministic healthy endpoint. All timers read exactly one second.
#[derive(Default)]
pub struct MockEndpoint;

impl TelemetryEndpoint for MockEndpoint {
    fn parity_status(&self) -> Result<ParityStatus, TransportError> {
        Ok(ParityStatus {
            locked: true,
            synced: true,
            parity_ok: true,
            lane_errors: vec![
                LaneParity { acc: 0, count: 4096 },
                LaneParity { acc: 2, count: 4096 },
            ],
        })
    }

    fn input_stats(&self) -> Result<InputStats, TransportError> {
        Ok(InputStats {
            means: vec![0.1, 0.2, 0.3, 0.4],
            powers: vec![10.0, 20.0, 30.0, 40.0],
            rmss: vec![1.0, 2.0, 3.0, 4.0],
        })
    }

    fn equalization_coeffs(&self, _stream: usize) -> Result<EqCoeffs, TransportError> {
        Ok(EqCoeffs {
            coeffs: vec![8.0, 8.0, 8.0, 8.0],
            scale_factor: 8.0,
        })
    }

    fn timer_ticks(&self, _subsystem: TimerSubsystem) -> Result<u64, TransportError> {
        Ok(256_000_000)
    }
}

/// Endpoint that fails at a chosen point in the query sequence.
pub struct FlakyEndpoint {
    fail_parity: bool,
    fail_input: bool,
}

impl FlakyEndpoint {
    /// Fails the very first query with a timeout.
    pub fn timeout() -> Self {
        Self {
            fail_parity: true,
            fail_input: false,
        }
    }

    /// Parity succeeds, input statistics fail.
    pub fn fail_input_stats() -> Self {
        Self {
            fail_parity: false,
            fail_input: true,
        }
    }
}

impl TelemetryEndpoint for FlakyEndpoint {
    fn parity_status(&self) -> Result<ParityStatus, TransportError> {
        if self.fail_parity {
            return Err(TransportError::Timeout);
        }
        MockEndpoint.parity_status()
    }

    fn input_stats(&self) -> Result<InputStats, TransportError> {
        if self.fail_input {
            return Err(TransportError::Protocol("truncated frame".to_string()));
        }
        MockEndpoint.input_stats()
    }

    fn equalization_coeffs(&self, stream: usize) -> Result<EqCoeffs, TransportError> {
        MockEndpoint.equalization_coeffs(stream)
    }

    fn timer_ticks(&self, subsystem: TimerSubsystem) -> Result<u64, TransportError> {
        MockEndpoint.timer_ticks(subsystem)
    }
}

/// Static properties for a surveyed (or unsurveyed) pad.
pub fn props_at(pad: &str, xyz: Option<(f64, f64, f64)>) -> StaticProperties {
    StaticProperties {
        server: "cosmic-gpu-1".to_string(),
        pcie_id: 1,
        pipeline_id: 0,
        pad: pad.to_string(),
        x: xyz.map(|c| c.0),
        y: xyz.map(|c| c.1),
        z: xyz.map(|c| c.2),
    }
}

/// A fleet of healthy mock endpoints, one per name.
pub fn fleet_of(names: &[&str]) -> EndpointMap {
    names
        .iter()
        .map(|name| {
            (
                (*name).to_string(),
                RegisteredEndpoint {
                    handle: Arc::new(MockEndpoint) as Arc<dyn TelemetryEndpoint>,
                    props: props_at("W01", Some((1.0, 2.0, 2.0))),
                },
            )
        })
        .collect()
}
