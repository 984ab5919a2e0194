//! Endpoint registry: the current name → handle mapping.
//!
//! A snapshot is immutable for as long as the scheduler holds it. Refresh
//! replaces the whole map or fails — there is no partial refresh, and a
//! refresh failure is the one fatal error in the system (continuing with
//! no endpoint map is meaningless).

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::endpoint::{StaticProperties, TelemetryEndpoint};

/// Fatal registry failure. Propagated to the operator, never swallowed.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("endpoint discovery failed: {0}")]
    Discovery(String),
    #[error("discovery returned an empty endpoint map")]
    Empty,
}

/// One registered endpoint: the query handle plus its static installation
/// properties from the discovery source.
#[derive(Clone)]
pub struct RegisteredEndpoint {
    pub handle: Arc<dyn TelemetryEndpoint>,
    pub props: StaticProperties,
}

/// Immutable mapping from logical endpoint name to registered endpoint.
pub type EndpointMap = BTreeMap<String, RegisteredEndpoint>;

/// Source of the endpoint mapping.
///
/// `snapshot` hands out the current map; `refresh` runs discovery and
/// replaces it wholesale. The scheduler decides *when* to refresh — the
/// registry never refreshes on its own timer.
pub trait EndpointRegistry: Send {
    /// Current endpoint map. Cheap; returns a shared handle.
    fn snapshot(&self) -> Arc<EndpointMap>;

    /// Run discovery and fully replace the mapping.
    fn refresh(&mut self) -> Result<Arc<EndpointMap>, RegistryError>;
}

/// Registry over a fixed endpoint map. Used by the CLI (where discovery
/// happens once, from a fleet file) and by tests.
pub struct StaticRegistry {
    map: Arc<EndpointMap>,
    refreshes: u64,
}

impl StaticRegistry {
    pub fn new(map: EndpointMap) -> Self {
        Self {
            map: Arc::new(map),
            refreshes: 0,
        }
    }

    /// How many times `refresh` has been invoked.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}

impl EndpointRegistry for StaticRegistry {
    fn snapshot(&self) -> Arc<EndpointMap> {
        Arc::clone(&self.map)
    }

    fn refresh(&mut self) -> Result<Arc<EndpointMap>, RegistryError> {
        // Discovery is static here: rediscovery re-yields the same map.
        self.refreshes += 1;
        Ok(Arc::clone(&self.map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{
        EqCoeffs, InputStats, ParityStatus, TimerSubsystem, TransportError,
    };

    struct NullEndpoint;

    impl TelemetryEndpoint for NullEndpoint {
        fn parity_status(&self) -> Result<ParityStatus, TransportError> {
            Err(TransportError::Timeout)
        }
        fn input_stats(&self) -> Result<InputStats, TransportError> {
            Err(TransportError::Timeout)
        }
        fn equalization_coeffs(&self, _stream: usize) -> Result<EqCoeffs, TransportError> {
            Err(TransportError::Timeout)
        }
        fn timer_ticks(&self, _subsystem: TimerSubsystem) -> Result<u64, TransportError> {
            Err(TransportError::Timeout)
        }
    }

    fn props(pad: &str) -> StaticProperties {
        StaticProperties {
            server: "test".to_string(),
            pcie_id: 0,
            pipeline_id: 0,
            pad: pad.to_string(),
            x: None,
            y: None,
            z: None,
        }
    }

    #[test]
    fn test_static_registry_snapshot_is_shared() {
        let mut map = EndpointMap::new();
        map.insert(
            "ea01".to_string(),
            RegisteredEndpoint {
                handle: Arc::new(NullEndpoint),
                props: props("W01"),
            },
        );
        let registry = StaticRegistry::new(map);
        let a = registry.snapshot();
        let b = registry.snapshot();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_static_registry_refresh_counts() {
        let mut registry = StaticRegistry::new(EndpointMap::new());
        assert_eq!(registry.refresh_count(), 0);
        registry.refresh().unwrap();
        registry.refresh().unwrap();
        assert_eq!(registry.refresh_count(), 2);
    }

    #[test]
    fn test_registry_error_messages() {
        let e = RegistryError::Discovery("redis down".to_string());
        assert_eq!(e.to_string(), "endpoint discovery failed: redis down");
        assert_eq!(
            RegistryError::Empty.to_string(),
            "discovery returned an empty endpoint map"
        );
    }
}
