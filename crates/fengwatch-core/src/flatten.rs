//! Flattening of status records into the two persistence shapes.
//!
//! One `Ok` record expands two ways:
//! - a flat name → value map for the latest-state hash sink, booleans as
//!   0/1 integers and arrays as ordered float sequences;
//! - a set of discrete time-series points, one per scalar field plus one
//!   per array element with a `lane`/`stream` index tag.
//!
//! Both transformations are pure: flattening the same record twice yields
//! identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collector::EndpointStatus;
use crate::endpoint::{EqCoeffs, TimerSubsystem};

/// Measurement name shared by every time-series point.
pub const MEASUREMENT: &str = "fengine_status";

/// Displacement recorded when any pad coordinate is missing or invalid.
pub const DISPLACEMENT_SENTINEL: f64 = -1.0;

/// A value in the latest-state hash record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    FloatArray(Vec<f64>),
    Text(String),
}

impl FieldValue {
    /// Boolean persisted as a 0/1 integer.
    fn flag(value: bool) -> Self {
        Self::Int(i64::from(value))
    }
}

/// One append-only time-series point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub measurement: String,
    /// Tag dimensions, ordered by key.
    pub tags: BTreeMap<String, String>,
    pub field: String,
    pub value: f64,
    pub timestamp_ms: u64,
}

/// Euclidean norm of the pad coordinate, or the sentinel when any
/// component is missing or non-finite.
pub fn displacement(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> f64 {
    match (x, y, z) {
        (Some(x), Some(y), Some(z)) if x.is_finite() && y.is_finite() && z.is_finite() => {
            (x * x + y * y + z * z).sqrt()
        }
        _ => DISPLACEMENT_SENTINEL,
    }
}

/// Mean of one stream's scale-normalized coefficients.
pub fn mean_coeff(eq: &EqCoeffs) -> f64 {
    if eq.coeffs.is_empty() {
        return 0.0;
    }
    let scale = if eq.scale_factor != 0.0 {
        eq.scale_factor
    } else {
        1.0
    };
    eq.coeffs.iter().map(|c| c / scale).sum::<f64>() / eq.coeffs.len() as f64
}

/// True iff every stream's scale-normalized coefficient vector equals
/// stream 0's, elementwise and exactly, and stream 0's elements are all
/// non-zero. Empty coefficient sets are never "identical".
pub fn eq_identical(streams: &[EqCoeffs]) -> bool {
    let Some(first) = streams.first() else {
        return false;
    };
    if first.coeffs.is_empty() {
        return false;
    }

    let normalize = |eq: &EqCoeffs| -> Vec<f64> {
        let scale = if eq.scale_factor != 0.0 {
            eq.scale_factor
        } else {
            1.0
        };
        eq.coeffs.iter().map(|c| c / scale).collect()
    };

    let reference = normalize(first);
    if reference.iter().any(|c| *c == 0.0) {
        return false;
    }

    streams.iter().skip(1).all(|eq| normalize(eq) == reference)
}

/// Flat field map of one `Ok` record for the latest-state sink.
pub fn flat_fields(status: &EndpointStatus) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();

    fields.insert("status".to_string(), FieldValue::Text("OK".to_string()));

    fields.insert("lock_state".to_string(), FieldValue::flag(status.locked));
    fields.insert("sync_state".to_string(), FieldValue::flag(status.synced));
    fields.insert("parity_ok".to_string(), FieldValue::flag(status.parity_ok));
    fields.insert(
        "lane_parity_accs".to_string(),
        FieldValue::FloatArray(status.lane_parity_accs.clone()),
    );
    fields.insert(
        "lane_parity_counts".to_string(),
        FieldValue::FloatArray(status.lane_parity_counts.clone()),
    );

    fields.insert(
        "input_means".to_string(),
        FieldValue::FloatArray(status.input_means.clone()),
    );
    fields.insert(
        "input_powers".to_string(),
        FieldValue::FloatArray(status.input_powers.clone()),
    );
    fields.insert(
        "input_rmss".to_string(),
        FieldValue::FloatArray(status.input_rmss.clone()),
    );

    fields.insert(
        "eq_mean_coeffs".to_string(),
        FieldValue::FloatArray(status.eq_mean_coeffs.clone()),
    );
    fields.insert(
        "eq_identical_coeffs".to_string(),
        FieldValue::flag(status.eq_identical_coeffs),
    );

    for (subsystem, ms) in TimerSubsystem::ALL.iter().zip(status.timers_ms) {
        fields.insert(format!("timer_{subsystem}_ms"), FieldValue::Float(ms));
    }
    fields.insert(
        "timers_mutually_consistent".to_string(),
        FieldValue::flag(status.timers_mutually_consistent),
    );
    fields.insert(
        "time_correct".to_string(),
        FieldValue::flag(status.time_correct),
    );

    fields.insert(
        "server".to_string(),
        FieldValue::Text(status.server.clone()),
    );
    fields.insert(
        "pcie_id".to_string(),
        FieldValue::Int(i64::from(status.pcie_id)),
    );
    fields.insert(
        "pipeline_id".to_string(),
        FieldValue::Int(i64::from(status.pipeline_id)),
    );
    fields.insert("pad".to_string(), FieldValue::Text(status.pad.clone()));
    fields.insert(
        "displacement".to_string(),
        FieldValue::Float(status.displacement),
    );

    fields
}

/// Flat field map of an `Unreachable` record: a single plain-string status
/// field downstream consumers display directly.
pub fn unreachable_fields(reason: &str) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();
    fields.insert("status".to_string(), FieldValue::Text(reason.to_string()));
    fields
}

/// Expand one `Ok` record into time-series points. Every point carries the
/// endpoint tag and the shared cycle timestamp; array elements carry an
/// additional `lane` or `stream` index tag.
pub fn expand_points(
    endpoint: &str,
    status: &EndpointStatus,
    timestamp_ms: u64,
) -> Vec<TimeSeriesPoint> {
    let mut points = Vec::new();

    let scalar = |field: &str, value: f64| TimeSeriesPoint {
        measurement: MEASUREMENT.to_string(),
        tags: BTreeMap::from([("endpoint".to_string(), endpoint.to_string())]),
        field: field.to_string(),
        value,
        timestamp_ms,
    };
    let indexed = |field: &str, dim: &str, index: usize, value: f64| TimeSeriesPoint {
        measurement: MEASUREMENT.to_string(),
        tags: BTreeMap::from([
            ("endpoint".to_string(), endpoint.to_string()),
            (dim.to_string(), index.to_string()),
        ]),
        field: field.to_string(),
        value,
        timestamp_ms,
    };

    points.push(scalar("lock_state", f64::from(u8::from(status.locked))));
    points.push(scalar("sync_state", f64::from(u8::from(status.synced))));
    points.push(scalar("parity_ok", f64::from(u8::from(status.parity_ok))));

    for (i, acc) in status.lane_parity_accs.iter().enumerate() {
        points.push(indexed("lane_parity_acc", "lane", i, *acc));
    }
    for (i, count) in status.lane_parity_counts.iter().enumerate() {
        points.push(indexed("lane_parity_count", "lane", i, *count));
    }

    for (i, mean) in status.input_means.iter().enumerate() {
        points.push(indexed("input_mean", "stream", i, *mean));
    }
    for (i, power) in status.input_powers.iter().enumerate() {
        points.push(indexed("input_power", "stream", i, *power));
    }
    for (i, rms) in status.input_rmss.iter().enumerate() {
        points.push(indexed("input_rms", "stream", i, *rms));
    }

    for (i, coeff) in status.eq_mean_coeffs.iter().enumerate() {
        points.push(indexed("eq_mean_coeff", "stream", i, *coeff));
    }
    points.push(scalar(
        "eq_identical_coeffs",
        f64::from(u8::from(status.eq_identical_coeffs)),
    ));

    for (subsystem, ms) in TimerSubsystem::ALL.iter().zip(status.timers_ms) {
        points.push(scalar(&format!("timer_{subsystem}_ms"), ms));
    }
    points.push(scalar(
        "timers_mutually_consistent",
        f64::from(u8::from(status.timers_mutually_consistent)),
    ));
    points.push(scalar("time_correct", f64::from(u8::from(status.time_correct))));
    points.push(scalar("displacement", status.displacement));

    points
}
