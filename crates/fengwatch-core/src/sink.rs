//! Persistence sink contracts and reference implementations.
//!
//! Two independent sinks: a latest-state store holding one hash record per
//! endpoint (overwritten every cycle) and an append-only time-series store
//! taking batched point writes. Sink failures are never fatal — the
//! publisher logs them and the cycle continues.
//!
//! The file-backed implementations here exist for the CLI and for local
//! inspection; production deployments plug real backends in behind the
//! same traits.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::flatten::{FieldValue, TimeSeriesPoint};

/// Failure writing to one sink. Logged by the publisher, not raised.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("sink backend error: {0}")]
    Backend(String),
}

/// Latest-state store: one hash record per key, fully overwritten on write.
pub trait LatestStateSink {
    fn write_hash(
        &mut self,
        key: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<(), SinkError>;
}

/// Append-only time-series store taking one batched write per cycle.
pub trait TimeSeriesSink {
    fn write_points(&mut self, points: &[TimeSeriesPoint]) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// In-memory sinks
// ---------------------------------------------------------------------------

/// In-memory latest-state sink. `fail` simulates a backend outage.
#[derive(Debug, Default)]
pub struct MemoryLatestSink {
    pub records: BTreeMap<String, BTreeMap<String, FieldValue>>,
    pub fail: bool,
}

impl MemoryLatestSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LatestStateSink for MemoryLatestSink {
    fn write_hash(
        &mut self,
        key: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Backend("simulated outage".to_string()));
        }
        self.records.insert(key.to_string(), fields.clone());
        Ok(())
    }
}

/// In-memory time-series sink. `fail` simulates a backend outage.
#[derive(Debug, Default)]
pub struct MemoryPointSink {
    pub points: Vec<TimeSeriesPoint>,
    pub fail: bool,
}

impl MemoryPointSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSeriesSink for MemoryPointSink {
    fn write_points(&mut self, points: &[TimeSeriesPoint]) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Backend("simulated outage".to_string()));
        }
        self.points.extend_from_slice(points);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed sinks
// ---------------------------------------------------------------------------

/// Latest-state sink persisted as one JSON document (`latest.json`),
/// rewritten after every key update.
///
/// On open, existing records are loaded back so a restart does not forget
/// endpoints that have not been polled yet; `clean_start` discards them.
pub struct JsonLatestSink {
    path: PathBuf,
    records: BTreeMap<String, BTreeMap<String, FieldValue>>,
}

impl JsonLatestSink {
    pub fn create(path: &Path, clean_start: bool) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let records = if !clean_start && path.exists() {
            let raw = fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LatestStateSink for JsonLatestSink {
    fn write_hash(
        &mut self,
        key: &str,
        fields: &BTreeMap<String, FieldValue>,
    ) -> Result<(), SinkError> {
        self.records.insert(key.to_string(), fields.clone());
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Append-only time-series sink persisted as JSON lines (`points.jsonl`),
/// one point per line, flushed once per batch.
pub struct JsonlPointSink {
    writer: BufWriter<File>,
}

impl JsonlPointSink {
    pub fn create(path: &Path, clean_start: bool) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if clean_start {
            options.truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TimeSeriesSink for JsonlPointSink {
    fn write_points(&mut self, points: &[TimeSeriesPoint]) -> Result<(), SinkError> {
        for point in points {
            let line = serde_json::to_string(point)?;
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(status: &str) -> BTreeMap<String, FieldValue> {
        let mut m = BTreeMap::new();
        m.insert("status".to_string(), FieldValue::Text(status.to_string()));
        m.insert("lock_state".to_string(), FieldValue::Int(1));
        m
    }

    fn point(endpoint: &str, field: &str, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            measurement: "fengine_status".to_string(),
            tags: BTreeMap::from([("endpoint".to_string(), endpoint.to_string())]),
            field: field.to_string(),
            value,
            timestamp_ms: 1_000,
        }
    }

    // -----------------------------------------------------------------------
    // Memory sink tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_memory_latest_overwrites() {
        let mut sink = MemoryLatestSink::new();
        sink.write_hash("ea01", &fields("OK")).unwrap();
        sink.write_hash("ea01", &fields("query timed out")).unwrap();
        assert_eq!(sink.records.len(), 1);
        assert_eq!(
            sink.records["ea01"]["status"],
            FieldValue::Text("query timed out".to_string())
        );
    }

    #[test]
    fn test_memory_sinks_simulated_failure() {
        let mut latest = MemoryLatestSink::new();
        latest.fail = true;
        assert!(latest.write_hash("ea01", &fields("OK")).is_err());

        let mut series = MemoryPointSink::new();
        series.fail = true;
        assert!(series.write_points(&[point("ea01", "lock_state", 1.0)]).is_err());
    }

    // -----------------------------------------------------------------------
    // File sink tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_json_latest_persists_and_reloads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("latest.json");

        {
            let mut sink = JsonLatestSink::create(&path, false).unwrap();
            sink.write_hash("ea01", &fields("OK")).unwrap();
            sink.write_hash("ea02", &fields("query timed out")).unwrap();
        }

        // Reopen without clean-start: previous records survive.
        let mut sink = JsonLatestSink::create(&path, false).unwrap();
        sink.write_hash("ea01", &fields("OK")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, BTreeMap<String, FieldValue>> =
            serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed["ea02"]["status"],
            FieldValue::Text("query timed out".to_string())
        );
    }

    #[test]
    fn test_json_latest_clean_start_discards() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("latest.json");

        {
            let mut sink = JsonLatestSink::create(&path, false).unwrap();
            sink.write_hash("ea01", &fields("OK")).unwrap();
        }

        let mut sink = JsonLatestSink::create(&path, true).unwrap();
        sink.write_hash("ea02", &fields("OK")).unwrap();

        let parsed: BTreeMap<String, BTreeMap<String, FieldValue>> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains_key("ea02"));
    }

    #[test]
    fn test_jsonl_points_append_across_batches() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("points.jsonl");

        {
            let mut sink = JsonlPointSink::create(&path, true).unwrap();
            sink.write_points(&[point("ea01", "lock_state", 1.0)]).unwrap();
        }
        {
            let mut sink = JsonlPointSink::create(&path, false).unwrap();
            sink.write_points(&[
                point("ea01", "sync_state", 1.0),
                point("ea02", "lock_state", 0.0),
            ])
            .unwrap();
        }

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        let last: TimeSeriesPoint = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last.tags["endpoint"], "ea02");
        assert_eq!(last.value, 0.0);
    }

    #[test]
    fn test_jsonl_clean_start_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("points.jsonl");

        {
            let mut sink = JsonlPointSink::create(&path, false).unwrap();
            sink.write_points(&[point("ea01", "lock_state", 1.0)]).unwrap();
        }
        {
            let mut sink = JsonlPointSink::create(&path, true).unwrap();
            sink.write_points(&[point("ea02", "lock_state", 1.0)]).unwrap();
        }

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(raw.contains("ea02"));
    }
}
