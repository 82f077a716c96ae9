//! Record types produced by the rollup pipeline.
//!
//! Everything here is serialized camelCase because the persisted documents
//! (and the trigger response body) use that convention.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A detected stop: a run of consecutive nearby samples dwelling at least the
/// minimum threshold. Coordinates are the arithmetic mean of the members.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub lat: f64,
    pub lng: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub dwell_seconds: i64,
}

/// A ~0.001-degree grid cell counting how many stops landed in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationBucket {
    pub lat: f64,
    pub lng: f64,
    pub visits: u32,
}

/// A physically improbable transition between consecutive samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: String,
    /// Timestamp of the later sample of the pair.
    pub ts: DateTime<Utc>,
    pub meters: i64,
}

/// The longest stop of a run, in its persisted shape. The duration field is
/// named `seconds` here, unlike the per-event `dwellSeconds`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongestDwell {
    pub seconds: i64,
    pub lat: f64,
    pub lng: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The per-case analytical summary. Fully replaced on each recomputation.
///
/// The empty-trace sentinel is `{"totalPoints": 0}` with every other key
/// absent, hence the blanket `Option` fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_at: Option<DateTime<Utc>>,
    pub total_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_count: Option<usize>,
    /// Absent in the sentinel; an explicit `null` in a populated rollup
    /// that found no stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longest_dwell: Option<Option<LongestDwell>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_locations: Option<Vec<LocationBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_hours_buckets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<Anomaly>>,
}

impl Rollup {
    /// The documented empty/error sentinel: no usable points.
    pub fn empty() -> Self {
        Rollup {
            computed_at: None,
            total_points: 0,
            first_timestamp: None,
            last_timestamp: None,
            total_duration_seconds: None,
            stop_count: None,
            longest_dwell: None,
            top_locations: None,
            active_hours_buckets: None,
            anomalies: None,
        }
    }

    /// Equality ignoring the wall-clock `computedAt` field.
    pub fn same_modulo_computed_at(&self, other: &Rollup) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.computed_at = None;
        b.computed_at = None;
        a == b
    }
}

/// The persisted per-stop projection of one rollup run. The full event set
/// for a case is replaced wholesale each recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub dwell_seconds: i64,
    pub source: String,
}

/// One engine run: the rollup plus its per-stop event projection.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub rollup: Rollup,
    pub events: Vec<Event>,
}

/// Result of a derive run, shaped like the trigger response body.
#[derive(Debug, Clone, Serialize)]
pub struct DeriveOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup: Option<Rollup>,
}
