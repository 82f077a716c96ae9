//! Rollup assembly: normalization, stop detection, rankings, anomalies.

use chrono::Utc;
use tracing::debug;

use crate::derive::anomalies::find_anomalies;
use crate::derive::hours::active_hours;
use crate::derive::locations::top_locations;
use crate::derive::stops::find_stops;
use crate::derive::types::{Derivation, Event, LongestDwell, Rollup, Stop};
use crate::normalize::{RawPoint, normalize};

/// Marker written on every derived event, bumped if the derivation
/// algorithm ever changes shape.
pub const EVENT_SOURCE: &str = "derived-v1";
pub const EVENT_KIND_STOP: &str = "stop";

/// Tunable thresholds for one derivation run.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Max distance from a cluster's anchor for a sample to join it.
    pub stop_radius_m: f64,
    /// Minimum span of a cluster to count as a stop.
    pub min_dwell_s: i64,
    /// Upper bound on elapsed time for a displacement to be suspicious.
    pub anomaly_max_elapsed_s: i64,
    /// Displacement past which a fast transition is flagged.
    pub anomaly_jump_m: f64,
    pub top_locations_k: usize,
    pub active_hours_k: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            stop_radius_m: 120.0,
            min_dwell_s: 300,
            anomaly_max_elapsed_s: 300,
            anomaly_jump_m: 10_000.0,
            top_locations_k: 5,
            active_hours_k: 6,
        }
    }
}

/// Derives a case rollup from raw points with the default thresholds.
pub fn compute(points: &[RawPoint]) -> Derivation {
    compute_with(points, &Thresholds::default())
}

/// Derives a case rollup plus its per-stop event projection.
///
/// Unusable points are dropped during normalization; if nothing survives,
/// the result is the `{"totalPoints": 0}` sentinel with an empty event list.
/// This never fails: per-point garbage is not an error.
pub fn compute_with(points: &[RawPoint], thresholds: &Thresholds) -> Derivation {
    let samples = normalize(points);

    if samples.is_empty() {
        debug!(raw_points = points.len(), "No usable samples, returning sentinel");
        return Derivation {
            rollup: Rollup::empty(),
            events: Vec::new(),
        };
    }

    let first = samples[0].ts;
    let last = samples[samples.len() - 1].ts;

    let stops = find_stops(&samples, thresholds.stop_radius_m, thresholds.min_dwell_s);
    let locations = top_locations(&stops, thresholds.top_locations_k);
    let hours = active_hours(&samples, thresholds.active_hours_k);
    let anomalies = find_anomalies(
        &samples,
        thresholds.anomaly_max_elapsed_s,
        thresholds.anomaly_jump_m,
    );

    // First stop wins dwell ties, in cluster order.
    let mut longest_stop: Option<&Stop> = None;
    for s in &stops {
        if longest_stop.is_none_or(|l| s.dwell_seconds > l.dwell_seconds) {
            longest_stop = Some(s);
        }
    }
    let longest = longest_stop.map(|s| LongestDwell {
            seconds: s.dwell_seconds,
            lat: s.lat,
            lng: s.lng,
            start: s.start,
            end: s.end,
        });

    debug!(
        samples = samples.len(),
        stops = stops.len(),
        anomalies = anomalies.len(),
        "Derivation computed"
    );

    let rollup = Rollup {
        computed_at: Some(Utc::now()),
        total_points: samples.len(),
        first_timestamp: Some(first),
        last_timestamp: Some(last),
        total_duration_seconds: Some((last - first).num_seconds()),
        stop_count: Some(stops.len()),
        longest_dwell: Some(longest),
        top_locations: Some(locations),
        active_hours_buckets: Some(hours),
        anomalies: Some(anomalies),
    };

    Derivation {
        rollup,
        events: events_for(&stops),
    }
}

/// The 1:1 per-stop event projection persisted alongside the rollup.
pub fn events_for(stops: &[Stop]) -> Vec<Event> {
    stops
        .iter()
        .map(|s| Event {
            kind: EVENT_KIND_STOP.to_string(),
            start: s.start,
            end: s.end,
            lat: s.lat,
            lng: s.lng,
            dwell_seconds: s.dwell_seconds,
            source: EVENT_SOURCE.to_string(),
        })
        .collect()
}
