//! Raw point normalization.
//!
//! Traces arrive as loosely-shaped documents: coordinates may be missing and
//! timestamps show up as ISO-8601 strings (with or without a zone marker),
//! numeric epoch seconds, or — thanks to an upstream writer defect — a
//! single-element list wrapping either. Unusable points are dropped silently;
//! bad data in a trace is expected and never fatal.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// One GPS point document exactly as the store hands it over.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPoint {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub timestamp: Option<RawTimestamp>,
}

/// The timestamp field's possible shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// ISO-8601 text, `Z` or numeric offset or no zone marker at all.
    Text(String),
    /// Epoch seconds, fractional allowed.
    Epoch(f64),
    /// Upstream defect: the real value wrapped in a list. Unwrapped once.
    Wrapped(Vec<RawTimestamp>),
}

/// A normalized, timezone-aware GPS reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub lat: f64,
    pub lng: f64,
    pub ts: DateTime<Utc>,
}

/// Parses a raw timestamp into a UTC instant, or `None` if unusable.
pub fn parse_raw_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Text(s) => parse_iso(s),
        RawTimestamp::Epoch(secs) => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos)
        }
        RawTimestamp::Wrapped(inner) => match inner.as_slice() {
            // Unwrap exactly once; a list inside the list is still garbage.
            [RawTimestamp::Text(s)] => parse_iso(s),
            [RawTimestamp::Epoch(secs)] => {
                parse_raw_timestamp(&RawTimestamp::Epoch(*secs))
            }
            _ => None,
        },
    }
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // No zone marker: treat as UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Converts raw points into samples sorted ascending by timestamp.
///
/// Points missing a coordinate or carrying an unparseable timestamp are
/// skipped. The sort is stable, so equal timestamps keep input order.
pub fn normalize(points: &[RawPoint]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = points
        .iter()
        .filter_map(|p| {
            let lat = p.lat?;
            let lng = p.lng?;
            let ts = parse_raw_timestamp(p.timestamp.as_ref()?)?;
            Some(Sample { lat, lng, ts })
        })
        .collect();

    samples.sort_by(|a, b| a.ts.cmp(&b.ts));
    samples
}
