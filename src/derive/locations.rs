//! Revisit counting on a coarse coordinate grid.

use crate::derive::types::{LocationBucket, Stop};

/// Rounds to 3 decimals, the grid resolution (~111 m at the equator).
fn grid(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Ranks the grid cells stops fall into, most visited first.
///
/// Counting is insertion-ordered and the sort is stable, so equal visit
/// counts keep first-occurrence order among the stops. Returns at most `k`
/// buckets.
pub fn top_locations(stops: &[Stop], k: usize) -> Vec<LocationBucket> {
    // Vec keyed by the rounded pair keeps first-occurrence order; HashMap
    // iteration order would make tie-breaks nondeterministic. Stop counts
    // per case are small.
    let mut buckets: Vec<LocationBucket> = Vec::new();

    for stop in stops {
        let (lat, lng) = (grid(stop.lat), grid(stop.lng));
        match buckets.iter_mut().find(|b| b.lat == lat && b.lng == lng) {
            Some(b) => b.visits += 1,
            None => buckets.push(LocationBucket { lat, lng, visits: 1 }),
        }
    }

    buckets.sort_by(|a, b| b.visits.cmp(&a.visits));
    buckets.truncate(k);
    buckets
}
