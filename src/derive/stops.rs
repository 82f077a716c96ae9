//! Greedy stop detection over a sorted sample sequence.

use crate::derive::types::Stop;
use crate::geo::distance_meters;
use crate::normalize::Sample;

/// Groups temporally consecutive, spatially close samples into stops.
///
/// One left-to-right pass. A candidate cluster is anchored at its first
/// member: samples extend the cluster while they stay within `radius_m` of
/// that anchor, and the first sample outside it ends the cluster. The anchor
/// is deliberately never recomputed as a centroid, so a slow drift terminates
/// a cluster earlier than a centroid-based grouping would — callers depend on
/// exactly this classification.
///
/// A cluster becomes a [`Stop`] when it has at least two members and spans at
/// least `min_dwell_s`. The cursor advances past the cluster either way, so
/// stops never overlap and every sample lands in exactly one candidate
/// cluster.
pub fn find_stops(samples: &[Sample], radius_m: f64, min_dwell_s: i64) -> Vec<Stop> {
    let mut stops = Vec::new();
    let mut i = 0;

    while i < samples.len() {
        let anchor = &samples[i];
        let mut j = i + 1;

        while j < samples.len() {
            let d = distance_meters(anchor.lat, anchor.lng, samples[j].lat, samples[j].lng);
            if d <= radius_m {
                j += 1;
            } else {
                break;
            }
        }

        let cluster = &samples[i..j];
        let dwell = (cluster[cluster.len() - 1].ts - cluster[0].ts).num_seconds();

        if cluster.len() >= 2 && dwell >= min_dwell_s {
            let n = cluster.len() as f64;
            stops.push(Stop {
                lat: cluster.iter().map(|s| s.lat).sum::<f64>() / n,
                lng: cluster.iter().map(|s| s.lng).sum::<f64>() / n,
                start: cluster[0].ts,
                end: cluster[cluster.len() - 1].ts,
                dwell_seconds: dwell,
            });
        }

        i = j;
    }

    stops
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        "2024-05-01T08:00:00Z".parse().unwrap()
    }

    fn sample(lat: f64, lng: f64, mins: i64) -> Sample {
        Sample {
            lat,
            lng,
            ts: t0() + Duration::minutes(mins),
        }
    }

    #[test]
    fn test_two_clusters_detected() {
        let samples = vec![
            sample(0.0, 0.0, 0),
            sample(0.0005, 0.0005, 6),
            sample(0.5, 0.5, 20),
            sample(0.5004, 0.5004, 28),
        ];

        let stops = find_stops(&samples, 120.0, 300);
        assert_eq!(stops.len(), 2);
        assert!(stops[0].dwell_seconds >= 360);
        assert_eq!(stops[1].dwell_seconds, 480);
    }

    #[test]
    fn test_cluster_coordinates_are_mean() {
        let samples = vec![sample(0.0, 0.0, 0), sample(0.0004, 0.0008, 10)];
        let stops = find_stops(&samples, 120.0, 300);

        assert_eq!(stops.len(), 1);
        assert!((stops[0].lat - 0.0002).abs() < 1e-12);
        assert!((stops[0].lng - 0.0004).abs() < 1e-12);
    }

    #[test]
    fn test_short_dwell_not_a_stop() {
        // Close together but only 2 minutes elapsed.
        let samples = vec![sample(0.0, 0.0, 0), sample(0.0001, 0.0001, 2)];
        assert!(find_stops(&samples, 120.0, 300).is_empty());
    }

    #[test]
    fn test_single_sample_not_a_stop() {
        let samples = vec![sample(0.0, 0.0, 0)];
        assert!(find_stops(&samples, 120.0, 300).is_empty());
    }

    #[test]
    fn test_moving_trace_yields_no_stops() {
        // Each sample ~1.1 km from the previous, well past the radius.
        let samples: Vec<Sample> = (0..6).map(|k| sample(0.01 * k as f64, 0.0, k * 5)).collect();
        assert!(find_stops(&samples, 120.0, 300).is_empty());
    }

    #[test]
    fn test_anchor_not_centroid() {
        // A drift of ~100 m per sample: every sample is within 120 m of its
        // neighbor, but the third is ~200 m from the first. Anchored
        // clustering cuts the cluster at two members; a centroid-based one
        // would have absorbed the third.
        let samples = vec![
            sample(0.0, 0.0, 0),
            sample(0.0009, 0.0, 10),
            sample(0.0018, 0.0, 20),
            sample(0.0027, 0.0, 30),
        ];

        let stops = find_stops(&samples, 120.0, 300);
        assert_eq!(stops.len(), 2);
        // First cluster holds exactly the first two samples.
        assert_eq!(stops[0].start, samples[0].ts);
        assert_eq!(stops[0].end, samples[1].ts);
        assert_eq!(stops[1].start, samples[2].ts);
    }

    #[test]
    fn test_stops_do_not_overlap() {
        let samples = vec![
            sample(0.0, 0.0, 0),
            sample(0.0001, 0.0001, 10),
            sample(0.0002, 0.0, 20),
            sample(1.0, 1.0, 30),
            sample(1.0001, 1.0001, 45),
        ];

        let stops = find_stops(&samples, 120.0, 300);
        assert_eq!(stops.len(), 2);
        assert!(stops[0].end <= stops[1].start);
    }
}
