//! Improbable-jump detection between consecutive samples.

use crate::derive::types::Anomaly;
use crate::geo::distance_meters;
use crate::normalize::Sample;

pub const BIG_JUMP: &str = "big_jump";

/// Flags adjacent sample pairs whose displacement exceeds `jump_m` within
/// `max_elapsed_s`. Anomalies are stamped with the later sample's timestamp
/// and are independent of stop clustering.
pub fn find_anomalies(samples: &[Sample], max_elapsed_s: i64, jump_m: f64) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for pair in samples.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let elapsed = (b.ts - a.ts).num_seconds();
        if elapsed > max_elapsed_s {
            continue;
        }

        let meters = distance_meters(a.lat, a.lng, b.lat, b.lng);
        if meters > jump_m {
            anomalies.push(Anomaly {
                kind: BIG_JUMP.to_string(),
                ts: b.ts,
                meters: meters.round() as i64,
            });
        }
    }

    anomalies
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
    fn test_one_degree_in_four_minutes_is_a_jump() {
        let samples = vec![sample(0.0, 0.0, 0), sample(0.0, 1.0, 4)];
        let anomalies = find_anomalies(&samples, 300, 10_000.0);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, BIG_JUMP);
        assert_eq!(anomalies[0].ts, samples[1].ts);
        assert!(anomalies[0].meters > 10_000);
    }

    #[test]
    fn test_slow_large_move_is_fine() {
        // Same degree of displacement, but over an hour.
        let samples = vec![sample(0.0, 0.0, 0), sample(0.0, 1.0, 60)];
        assert!(find_anomalies(&samples, 300, 10_000.0).is_empty());
    }

    #[test]
    fn test_small_moves_produce_nothing() {
        // Three samples within ~30 m over 5 minutes.
        let samples = vec![
            sample(0.0, 0.0, 0),
            sample(0.0002, 0.0, 2),
            sample(0.0001, 0.0001, 5),
        ];
        assert!(find_anomalies(&samples, 300, 10_000.0).is_empty());
    }

    #[test]
    fn test_multiple_jumps_in_one_trace() {
        let samples = vec![
            sample(0.0, 0.0, 0),
            sample(0.0, 1.0, 2),
            sample(0.0, 2.0, 4),
        ];
        assert_eq!(find_anomalies(&samples, 300, 10_000.0).len(), 2);
    }
}
