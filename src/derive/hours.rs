//! Hour-of-day activity histogram.

use crate::normalize::Sample;
use chrono::Timelike;

/// Buckets every sample by UTC hour and returns up to `k` bucket labels,
/// busiest first. Labels look like `"08:00-08:59"`.
///
/// Ties keep first-occurrence order (insertion-ordered counts, stable sort).
pub fn active_hours(samples: &[Sample], k: usize) -> Vec<String> {
    let mut counts: Vec<(u32, u32)> = Vec::new(); // (hour, count), insertion order

    for s in samples {
        let hour = s.ts.hour();
        match counts.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, c)) => *c += 1,
            None => counts.push((hour, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(k)
        .map(|(h, _)| format!("{h:02}:00-{h:02}:59"))
        .collect()
}
