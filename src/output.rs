//! CSV audit trail of derive runs.
//!
//! One flat row per computed rollup, appended to a local file. Useful for
//! eyeballing batch runs without digging through the store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::derive::types::Rollup;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Flat summary of one derive run, CSV-friendly.
#[derive(Debug, Serialize)]
pub struct RollupRow {
    pub case_id: String,
    pub computed_at: Option<DateTime<Utc>>,
    pub total_points: usize,
    pub total_duration_seconds: Option<i64>,
    pub stop_count: usize,
    pub anomaly_count: usize,
    pub longest_dwell_seconds: Option<i64>,
}

impl RollupRow {
    pub fn from_rollup(case_id: &str, rollup: &Rollup) -> Self {
        RollupRow {
            case_id: case_id.to_string(),
            computed_at: rollup.computed_at,
            total_points: rollup.total_points,
            total_duration_seconds: rollup.total_duration_seconds,
            stop_count: rollup.stop_count.unwrap_or(0),
            anomaly_count: rollup.anomalies.as_ref().map_or(0, Vec::len),
            longest_dwell_seconds: rollup
                .longest_dwell
                .as_ref()
                .and_then(|l| l.as_ref().map(|d| d.seconds)),
        }
    }
}

/// Appends a [`RollupRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, row: &RollupRow) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}
