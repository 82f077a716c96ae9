//! Trajectory derivation engine.
//!
//! Takes a case's raw GPS trace and computes the analytical rollup: detected
//! stops with dwell time, most-revisited grid cells, an hour-of-day activity
//! histogram, and flagged improbable jumps. Pure and synchronous; persistence
//! lives behind the [`crate::store`] seams.

pub mod anomalies;
pub mod hours;
pub mod locations;
pub mod rollup;
pub mod stops;
pub mod types;
