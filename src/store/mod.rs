//! Document-store collaborator seams.
//!
//! The engine neither pages nor filters: the reader hands over a case's
//! complete, unordered trace in one call, and the writer replaces the derived
//! records wholesale.

mod memory;

pub use memory::MemoryStore;

use crate::derive::types::{Event, Rollup};
use crate::normalize::RawPoint;
use anyhow::Result;
use async_trait::async_trait;

/// Read side: the full point collection for a case.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Returns every raw point recorded for `case_id`, in no particular
    /// order. An empty vector means no trace exists yet.
    async fn all_points(&self, case_id: &str) -> Result<Vec<RawPoint>>;
}

/// Write side: derived records, replaced in full on every recomputation.
#[async_trait]
pub trait DerivedStore: Send + Sync {
    /// Upserts the case's rollup, overwriting any prior value.
    async fn replace_rollup(&self, case_id: &str, rollup: &Rollup) -> Result<()>;

    /// Replaces the case's entire event collection in one atomic batch:
    /// readers never observe a partial set.
    async fn replace_events(&self, case_id: &str, events: &[Event]) -> Result<()>;
}
