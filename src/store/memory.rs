use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::derive::types::{Event, Rollup};
use crate::normalize::RawPoint;
use crate::store::{DerivedStore, PointStore};

/// In-memory store backing the CLI and tests.
///
/// One mutex guards all three collections, so an event replacement is
/// observed atomically. Two concurrent derive runs for the same case still
/// race at this layer with last write winning, the same contract a remote
/// document store gives.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    points: HashMap<String, Vec<RawPoint>>,
    rollups: HashMap<String, Rollup>,
    events: HashMap<String, Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a case's raw trace, replacing whatever was there.
    pub fn seed_points(&self, case_id: &str, points: Vec<RawPoint>) {
        let mut inner = self.inner.lock().unwrap();
        inner.points.insert(case_id.to_string(), points);
    }

    pub fn rollup(&self, case_id: &str) -> Option<Rollup> {
        self.inner.lock().unwrap().rollups.get(case_id).cloned()
    }

    pub fn events(&self, case_id: &str) -> Vec<Event> {
        self.inner
            .lock()
            .unwrap()
            .events
            .get(case_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PointStore for MemoryStore {
    async fn all_points(&self, case_id: &str) -> Result<Vec<RawPoint>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.points.get(case_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DerivedStore for MemoryStore {
    async fn replace_rollup(&self, case_id: &str, rollup: &Rollup) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.rollups.insert(case_id.to_string(), rollup.clone());
        Ok(())
    }

    async fn replace_events(&self, case_id: &str, events: &[Event]) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.insert(case_id.to_string(), events.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_missing_case_reads_empty() {
        let store = MemoryStore::new();
        assert!(store.all_points("nope").await.unwrap().is_empty());
        assert!(store.rollup("nope").is_none());
        assert!(store.events("nope").is_empty());
    }

    #[tokio::test]
    async fn test_events_are_replaced_not_appended() {
        let store = MemoryStore::new();
        let event = Event {
            kind: "stop".into(),
            start: Utc::now(),
            end: Utc::now(),
            lat: 0.0,
            lng: 0.0,
            dwell_seconds: 400,
            source: "derived-v1".into(),
        };

        store
            .replace_events("c1", &[event.clone(), event.clone()])
            .await
            .unwrap();
        store.replace_events("c1", &[event]).await.unwrap();

        assert_eq!(store.events("c1").len(), 1);
    }

    #[tokio::test]
    async fn test_rollup_overwritten() {
        let store = MemoryStore::new();
        let mut r = Rollup::empty();
        store.replace_rollup("c1", &r).await.unwrap();

        r.total_points = 7;
        store.replace_rollup("c1", &r).await.unwrap();

        assert_eq!(store.rollup("c1").unwrap().total_points, 7);
    }
}
