//! Derive-and-store orchestration for one case.

use anyhow::Result;
use tracing::info;

use crate::derive::rollup::{Thresholds, compute_with};
use crate::derive::types::DeriveOutcome;
use crate::store::{DerivedStore, PointStore};

/// Reads the case's full trace, computes the rollup, and persists the rollup
/// plus its event projection.
///
/// A case with no recorded points yields `success: false` with message
/// `"No allPoints"`; callers map that to a client error. Store failures
/// propagate unchanged. There is no per-case locking: two concurrent runs for
/// the same case race at the store with last write winning.
#[tracing::instrument(skip(reader, writer))]
pub async fn derive_case(
    case_id: &str,
    reader: &impl PointStore,
    writer: &impl DerivedStore,
) -> Result<DeriveOutcome> {
    derive_case_with(case_id, reader, writer, &Thresholds::default()).await
}

/// [`derive_case`] with explicit thresholds.
pub async fn derive_case_with(
    case_id: &str,
    reader: &impl PointStore,
    writer: &impl DerivedStore,
    thresholds: &Thresholds,
) -> Result<DeriveOutcome> {
    let points = reader.all_points(case_id).await?;

    if points.is_empty() {
        info!(case_id, "No points recorded for case");
        return Ok(DeriveOutcome {
            success: false,
            message: Some("No allPoints".to_string()),
            rollup: None,
        });
    }

    let derivation = compute_with(&points, thresholds);

    writer.replace_rollup(case_id, &derivation.rollup).await?;
    writer.replace_events(case_id, &derivation.events).await?;

    info!(
        case_id,
        total_points = derivation.rollup.total_points,
        stops = derivation.events.len(),
        "Rollup derived and stored"
    );

    Ok(DeriveOutcome {
        success: true,
        message: None,
        rollup: Some(derivation.rollup),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{RawPoint, RawTimestamp};
    use crate::store::MemoryStore;

    fn point(lat: f64, lng: f64, iso: &str) -> RawPoint {
        RawPoint {
            lat: Some(lat),
            lng: Some(lng),
            timestamp: Some(RawTimestamp::Text(iso.to_string())),
        }
    }

    #[tokio::test]
    async fn test_missing_trace_is_client_failure() {
        let store = MemoryStore::new();
        let out = derive_case("c1", &store, &store).await.unwrap();

        assert!(!out.success);
        assert_eq!(out.message.as_deref(), Some("No allPoints"));
        assert!(out.rollup.is_none());
        assert!(store.rollup("c1").is_none());
    }

    #[tokio::test]
    async fn test_derive_persists_rollup_and_events() {
        let store = MemoryStore::new();
        store.seed_points(
            "c1",
            vec![
                point(0.0, 0.0, "2024-05-01T08:00:00Z"),
                point(0.0005, 0.0005, "2024-05-01T08:06:00Z"),
            ],
        );

        let out = derive_case("c1", &store, &store).await.unwrap();
        assert!(out.success);

        let rollup = store.rollup("c1").unwrap();
        assert!(out.rollup.unwrap().same_modulo_computed_at(&rollup));
        assert_eq!(store.events("c1").len(), rollup.stop_count.unwrap());
    }

    #[tokio::test]
    async fn test_all_garbage_points_still_succeeds_with_sentinel() {
        // Points exist but none is usable: not the "No allPoints" case.
        let store = MemoryStore::new();
        store.seed_points(
            "c1",
            vec![RawPoint {
                lat: Some(1.0),
                lng: None,
                timestamp: Some(RawTimestamp::Text("2024-05-01T08:00:00Z".into())),
            }],
        );

        let out = derive_case("c1", &store, &store).await.unwrap();
        assert!(out.success);
        assert_eq!(store.rollup("c1").unwrap().total_points, 0);
        assert!(store.events("c1").is_empty());
    }

    #[tokio::test]
    async fn test_rerun_replaces_prior_events() {
        let store = MemoryStore::new();
        store.seed_points(
            "c1",
            vec![
                point(0.0, 0.0, "2024-05-01T08:00:00Z"),
                point(0.0001, 0.0001, "2024-05-01T08:10:00Z"),
            ],
        );
        derive_case("c1", &store, &store).await.unwrap();
        assert_eq!(store.events("c1").len(), 1);

        // Trace replaced by one with no stops: events must vanish, not pile up.
        store.seed_points(
            "c1",
            vec![
                point(0.0, 0.0, "2024-05-01T08:00:00Z"),
                point(1.0, 1.0, "2024-05-01T09:00:00Z"),
            ],
        );
        derive_case("c1", &store, &store).await.unwrap();
        assert!(store.events("c1").is_empty());
    }
}
