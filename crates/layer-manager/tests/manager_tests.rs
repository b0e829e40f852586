//! Tests for concurrent layer loading, staleness and active-layer queries.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use geotiff_loader::{MemorySource, RasterSource};
use layer_manager::{LayerManager, LayerSpec, LayerStatus, LoadOutcome, SourceSpec};
use overlay_common::{InterpolationMethod, LayerId, NoDataPolicy, OverlayError, OverlayResult};
use renderer::QueryResult;
use test_utils::{create_constant_grid, encode_geotiff, scenario};
use tokio::sync::Notify;

/// Source that blocks in `fetch` until released.
struct GatedSource {
    inner: MemorySource,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl RasterSource for GatedSource {
    async fn fetch(&self) -> OverlayResult<Bytes> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.fetch().await
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

fn scenario_tiff() -> Vec<u8> {
    encode_geotiff(4, 4, &scenario::SAMPLES, scenario::EXTENT)
}

fn constant_tiff(value: f32) -> Vec<u8> {
    encode_geotiff(4, 4, &create_constant_grid(4, 4, value), scenario::EXTENT)
}

fn file_spec(id: &str, path: &Path) -> LayerSpec {
    LayerSpec::new(
        id,
        SourceSpec::File {
            path: path.to_path_buf(),
        },
    )
    .with_no_data(NoDataPolicy::sentinel(scenario::SENTINEL))
}

// ============================================================================
// Staleness
// ============================================================================

#[tokio::test]
async fn test_superseded_load_does_not_overwrite_newer() {
    let manager = LayerManager::default();
    let spec = LayerSpec::new(
        "water_level",
        SourceSpec::File {
            path: "unused.tif".into(),
        },
    );

    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let slow = GatedSource {
        inner: MemorySource::new("old", scenario_tiff()),
        entered: entered.clone(),
        release: release.clone(),
    };
    let fresh = MemorySource::new("new", constant_tiff(42.0));

    let slow_load = manager.load_layer_from(&spec, &slow);
    let fresh_load = async {
        entered.notified().await;
        let outcome = manager.load_layer_from(&spec, &fresh).await;
        release.notify_one();
        outcome
    };

    let (slow_outcome, fresh_outcome) = tokio::join!(slow_load, fresh_load);
    assert_eq!(fresh_outcome, LoadOutcome::Applied);
    assert_eq!(slow_outcome, LoadOutcome::Stale);

    let value = manager
        .query(&spec.id, 10.9, 100.1)
        .await
        .unwrap()
        .value();
    assert_eq!(value, Some(42.0));
}

#[tokio::test]
async fn test_stale_failure_does_not_mark_layer_failed() {
    let manager = LayerManager::default();
    let id = LayerId::from("layer");

    let old = manager.begin_load(&id).await;
    let spec = LayerSpec::new("layer", SourceSpec::File { path: "x".into() });
    let outcome = manager
        .load_layer_from(&spec, &MemorySource::new("new", scenario_tiff()))
        .await;
    assert!(outcome.is_applied());

    let stale = manager
        .complete_load(old, Err(OverlayError::fetch("old", "timeout")))
        .await;
    assert_eq!(stale, LoadOutcome::Stale);
    assert_eq!(
        manager.state(&id).await,
        Some(LayerStatus::Ready { has_overlay: true })
    );
}

// ============================================================================
// Partial failure
// ============================================================================

#[tokio::test]
async fn test_load_all_tolerates_failed_layers() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.tif");
    let garbage = dir.path().join("garbage.tif");
    std::fs::write(&good, scenario_tiff()).unwrap();
    std::fs::write(&garbage, b"definitely not a tiff").unwrap();

    let specs = vec![
        file_spec("good", &good),
        file_spec("garbage", &garbage),
        file_spec("missing", &dir.path().join("missing.tif")),
    ];

    let manager = LayerManager::default();
    let outcomes = manager.load_all(&specs).await;
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0], (LayerId::from("good"), LoadOutcome::Applied));
    assert!(matches!(
        &outcomes[1].1,
        LoadOutcome::Failed(OverlayError::Decode(_))
    ));
    assert!(matches!(
        &outcomes[2].1,
        LoadOutcome::Failed(OverlayError::Fetch { .. })
    ));

    assert_eq!(
        manager.state(&"good".into()).await,
        Some(LayerStatus::Ready { has_overlay: true })
    );
    match manager.state(&"garbage".into()).await {
        Some(LayerStatus::Failed { kind, .. }) => assert_eq!(kind, "decode"),
        other => panic!("unexpected state {:?}", other),
    }

    // the healthy layer still answers queries
    let result = manager.query(&"good".into(), 10.9, 100.1).await.unwrap();
    assert_eq!(result.value(), Some(1.0));
    assert_eq!(
        manager.query(&"missing".into(), 10.9, 100.1).await.unwrap(),
        QueryResult::NotFound
    );
    assert!(manager.overlay(&"good".into()).await.is_some());
    assert!(manager.overlay(&"garbage".into()).await.is_none());
}

#[tokio::test]
async fn test_unknown_ramp_fails_layer() {
    let manager = LayerManager::default();
    let spec = LayerSpec::new("layer", SourceSpec::File { path: "x".into() }).with_ramp("jet");
    let outcome = manager
        .load_layer_from(&spec, &MemorySource::new("m", scenario_tiff()))
        .await;
    assert!(matches!(outcome, LoadOutcome::Failed(OverlayError::InvalidRamp(_))));
}

#[tokio::test]
async fn test_all_no_data_layer_has_no_overlay() {
    let manager = LayerManager::default();
    let spec = LayerSpec::new("empty", SourceSpec::File { path: "x".into() })
        .with_no_data(NoDataPolicy::water_level());
    let outcome = manager
        .load_layer_from(&spec, &MemorySource::new("m", constant_tiff(0.0)))
        .await;

    assert_eq!(outcome, LoadOutcome::Applied);
    assert_eq!(
        manager.state(&spec.id).await,
        Some(LayerStatus::Ready { has_overlay: false })
    );
    assert!(manager.overlay(&spec.id).await.is_none());
    assert!(manager.dataset(&spec.id).await.is_some());
}

// ============================================================================
// Active layer
// ============================================================================

#[tokio::test]
async fn test_query_follows_active_layer() {
    let manager = LayerManager::default();
    let nearest = LayerSpec::new("nearest", SourceSpec::File { path: "n".into() })
        .with_method(InterpolationMethod::Nearest);
    let idw = LayerSpec::new("idw", SourceSpec::File { path: "i".into() })
        .with_method(InterpolationMethod::InverseDistance);

    manager
        .load_layer_from(&nearest, &MemorySource::new("n", constant_tiff(3.0)))
        .await;
    manager
        .load_layer_from(&idw, &MemorySource::new("i", constant_tiff(7.5)))
        .await;

    assert!(matches!(
        manager.query_active(10.5, 100.5).await,
        Err(OverlayError::LayerNotFound(_))
    ));

    manager.set_active(&nearest.id).await.unwrap();
    assert_eq!(
        manager.query_active(10.5, 100.5).await.unwrap().value(),
        Some(3.0)
    );

    manager.set_active(&idw.id).await.unwrap();
    assert_eq!(manager.active().await, Some(idw.id.clone()));
    assert_eq!(
        manager.query_active(10.5, 100.5).await.unwrap().value(),
        Some(7.5)
    );

    assert_eq!(
        manager.layer_ids().await,
        vec![LayerId::from("idw"), LayerId::from("nearest")]
    );
}

#[tokio::test]
async fn test_set_active_unknown_layer() {
    let manager = LayerManager::default();
    let err = manager.set_active(&"ghost".into()).await.unwrap_err();
    assert_eq!(err, OverlayError::LayerNotFound("ghost".to_string()));
    assert_eq!(manager.active().await, None);
}

#[tokio::test]
async fn test_query_unknown_layer() {
    let manager = LayerManager::default();
    assert!(matches!(
        manager.query(&"ghost".into(), 0.0, 0.0).await,
        Err(OverlayError::LayerNotFound(_))
    ));
}
