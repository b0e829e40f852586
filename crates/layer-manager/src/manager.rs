//! Multi-layer loading and querying.
//!
//! Each layer owns a slot holding its latest load state. Loads are tagged
//! with a request id drawn from a process-wide counter; a completion is only
//! applied when its id is still the latest one issued for that layer, so a
//! slow superseded load can never overwrite a newer result.
//!
//! Layers are independent: a failed load affects only its own slot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use geotiff_loader::{load_with, RasterSource};
use overlay_common::{LayerId, OverlayError, OverlayResult, RasterDataset};
use renderer::{query_at, render, QueryResult, RampRegistry, RenderedOverlay};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::LayerSpec;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Handle for one in-flight load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    layer: LayerId,
    request_id: u64,
}

impl LoadTicket {
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }
}

/// What happened to a completed load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Result stored as the layer's current state
    Applied,
    /// A newer load was issued; result discarded
    Stale,
    /// Load failed; the layer is marked failed
    Failed(OverlayError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

/// A decoded raster and, when it has a valid range, its rendered overlay.
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    pub dataset: Arc<RasterDataset>,
    /// `None` when every sample is no-data
    pub overlay: Option<Arc<RenderedOverlay>>,
}

impl LoadedLayer {
    /// Render `dataset`; an all-no-data raster loads without an overlay.
    pub fn build(dataset: RasterDataset, ramp: &renderer::ColorRamp) -> OverlayResult<Self> {
        let overlay = match render(&dataset, ramp) {
            Ok(overlay) => Some(Arc::new(overlay)),
            Err(OverlayError::EmptyRange) => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            dataset: Arc::new(dataset),
            overlay,
        })
    }
}

/// Summary of a layer's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LayerStatus {
    Loading,
    Ready { has_overlay: bool },
    Failed { kind: String, message: String },
}

#[derive(Debug)]
enum SlotState {
    Loading,
    Ready(LoadedLayer),
    Failed(OverlayError),
}

#[derive(Debug)]
struct LayerSlot {
    latest_request: u64,
    state: SlotState,
}

/// Owns every layer's state and the active-layer selection.
pub struct LayerManager {
    ramps: RampRegistry,
    slots: RwLock<HashMap<LayerId, LayerSlot>>,
    active: RwLock<Option<LayerId>>,
}

impl LayerManager {
    pub fn new(ramps: RampRegistry) -> Self {
        Self {
            ramps,
            slots: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
        }
    }

    /// Manager with only the built-in ramps.
    pub fn with_builtin_ramps() -> Self {
        Self::new(RampRegistry::with_builtins())
    }

    pub fn ramps(&self) -> &RampRegistry {
        &self.ramps
    }

    /// Issue a new request id for `id` and mark it loading.
    pub async fn begin_load(&self, id: &LayerId) -> LoadTicket {
        let request_id = NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed);

        let mut slots = self.slots.write().await;
        slots.insert(
            id.clone(),
            LayerSlot {
                latest_request: request_id,
                state: SlotState::Loading,
            },
        );

        debug!(layer = %id, request_id, "Layer load started");
        LoadTicket {
            layer: id.clone(),
            request_id,
        }
    }

    /// Store a load result unless a newer load has been issued since.
    pub async fn complete_load(
        &self,
        ticket: LoadTicket,
        result: OverlayResult<LoadedLayer>,
    ) -> LoadOutcome {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get_mut(&ticket.layer) else {
            return LoadOutcome::Stale;
        };

        if slot.latest_request != ticket.request_id {
            debug!(
                layer = %ticket.layer,
                request_id = ticket.request_id,
                latest = slot.latest_request,
                "Discarding stale layer load"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(loaded) => {
                info!(
                    layer = %ticket.layer,
                    request_id = ticket.request_id,
                    width = loaded.dataset.width(),
                    height = loaded.dataset.height(),
                    has_overlay = loaded.overlay.is_some(),
                    "Layer ready"
                );
                if loaded.overlay.is_none() {
                    warn!(layer = %ticket.layer, "Layer has no valid samples; overlay skipped");
                }
                slot.state = SlotState::Ready(loaded);
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(
                    layer = %ticket.layer,
                    request_id = ticket.request_id,
                    kind = e.kind(),
                    error = %e,
                    "Layer failed to load"
                );
                slot.state = SlotState::Failed(e.clone());
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Fetch, decode and render a layer from its configured source.
    pub async fn load_layer(&self, spec: &LayerSpec) -> LoadOutcome {
        let ticket = self.begin_load(&spec.id).await;
        let result = match spec.source.to_source() {
            Ok(source) => self.fetch_and_build(spec, source.as_ref()).await,
            Err(e) => Err(e),
        };
        self.complete_load(ticket, result).await
    }

    /// Like [`load_layer`](Self::load_layer) with an explicit byte source.
    pub async fn load_layer_from(&self, spec: &LayerSpec, source: &dyn RasterSource) -> LoadOutcome {
        let ticket = self.begin_load(&spec.id).await;
        let result = self.fetch_and_build(spec, source).await;
        self.complete_load(ticket, result).await
    }

    async fn fetch_and_build(
        &self,
        spec: &LayerSpec,
        source: &dyn RasterSource,
    ) -> OverlayResult<LoadedLayer> {
        let ramp = self
            .ramps
            .get(&spec.ramp)
            .ok_or_else(|| OverlayError::InvalidRamp(format!("unknown ramp '{}'", spec.ramp)))?;

        let bytes = source.fetch().await?;
        debug!(layer = %spec.id, source = %source.describe(), bytes = bytes.len(), "Fetched raster");

        let options = spec.loader_options();
        tokio::task::spawn_blocking(move || {
            let dataset = load_with(&bytes, &options)?;
            LoadedLayer::build(dataset, &ramp)
        })
        .await
        .map_err(|e| OverlayError::Decode(format!("decode task failed: {}", e)))?
    }

    /// Load every layer concurrently. Each completes independently.
    pub async fn load_all(&self, specs: &[LayerSpec]) -> Vec<(LayerId, LoadOutcome)> {
        let outcomes = join_all(specs.iter().map(|spec| self.load_layer(spec))).await;
        let loaded = outcomes.iter().filter(|o| o.is_applied()).count();
        info!(total = specs.len(), loaded, "Finished loading layers");

        specs.iter().map(|s| s.id.clone()).zip(outcomes).collect()
    }

    /// Choose which layer answers [`query_active`](Self::query_active).
    pub async fn set_active(&self, id: &LayerId) -> OverlayResult<()> {
        if !self.slots.read().await.contains_key(id) {
            return Err(OverlayError::LayerNotFound(id.to_string()));
        }
        *self.active.write().await = Some(id.clone());
        debug!(layer = %id, "Active layer changed");
        Ok(())
    }

    pub async fn active(&self) -> Option<LayerId> {
        self.active.read().await.clone()
    }

    /// Query one layer. A layer that is not ready answers `NotFound`.
    pub async fn query(&self, id: &LayerId, lat: f64, lon: f64) -> OverlayResult<QueryResult> {
        let slots = self.slots.read().await;
        let slot = slots
            .get(id)
            .ok_or_else(|| OverlayError::LayerNotFound(id.to_string()))?;

        Ok(match &slot.state {
            SlotState::Ready(loaded) => query_at(&loaded.dataset, lat, lon),
            SlotState::Loading | SlotState::Failed(_) => QueryResult::NotFound,
        })
    }

    /// Query the active layer.
    pub async fn query_active(&self, lat: f64, lon: f64) -> OverlayResult<QueryResult> {
        let active = self
            .active()
            .await
            .ok_or_else(|| OverlayError::LayerNotFound("no active layer".to_string()))?;
        self.query(&active, lat, lon).await
    }

    pub async fn state(&self, id: &LayerId) -> Option<LayerStatus> {
        let slots = self.slots.read().await;
        slots.get(id).map(|slot| match &slot.state {
            SlotState::Loading => LayerStatus::Loading,
            SlotState::Ready(loaded) => LayerStatus::Ready {
                has_overlay: loaded.overlay.is_some(),
            },
            SlotState::Failed(e) => LayerStatus::Failed {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        })
    }

    pub async fn overlay(&self, id: &LayerId) -> Option<Arc<RenderedOverlay>> {
        let slots = self.slots.read().await;
        match slots.get(id).map(|s| &s.state) {
            Some(SlotState::Ready(loaded)) => loaded.overlay.clone(),
            _ => None,
        }
    }

    pub async fn dataset(&self, id: &LayerId) -> Option<Arc<RasterDataset>> {
        let slots = self.slots.read().await;
        match slots.get(id).map(|s| &s.state) {
            Some(SlotState::Ready(loaded)) => Some(loaded.dataset.clone()),
            _ => None,
        }
    }

    /// Known layer ids, sorted.
    pub async fn layer_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.slots.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::with_builtin_ramps()
    }
}
