//! Layer coordination for raster overlays.
//!
//! Several rasters may cover the same extent (one per interpolation method).
//! They load concurrently and independently, and exactly one is active for
//! point queries at a time. There is no blending between layers.

pub mod config;
pub mod manager;

pub use config::{LayerSpec, LayersConfig, SourceSpec, LAYERS_CONFIG_ENV};
pub use manager::{LayerManager, LayerStatus, LoadOutcome, LoadTicket, LoadedLayer};
