//! Common types and utilities shared across the gauge-overlay crates.

pub mod bbox;
pub mod error;
pub mod gauge;
pub mod layer;
pub mod nodata;
pub mod raster;

pub use bbox::BoundingBox;
pub use error::{OverlayError, OverlayResult};
pub use gauge::{GaugeStatus, GaugeThresholds, Trend};
pub use layer::{InterpolationMethod, LayerId};
pub use nodata::NoDataPolicy;
pub use raster::RasterDataset;
