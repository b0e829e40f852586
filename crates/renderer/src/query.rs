//! Point queries against a loaded raster.
//!
//! Geographic coordinates map to pixels with the inverse of the overlay
//! placement:
//!
//! ```text
//! x = floor((lon - min_lon) / (max_lon - min_lon) * width)
//! y = floor((max_lat - lat) / (max_lat - min_lat) * height)
//! ```
//!
//! Row 0 is the north edge, so the latitude axis is flipped.

use overlay_common::RasterDataset;
use serde::{Deserialize, Serialize};

/// A valid sample found at a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleQuery {
    pub pixel_x: usize,
    pub pixel_y: usize,
    pub value: f32,
    pub lat: f64,
    pub lon: f64,
}

/// Result of a point query. `NotFound` is an ordinary outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResult {
    Found(SampleQuery),
    NotFound,
}

impl QueryResult {
    pub fn is_found(&self) -> bool {
        matches!(self, QueryResult::Found(_))
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            QueryResult::Found(q) => Some(q.value),
            QueryResult::NotFound => None,
        }
    }
}

/// Pixel containing `(lat, lon)`, if inside the grid.
pub fn pixel_for(dataset: &RasterDataset, lat: f64, lon: f64) -> Option<(usize, usize)> {
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    let bbox = dataset.bbox();
    let fx = ((lon - bbox.min_lon) / bbox.width() * dataset.width() as f64).floor();
    let fy = ((bbox.max_lat - lat) / bbox.height() * dataset.height() as f64).floor();

    if fx < 0.0 || fy < 0.0 {
        return None;
    }
    let (x, y) = (fx as usize, fy as usize);
    if x >= dataset.width() || y >= dataset.height() {
        return None;
    }
    Some((x, y))
}

/// Look up the sample under `(lat, lon)`.
pub fn query_at(dataset: &RasterDataset, lat: f64, lon: f64) -> QueryResult {
    let Some((x, y)) = pixel_for(dataset, lat, lon) else {
        return QueryResult::NotFound;
    };
    let Some(idx) = dataset.index(x, y) else {
        return QueryResult::NotFound;
    };
    if dataset.is_no_data_at(idx) {
        return QueryResult::NotFound;
    }

    QueryResult::Found(SampleQuery {
        pixel_x: x,
        pixel_y: y,
        value: dataset.samples()[idx],
        lat,
        lon,
    })
}

/// Geographic center of pixel `(x, y)` as `(lat, lon)`.
pub fn pixel_center(dataset: &RasterDataset, x: usize, y: usize) -> Option<(f64, f64)> {
    dataset.index(x, y)?;
    let bbox = dataset.bbox();
    let (px_lon, px_lat) = dataset.pixel_size();
    let lon = bbox.min_lon + (x as f64 + 0.5) * px_lon;
    let lat = bbox.max_lat - (y as f64 + 0.5) * px_lat;
    Some((lat, lon))
}
