//! Gradient rendering of a raster through a color ramp.
//!
//! Rendering is a pure function of the dataset and the ramp: the valid value
//! range is scanned once, every sample is normalized into `[0, 1]` and mapped
//! through the ramp, and no-data pixels become fully transparent.

use overlay_common::{BoundingBox, OverlayError, OverlayResult, RasterDataset};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ramp::{ColorRamp, Rgb};

/// Minimum pixel count before rows are colorized in parallel.
const PARALLEL_THRESHOLD: usize = 65_536; // 256x256 or larger

/// Inclusive range of the valid samples in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    /// A range where every value normalizes to `t = 0`.
    pub fn is_constant(&self) -> bool {
        self.max <= self.min
    }

    /// Normalize a value against this range.
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        normalize(value, self.min, self.max)
    }
}

/// Scan all samples for the minimum and maximum valid values.
///
/// Fails with [`OverlayError::EmptyRange`] when every sample is no-data.
pub fn compute_range(dataset: &RasterDataset) -> OverlayResult<ValueRange> {
    let policy = dataset.no_data();

    let (min, max) = dataset
        .samples()
        .iter()
        .copied()
        .filter(|&v| !policy.is_no_data(v))
        .fold(None, |acc: Option<(f32, f32)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .ok_or(OverlayError::EmptyRange)?;

    Ok(ValueRange { min, max })
}

/// Map `value` into `[0, 1]` relative to `[min, max]`.
///
/// A constant range (`max <= min`) maps every value to `0`. The arithmetic
/// runs in f64 so `max - min` cannot overflow for finite f32 bounds.
#[inline]
pub fn normalize(value: f32, min: f32, max: f32) -> f32 {
    if !(max > min) {
        return 0.0;
    }
    let (value, min, max) = (value as f64, min as f64, max as f64);
    let t = (value - min) / (max - min);
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0) as f32
    }
}

/// Evaluate a ramp at a normalized position.
#[inline]
pub fn colorize(t: f32, ramp: &ColorRamp) -> Rgb {
    ramp.color_at(t)
}

/// A colorized raster ready to be placed on a map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedOverlay {
    /// RGBA, 4 bytes per pixel, row 0 at the north edge
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Same bounds as the source dataset
    pub bbox: BoundingBox,
    pub range: ValueRange,
    pub ramp: String,
}

impl RenderedOverlay {
    /// RGBA of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Count of pixels with alpha 0.
    pub fn transparent_count(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] == 0).count()
    }

    pub fn metadata(&self) -> OverlayMetadata {
        OverlayMetadata {
            bounds: self.bbox.to_leaflet_bounds(),
            bbox: self.bbox,
            width: self.width,
            height: self.height,
            min_value: self.range.min,
            max_value: self.range.max,
            ramp: self.ramp.clone(),
        }
    }
}

/// Placement sidecar written next to an encoded overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMetadata {
    /// `[[south, west], [north, east]]`
    pub bounds: [[f64; 2]; 2],
    pub bbox: BoundingBox,
    pub width: usize,
    pub height: usize,
    pub min_value: f32,
    pub max_value: f32,
    pub ramp: String,
}

/// Render a dataset with its own valid range.
pub fn render(dataset: &RasterDataset, ramp: &ColorRamp) -> OverlayResult<RenderedOverlay> {
    let range = compute_range(dataset)?;
    Ok(render_with_range(dataset, ramp, range))
}

/// Render a dataset against a fixed range, e.g. to share a scale between
/// layers. Values outside the range clamp to the ramp ends.
pub fn render_with_range(
    dataset: &RasterDataset,
    ramp: &ColorRamp,
    range: ValueRange,
) -> RenderedOverlay {
    let width = dataset.width();
    let height = dataset.height();
    let samples = dataset.samples();
    let policy = dataset.no_data();
    let alpha = ramp.alpha();

    let mut pixels = vec![0u8; width * height * 4];

    let fill_row = |row: usize, out: &mut [u8]| {
        let src = &samples[row * width..(row + 1) * width];
        for (&value, px) in src.iter().zip(out.chunks_exact_mut(4)) {
            if policy.is_no_data(value) {
                px.copy_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let c = colorize(range.normalize(value), ramp);
            px.copy_from_slice(&[c.r, c.g, c.b, alpha]);
        }
    };

    if width * height >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        pixels
            .chunks_mut(width * 4)
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    }

    debug!(
        width,
        height,
        min = range.min,
        max = range.max,
        ramp = ramp.name(),
        "Rendered overlay"
    );

    RenderedOverlay {
        pixels,
        width,
        height,
        bbox: *dataset.bbox(),
        range,
        ramp: ramp.name().to_string(),
    }
}
