//! Decoded single-band raster.

use crate::bbox::BoundingBox;
use crate::error::{OverlayError, OverlayResult};
use crate::nodata::NoDataPolicy;

/// A decoded raster: band samples plus the geometry needed to place them.
///
/// Samples are row-major with row 0 at the north edge. The dataset is
/// immutable once built; a reload produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDataset {
    samples: Vec<f32>,
    width: usize,
    height: usize,
    bbox: BoundingBox,
    no_data: NoDataPolicy,
}

impl RasterDataset {
    /// Build a dataset, checking that the sample count matches the dimensions.
    pub fn new(
        samples: Vec<f32>,
        width: usize,
        height: usize,
        bbox: BoundingBox,
        no_data: NoDataPolicy,
    ) -> OverlayResult<Self> {
        if width == 0 || height == 0 {
            return Err(OverlayError::decode(format!(
                "raster dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| OverlayError::decode("raster dimensions overflow"))?;
        if samples.len() != expected {
            return Err(OverlayError::decode(format!(
                "expected {} samples for {}x{}, got {}",
                expected,
                width,
                height,
                samples.len()
            )));
        }
        bbox.validate()?;

        Ok(Self {
            samples,
            width,
            height,
            bbox,
            no_data,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn no_data(&self) -> &NoDataPolicy {
        &self.no_data
    }

    /// Row-major index of pixel `(x, y)`, if inside the grid.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Raw sample at pixel `(x, y)`, sentinels included.
    pub fn sample(&self, x: usize, y: usize) -> Option<f32> {
        self.index(x, y).map(|idx| self.samples[idx])
    }

    /// Whether the sample at `idx` is a no-data value.
    #[inline]
    pub fn is_no_data_at(&self, idx: usize) -> bool {
        self.samples
            .get(idx)
            .map_or(true, |&v| self.no_data.is_no_data(v))
    }

    /// Number of samples that carry a measurement.
    pub fn valid_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|&&v| !self.no_data.is_no_data(v))
            .count()
    }

    /// Pixel size in degrees as `(lon, lat)`.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.width as f64,
            self.bbox.height() / self.height as f64,
        )
    }
}
