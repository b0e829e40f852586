//! GeoTIFF raster loading.
//!
//! Turns a byte buffer holding a georeferenced TIFF into a [`RasterDataset`]:
//! one band of samples, the pixel dimensions and the geographic bounding box.
//! No normalization or coloring happens here.
//!
//! Bytes come from a [`RasterSource`]; fetching is the only await point in
//! the load path, decoding is synchronous.

pub mod decode;
pub mod source;

pub use decode::{load, load_with, LoaderOptions};
pub use source::{FileSource, HttpSource, MemorySource, RasterSource};

use overlay_common::{OverlayResult, RasterDataset};
use tracing::{debug, warn};

/// Fetch bytes from `source` and decode them.
pub async fn fetch_and_load(
    source: &dyn RasterSource,
    options: &LoaderOptions,
) -> OverlayResult<RasterDataset> {
    let location = source.describe();
    let bytes = source.fetch().await.map_err(|e| {
        warn!(source = %location, error = %e, "Raster fetch failed");
        e
    })?;

    debug!(source = %location, bytes = bytes.len(), "Fetched raster");

    let dataset = load_with(&bytes, options)?;
    debug!(
        source = %location,
        width = dataset.width(),
        height = dataset.height(),
        valid = dataset.valid_count(),
        "Decoded raster"
    );
    Ok(dataset)
}
