//! Common test fixtures for overlay tests.

use overlay_common::{BoundingBox, NoDataPolicy, RasterDataset};

/// Common extents for testing, as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod extent {
    /// One-degree square used by the reference scenario
    pub const UNIT_SQUARE: (f64, f64, f64, f64) = (100.0, 10.0, 101.0, 11.0);

    /// Chiang Mai / Lamphun basin (water-level rasters)
    pub const CHIANG_MAI: (f64, f64, f64, f64) = (98.85, 18.45, 99.15, 18.85);
}

/// The 4x4 reference scenario.
///
/// Index 5 holds the `-9999` sentinel; every other sample is its 1-based
/// position, so the valid range is `[1, 16]`.
pub mod scenario {
    pub const WIDTH: usize = 4;
    pub const HEIGHT: usize = 4;
    pub const SENTINEL: f32 = -9999.0;
    pub const SAMPLES: [f32; 16] = [
        1.0, 2.0, 3.0, 4.0, //
        5.0, -9999.0, 7.0, 8.0, //
        9.0, 10.0, 11.0, 12.0, //
        13.0, 14.0, 15.0, 16.0,
    ];
    pub const EXTENT: (f64, f64, f64, f64) = super::extent::UNIT_SQUARE;
}

/// Build a bounding box from an extent tuple.
pub fn bbox(extent: (f64, f64, f64, f64)) -> BoundingBox {
    BoundingBox::new(extent.0, extent.1, extent.2, extent.3).expect("fixture extent is valid")
}

/// The 4x4 reference scenario as a dataset.
pub fn scenario_dataset() -> RasterDataset {
    RasterDataset::new(
        scenario::SAMPLES.to_vec(),
        scenario::WIDTH,
        scenario::HEIGHT,
        bbox(scenario::EXTENT),
        NoDataPolicy::sentinel(scenario::SENTINEL),
    )
    .expect("scenario dataset is valid")
}

/// A dataset over `extent` with arbitrary samples.
pub fn dataset(
    samples: Vec<f32>,
    width: usize,
    height: usize,
    extent: (f64, f64, f64, f64),
    no_data: NoDataPolicy,
) -> RasterDataset {
    RasterDataset::new(samples, width, height, bbox(extent), no_data)
        .expect("fixture dataset is valid")
}
