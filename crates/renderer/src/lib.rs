//! Raster overlay rendering.
//!
//! - Color ramps and the ramp registry
//! - Range scan, normalization and colorization
//! - PNG encoding of rendered overlays
//! - Legend strips and point queries

pub mod gradient;
pub mod legend;
pub mod png;
pub mod query;
pub mod ramp;

pub use gradient::{
    colorize, compute_range, normalize, render, render_with_range, OverlayMetadata,
    RenderedOverlay, ValueRange,
};
pub use legend::{render_legend, LegendLabels};
pub use png::encode_png;
pub use query::{pixel_center, pixel_for, query_at, QueryResult, SampleQuery};
pub use ramp::{ColorRamp, ColorStop, RampConfig, RampRegistry, Rgb};
