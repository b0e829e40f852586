//! Legend strips for color ramps.

use serde::{Deserialize, Serialize};

use crate::gradient::{colorize, ValueRange};
use crate::ramp::ColorRamp;

/// Render a horizontal legend strip: `t = 0` on the left, `t = 1` on the
/// right. Returns RGBA bytes, `width * height * 4` long.
pub fn render_legend(ramp: &ColorRamp, width: usize, height: usize) -> Vec<u8> {
    let mut row = Vec::with_capacity(width * 4);
    let span = width.saturating_sub(1).max(1) as f32;
    for x in 0..width {
        let c = colorize(x as f32 / span, ramp);
        row.extend_from_slice(&[c.r, c.g, c.b, 255]);
    }

    row.repeat(height)
}

/// Low, middle and high labels shown under a legend strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendLabels {
    pub low: String,
    pub mid: String,
    pub high: String,
}

impl LegendLabels {
    pub fn from_range(range: &ValueRange) -> Self {
        let mid = range.min + (range.max - range.min) / 2.0;
        Self {
            low: format!("{:.2}", range.min),
            mid: format!("{:.2}", mid),
            high: format!("{:.2}", range.max),
        }
    }
}
