//! Color ramps for raster overlays.
//!
//! A ramp is an ordered list of `(position, color)` stops over `[0, 1]`.
//! Consecutive stops bound a segment that is interpolated linearly, so the
//! segment boundaries are data rather than code and ramps can be swapped
//! per layer. Ramps are loaded from JSON alongside a set of built-ins.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use overlay_common::{OverlayError, OverlayResult};
use serde::{Deserialize, Serialize};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear interpolation towards `other`, `t` in `[0, 1]`. Channels are
    /// truncated, not rounded.
    #[inline]
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        #[inline]
        fn channel(a: u8, b: u8, t: f32) -> u8 {
            let v = a as f32 + (b as f32 - a as f32) * t;
            v.clamp(0.0, 255.0) as u8
        }

        Rgb {
            r: channel(self.r, other.r, t),
            g: channel(self.g, other.g, t),
            b: channel(self.b, other.b, t),
        }
    }
}

/// A single ramp stop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position in `[0, 1]`
    pub position: f32,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(position: f32, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// Piecewise-linear color ramp.
///
/// Invariants (checked by [`ColorRamp::new`]): at least two stops, the first
/// at `0.0`, the last at `1.0`, positions strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    name: String,
    stops: Vec<ColorStop>,
    alpha: u8,
}

impl ColorRamp {
    pub fn new(name: impl Into<String>, stops: Vec<ColorStop>, alpha: u8) -> OverlayResult<Self> {
        let name = name.into();

        if stops.len() < 2 {
            return Err(OverlayError::InvalidRamp(format!(
                "{}: needs at least 2 stops, got {}",
                name,
                stops.len()
            )));
        }
        if stops[0].position != 0.0 || stops[stops.len() - 1].position != 1.0 {
            return Err(OverlayError::InvalidRamp(format!(
                "{}: stops must start at 0.0 and end at 1.0",
                name
            )));
        }
        if let Some(pair) = stops.windows(2).find(|w| !(w[0].position < w[1].position)) {
            return Err(OverlayError::InvalidRamp(format!(
                "{}: stop positions must be strictly increasing ({} then {})",
                name, pair[0].position, pair[1].position
            )));
        }

        Ok(Self { name, stops, alpha })
    }

    /// Ramp with colors spread evenly over `[0, 1]`.
    pub fn evenly_spaced(name: impl Into<String>, colors: &[Rgb], alpha: u8) -> OverlayResult<Self> {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, &color)| ColorStop::new(i as f32 / last, color))
            .collect();
        Self::new(name, stops, alpha)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Alpha applied to every colored pixel.
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Evaluate the ramp at `t`. Values outside `[0, 1]` are clamped and NaN
    /// maps to the `t = 0` color.
    pub fn color_at(&self, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.position {
                let local = (t - lo.position) / (hi.position - lo.position);
                return lo.color.lerp(hi.color, local);
            }
        }

        self.stops[self.stops.len() - 1].color
    }

    /// Matplotlib viridis, 11 control points.
    pub fn viridis() -> Self {
        const VIRIDIS: [Rgb; 11] = [
            Rgb::new(68, 1, 84),
            Rgb::new(72, 36, 117),
            Rgb::new(65, 68, 135),
            Rgb::new(53, 95, 141),
            Rgb::new(42, 120, 142),
            Rgb::new(33, 145, 140),
            Rgb::new(34, 168, 132),
            Rgb::new(68, 191, 112),
            Rgb::new(122, 209, 81),
            Rgb::new(189, 223, 38),
            Rgb::new(253, 231, 37),
        ];
        Self::builtin(Self::evenly_spaced("viridis", &VIRIDIS, 255))
    }

    /// Water level: deep blue, through cyan, to yellow; slightly translucent.
    pub fn water_blue() -> Self {
        Self::builtin(Self::new(
            "water_blue",
            vec![
                ColorStop::new(0.0, Rgb::new(0, 100, 200)),
                ColorStop::new(0.5, Rgb::new(0, 200, 255)),
                ColorStop::new(1.0, Rgb::new(255, 220, 0)),
            ],
            200,
        ))
    }

    /// Three-segment light-to-dark blue gradient.
    pub fn blue_gradient() -> Self {
        Self::builtin(Self::new(
            "blue_gradient",
            vec![
                ColorStop::new(0.0, Rgb::new(222, 235, 247)),
                ColorStop::new(0.33, Rgb::new(158, 202, 225)),
                ColorStop::new(0.66, Rgb::new(66, 146, 198)),
                ColorStop::new(1.0, Rgb::new(8, 48, 107)),
            ],
            255,
        ))
    }

    fn builtin(ramp: OverlayResult<Self>) -> Self {
        match ramp {
            Ok(ramp) => ramp,
            Err(e) => unreachable!("built-in ramp is invalid: {}", e),
        }
    }
}

/// Ramp definitions loaded from JSON.
///
/// ```json
/// {
///   "version": "1.0",
///   "ramps": {
///     "flood": {
///       "alpha": 220,
///       "stops": [
///         { "position": 0.0, "color": "#ffffcc" },
///         { "position": 1.0, "color": "#253494" }
///       ]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub ramps: HashMap<String, RampDefinition>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_alpha() -> u8 {
    255
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_alpha")]
    pub alpha: u8,
    pub stops: Vec<StopDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDefinition {
    pub position: f32,
    /// Hex color, `#RRGGBB`
    pub color: String,
}

impl RampConfig {
    /// Parse ramp configuration from a JSON string.
    pub fn from_json(json: &str) -> OverlayResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OverlayError::Config(format!("invalid ramp JSON: {}", e)))
    }

    /// Load ramp configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Build validated ramps, sorted by name.
    pub fn build(&self) -> OverlayResult<Vec<ColorRamp>> {
        let mut names: Vec<&String> = self.ramps.keys().collect();
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let def = &self.ramps[name];
                let stops = def
                    .stops
                    .iter()
                    .map(|s| {
                        Rgb::from_hex(&s.color)
                            .map(|color| ColorStop::new(s.position, color))
                            .ok_or_else(|| {
                                OverlayError::InvalidRamp(format!(
                                    "{}: invalid color '{}'",
                                    name, s.color
                                ))
                            })
                    })
                    .collect::<OverlayResult<Vec<_>>>()?;
                ColorRamp::new(name.clone(), stops, def.alpha)
            })
            .collect()
    }
}

/// Named ramps shared by every overlay.
#[derive(Debug, Clone, Default)]
pub struct RampRegistry {
    ramps: HashMap<String, Arc<ColorRamp>>,
}

impl RampRegistry {
    /// Registry containing `viridis`, `water_blue` and `blue_gradient`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        registry.insert(ColorRamp::viridis());
        registry.insert(ColorRamp::water_blue());
        registry.insert(ColorRamp::blue_gradient());
        registry
    }

    /// Add or replace a ramp under its own name.
    pub fn insert(&mut self, ramp: ColorRamp) {
        self.ramps.insert(ramp.name().to_string(), Arc::new(ramp));
    }

    /// Add every ramp from a configuration; the whole config is rejected if
    /// any ramp is invalid.
    pub fn load_config(&mut self, config: &RampConfig) -> OverlayResult<usize> {
        let ramps = config.build()?;
        let count = ramps.len();
        for ramp in ramps {
            self.insert(ramp);
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ColorRamp>> {
        self.ramps.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ramps.contains_key(name)
    }

    /// Registered ramp names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ramps.keys().cloned().collect();
        names.sort();
        names
    }
}
