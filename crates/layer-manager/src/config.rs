//! Layer configuration loader.
//!
//! Layers are declared in a YAML file:
//!
//! ```yaml
//! ramps_file: ramps.json
//! active: water_level_idw
//! layers:
//!   - id: water_level_nearest
//!     title: Water level (nearest neighbor)
//!     method: nearest
//!     source:
//!       type: file
//!       path: data/cnxlpn_nearest.tif
//!     ramp: water_blue
//!     no_data:
//!       values: [-9999, 0]
//!   - id: water_level_idw
//!     title: Water level (IDW)
//!     method: idw
//!     source:
//!       type: url
//!       url: ${RASTER_BASE_URL:-http://localhost:8080}/cnxlpn_idw.tif
//! ```
//!
//! `${VAR}` and `${VAR:-default}` are substituted from the environment
//! before parsing. Relative file paths resolve against the config file's
//! directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use geotiff_loader::{FileSource, HttpSource, LoaderOptions, RasterSource};
use overlay_common::{InterpolationMethod, LayerId, NoDataPolicy, OverlayError, OverlayResult};
use renderer::RampRegistry;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Environment variable naming the layers file.
pub const LAYERS_CONFIG_ENV: &str = "OVERLAY_LAYERS_CONFIG";

/// Where a layer's raster bytes come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    File { path: PathBuf },
    Url { url: String },
}

impl SourceSpec {
    pub fn to_source(&self) -> OverlayResult<Box<dyn RasterSource>> {
        match self {
            SourceSpec::File { path } => Ok(Box::new(FileSource::new(path.clone()))),
            SourceSpec::Url { url } => Ok(Box::new(HttpSource::new(url.clone())?)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceSpec::File { path } => path.display().to_string(),
            SourceSpec::Url { url } => url.clone(),
        }
    }
}

fn default_ramp() -> String {
    "water_blue".to_string()
}

fn default_true() -> bool {
    true
}

/// One overlay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: LayerId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub method: InterpolationMethod,
    pub source: SourceSpec,
    #[serde(default = "default_ramp")]
    pub ramp: String,
    #[serde(default)]
    pub no_data: NoDataPolicy,
    #[serde(default)]
    pub band: usize,
    #[serde(default = "default_true")]
    pub honor_gdal_nodata: bool,
}

impl LayerSpec {
    pub fn new(id: impl Into<LayerId>, source: SourceSpec) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            method: InterpolationMethod::default(),
            source,
            ramp: default_ramp(),
            no_data: NoDataPolicy::default(),
            band: 0,
            honor_gdal_nodata: true,
        }
    }

    pub fn with_ramp(mut self, ramp: impl Into<String>) -> Self {
        self.ramp = ramp.into();
        self
    }

    pub fn with_no_data(mut self, no_data: NoDataPolicy) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn with_method(mut self, method: InterpolationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            band: self.band,
            no_data: self.no_data.clone(),
            honor_gdal_nodata: self.honor_gdal_nodata,
        }
    }

    /// Title for display, falling back to the id.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            self.id.as_str()
        } else {
            &self.title
        }
    }
}

/// All configured layers plus the initially active one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayersConfig {
    /// Optional JSON file with extra color ramps
    #[serde(default)]
    pub ramps_file: Option<PathBuf>,
    #[serde(default)]
    pub active: Option<LayerId>,
    pub layers: Vec<LayerSpec>,
}

impl LayersConfig {
    /// Parse YAML after environment substitution.
    pub fn from_yaml(content: &str) -> OverlayResult<Self> {
        let expanded = expand_env_vars(content)?;
        serde_yaml::from_str(&expanded)
            .map_err(|e| OverlayError::Config(format!("invalid layers YAML: {}", e)))
    }

    /// Load from a file, resolving relative paths against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            OverlayError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        info!(
            path = %path.display(),
            layers = config.layers.len(),
            "Loaded layer configuration"
        );
        Ok(config)
    }

    /// Load from the file named by `OVERLAY_LAYERS_CONFIG`.
    pub fn from_env() -> OverlayResult<Self> {
        let path = std::env::var(LAYERS_CONFIG_ENV)
            .map_err(|_| OverlayError::Config(format!("{} is not set", LAYERS_CONFIG_ENV)))?;
        Self::from_file(path)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(ramps) = &self.ramps_file {
            if ramps.is_relative() {
                self.ramps_file = Some(base.join(ramps));
            }
        }
        for layer in &mut self.layers {
            if let SourceSpec::File { path } = &mut layer.source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    /// Check ids are unique, ramps exist and the active layer is declared.
    pub fn validate(&self, ramps: &RampRegistry) -> OverlayResult<()> {
        if self.layers.is_empty() {
            return Err(OverlayError::Config("no layers configured".to_string()));
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            if !seen.insert(&layer.id) {
                return Err(OverlayError::Config(format!(
                    "duplicate layer id '{}'",
                    layer.id
                )));
            }
            if !ramps.contains(&layer.ramp) {
                return Err(OverlayError::Config(format!(
                    "layer '{}' uses unknown ramp '{}' (available: {})",
                    layer.id,
                    layer.ramp,
                    ramps.names().join(", ")
                )));
            }
        }

        if let Some(active) = &self.active {
            if !seen.contains(active) {
                return Err(OverlayError::Config(format!(
                    "active layer '{}' is not configured",
                    active
                )));
            }
        }

        Ok(())
    }

    pub fn get(&self, id: &LayerId) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// The configured active layer, or the first one.
    pub fn initial_active(&self) -> Option<&LayerId> {
        self.active
            .as_ref()
            .or_else(|| self.layers.first().map(|l| &l.id))
    }
}

/// Substitute `${VAR}` and `${VAR:-default}`.
fn expand_env_vars(content: &str) -> OverlayResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => expr.push(c),
                    None => {
                        return Err(OverlayError::Config(format!(
                            "unclosed variable substitution: ${{{}",
                            expr
                        )))
                    }
                }
            }
            result.push_str(&resolve_var(&expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var(expr: &str) -> OverlayResult<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        return Ok(std::env::var(name.trim()).unwrap_or_else(|_| default.to_string()));
    }
    std::env::var(expr.trim())
        .map_err(|_| OverlayError::Config(format!("environment variable {} is not set", expr)))
}
