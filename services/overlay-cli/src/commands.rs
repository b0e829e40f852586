//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geotiff_loader::{load_with, LoaderOptions};
use layer_manager::{LayerManager, LayerSpec, LayersConfig, LoadOutcome};
use overlay_common::gauge::{classify_status, classify_trend, fill_fraction};
use overlay_common::{
    GaugeStatus, GaugeThresholds, InterpolationMethod, LayerId, NoDataPolicy, OverlayError, Trend,
};
use renderer::png::create_png_auto;
use renderer::{
    compute_range, encode_png, render_legend, LegendLabels, OverlayMetadata, QueryResult,
    RampConfig, RampRegistry, RenderedOverlay, ValueRange,
};
use serde::Serialize;
use tracing::{info, warn};

/// JSON written next to each overlay PNG.
#[derive(Debug, Serialize)]
pub struct LayerSidecar {
    pub id: LayerId,
    pub title: String,
    pub method: InterpolationMethod,
    #[serde(flatten)]
    pub overlay: OverlayMetadata,
    pub legend: LegendLabels,
}

impl LayerSidecar {
    fn new(spec: &LayerSpec, overlay: &RenderedOverlay) -> Self {
        Self {
            id: spec.id.clone(),
            title: spec.display_title().to_string(),
            method: spec.method,
            overlay: overlay.metadata(),
            legend: LegendLabels::from_range(&overlay.range),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LegendSize {
    pub width: usize,
    pub height: usize,
}

/// Load the layers config from `path`, or from `OVERLAY_LAYERS_CONFIG`.
pub fn load_config(path: Option<&Path>) -> Result<LayersConfig> {
    let config = match path {
        Some(path) => LayersConfig::from_file(path)?,
        None => LayersConfig::from_env()
            .context("No --config given and the environment names no layers file")?,
    };
    Ok(config)
}

/// Build the ramp registry for a config and validate the config against it.
pub fn build_manager(config: &LayersConfig, ramps_override: Option<&Path>) -> Result<LayerManager> {
    let mut ramps = RampRegistry::with_builtins();

    let ramps_file = ramps_override.or(config.ramps_file.as_deref());
    if let Some(path) = ramps_file {
        let ramp_config = RampConfig::from_file(path)?;
        let added = ramps.load_config(&ramp_config)?;
        info!(path = %path.display(), ramps = added, "Loaded color ramps");
    }

    config.validate(&ramps)?;
    Ok(LayerManager::new(ramps))
}

/// Load every layer and write `<id>.png`, `<id>.json` and `<id>_legend.png`.
///
/// Returns the number of layers written. Fails only when no layer could be
/// written at all.
pub async fn render_layers(
    config: &LayersConfig,
    ramps_override: Option<&Path>,
    out_dir: &Path,
    legend: LegendSize,
) -> Result<usize> {
    let manager = build_manager(config, ramps_override)?;
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let outcomes = manager.load_all(&config.layers).await;

    let mut written = 0;
    for (spec, (_, outcome)) in config.layers.iter().zip(outcomes) {
        match outcome {
            LoadOutcome::Applied => {}
            LoadOutcome::Failed(e) => {
                warn!(layer = %spec.id, kind = e.kind(), error = %e, "Skipping layer");
                continue;
            }
            LoadOutcome::Stale => continue,
        }

        let Some(overlay) = manager.overlay(&spec.id).await else {
            warn!(layer = %spec.id, "Layer has no valid samples; nothing to draw");
            continue;
        };

        let Some(ramp) = manager.ramps().get(&spec.ramp) else {
            continue;
        };

        write_layer(spec, &overlay, &ramp, out_dir, legend).await?;
        written += 1;
    }

    if written == 0 {
        bail!("No layer could be rendered ({} configured)", config.layers.len());
    }

    info!(written, total = config.layers.len(), out_dir = %out_dir.display(), "Render complete");
    Ok(written)
}

async fn write_layer(
    spec: &LayerSpec,
    overlay: &RenderedOverlay,
    ramp: &renderer::ColorRamp,
    out_dir: &Path,
    legend: LegendSize,
) -> Result<()> {
    let png = encode_png(overlay)?;
    let png_path = out_dir.join(format!("{}.png", spec.id));
    tokio::fs::write(&png_path, &png)
        .await
        .with_context(|| format!("Failed to write {:?}", png_path))?;

    let sidecar = serde_json::to_vec_pretty(&LayerSidecar::new(spec, overlay))?;
    let json_path = out_dir.join(format!("{}.json", spec.id));
    tokio::fs::write(&json_path, sidecar)
        .await
        .with_context(|| format!("Failed to write {:?}", json_path))?;

    let strip = render_legend(ramp, legend.width, legend.height);
    let legend_png = create_png_auto(&strip, legend.width, legend.height)?;
    let legend_path = out_dir.join(format!("{}_legend.png", spec.id));
    tokio::fs::write(&legend_path, legend_png)
        .await
        .with_context(|| format!("Failed to write {:?}", legend_path))?;

    info!(
        layer = %spec.id,
        png = %png_path.display(),
        bytes = png.len(),
        "Wrote overlay"
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub layer: LayerId,
    pub result: QueryResult,
}

/// Load the chosen (or active) layer and sample it at a coordinate.
pub async fn query_layer(
    config: &LayersConfig,
    ramps_override: Option<&Path>,
    layer: Option<LayerId>,
    lat: f64,
    lon: f64,
) -> Result<QueryReport> {
    let manager = build_manager(config, ramps_override)?;

    let id = match layer.as_ref().or(config.initial_active()) {
        Some(id) => id.clone(),
        None => bail!("No layer to query"),
    };
    let spec = config
        .get(&id)
        .ok_or_else(|| OverlayError::LayerNotFound(id.to_string()))?;

    if let LoadOutcome::Failed(e) = manager.load_layer(spec).await {
        return Err(e).with_context(|| format!("Layer '{}' failed to load", id));
    }
    manager.set_active(&id).await?;

    let result = manager.query_active(lat, lon).await?;
    Ok(QueryReport { layer: id, result })
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub bbox: overlay_common::BoundingBox,
    pub pixel_size: (f64, f64),
    pub valid_samples: usize,
    pub no_data: NoDataPolicy,
    /// `None` when every sample is no-data
    pub range: Option<ValueRange>,
}

/// Decode a GeoTIFF and summarize it.
pub async fn inspect_file(path: &Path, sentinels: &[f32], band: usize) -> Result<InspectReport> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    let no_data = sentinels
        .iter()
        .fold(NoDataPolicy::none(), |policy, &v| policy.with_value(v));
    let options = LoaderOptions::default().with_no_data(no_data).with_band(band);
    let dataset = load_with(&bytes, &options)?;

    let range = match compute_range(&dataset) {
        Ok(range) => Some(range),
        Err(OverlayError::EmptyRange) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(InspectReport {
        path: path.to_path_buf(),
        width: dataset.width(),
        height: dataset.height(),
        bbox: *dataset.bbox(),
        pixel_size: dataset.pixel_size(),
        valid_samples: dataset.valid_count(),
        no_data: dataset.no_data().clone(),
        range,
    })
}

#[derive(Debug, Serialize)]
pub struct GaugeReport {
    pub status: GaugeStatus,
    /// Absent without a previous reading
    pub trend: Option<Trend>,
    pub fill_fraction: f64,
    pub thresholds: GaugeThresholds,
}

pub fn classify_gauge(
    current: f64,
    normal: f64,
    max: f64,
    previous: Option<f64>,
    thresholds: &GaugeThresholds,
) -> GaugeReport {
    GaugeReport {
        status: classify_status(current, normal, max, thresholds),
        trend: previous.map(|p| classify_trend(current, p, thresholds)),
        fill_fraction: fill_fraction(current, max),
        thresholds: *thresholds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_manager::SourceSpec;
    use test_utils::{encode_geotiff, encode_geotiff_with_nodata, scenario};

    const LEGEND: LegendSize = LegendSize {
        width: 32,
        height: 4,
    };

    fn config_for(dir: &Path, names: &[&str]) -> LayersConfig {
        LayersConfig {
            ramps_file: None,
            active: None,
            layers: names
                .iter()
                .map(|name| {
                    LayerSpec::new(
                        *name,
                        SourceSpec::File {
                            path: dir.join(format!("{}.tif", name)),
                        },
                    )
                    .with_no_data(NoDataPolicy::sentinel(scenario::SENTINEL))
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_render_writes_outputs_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let tiff = encode_geotiff(4, 4, &scenario::SAMPLES, scenario::EXTENT);
        std::fs::write(dir.path().join("nearest.tif"), tiff).unwrap();

        let config = config_for(dir.path(), &["nearest", "idw"]);
        let out = dir.path().join("out");
        let written = render_layers(&config, None, &out, LEGEND).await.unwrap();
        assert_eq!(written, 1);

        assert!(out.join("nearest.png").exists());
        assert!(out.join("nearest_legend.png").exists());
        assert!(!out.join("idw.png").exists());

        let sidecar: serde_json::Value =
            serde_json::from_slice(&std::fs::read(out.join("nearest.json")).unwrap()).unwrap();
        assert_eq!(sidecar["id"], "nearest");
        assert_eq!(sidecar["method"], "nearest");
        assert_eq!(sidecar["bounds"][0][0], 10.0);
        assert_eq!(sidecar["min_value"], 1.0);
        assert_eq!(sidecar["legend"]["high"], "16.00");
    }

    #[tokio::test]
    async fn test_render_fails_when_every_layer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), &["a", "b"]);
        let out = dir.path().join("out");
        assert!(render_layers(&config, None, &out, LEGEND).await.is_err());
    }

    #[tokio::test]
    async fn test_query_uses_first_layer_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let tiff = encode_geotiff(4, 4, &scenario::SAMPLES, scenario::EXTENT);
        std::fs::write(dir.path().join("nearest.tif"), tiff).unwrap();
        let config = config_for(dir.path(), &["nearest"]);

        let report = query_layer(&config, None, None, 10.9, 100.1).await.unwrap();
        assert_eq!(report.layer, LayerId::from("nearest"));
        assert_eq!(report.result.value(), Some(1.0));

        let sentinel = query_layer(&config, None, None, 10.625, 100.375)
            .await
            .unwrap();
        assert_eq!(sentinel.result, QueryResult::NotFound);
    }

    #[tokio::test]
    async fn test_query_unknown_layer() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), &["nearest"]);
        let err = query_layer(&config, None, Some("ghost".into()), 0.0, 0.0).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_inspect_reports_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.tif");
        std::fs::write(
            &path,
            encode_geotiff_with_nodata(4, 4, &scenario::SAMPLES, scenario::EXTENT, "-9999"),
        )
        .unwrap();

        let report = inspect_file(&path, &[], 0).await.unwrap();
        assert_eq!((report.width, report.height), (4, 4));
        assert_eq!(report.valid_samples, 15);
        assert_eq!(report.range, Some(ValueRange { min: 1.0, max: 16.0 }));
    }

    #[test]
    fn test_load_config_from_path_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.yaml");
        std::fs::write(
            &path,
            "layers:\n  - { id: nearest, source: { type: file, path: nearest.tif } }\n",
        )
        .unwrap();

        let explicit = load_config(Some(&path)).unwrap();
        assert_eq!(
            explicit.layers[0].source,
            SourceSpec::File {
                path: dir.path().join("nearest.tif")
            }
        );

        std::env::set_var(layer_manager::LAYERS_CONFIG_ENV, &path);
        let from_env = load_config(None).unwrap();
        std::env::remove_var(layer_manager::LAYERS_CONFIG_ENV);
        assert_eq!(from_env.layers[0].id, LayerId::from("nearest"));

        assert!(load_config(None).is_err());
    }

    #[test]
    fn test_classify_gauge() {
        let report = classify_gauge(8.5, 5.0, 10.0, Some(8.0), &GaugeThresholds::default());
        assert_eq!(report.status, GaugeStatus::High);
        assert_eq!(report.trend, Some(Trend::Up));
        assert_eq!(report.fill_fraction, 0.85);

        let detail = classify_gauge(8.5, 5.0, 10.0, None, &GaugeThresholds::detail_page());
        assert_eq!(detail.status, GaugeStatus::Normal);
        assert_eq!(detail.trend, None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "high");
        assert_eq!(json["trend"], "up");
    }
}
