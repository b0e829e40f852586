//! Water-level overlay tool.
//!
//! Renders georeferenced rasters to map-ready PNG overlays with a JSON
//! placement sidecar, samples a layer at a coordinate, inspects raster
//! files and classifies gauge readings.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use overlay_common::{GaugeThresholds, LayerId};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use commands::LegendSize;

#[derive(Parser, Debug)]
#[command(name = "gauge-overlay")]
#[command(about = "Render and query water-level raster overlays", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every configured layer to PNG + JSON sidecar
    Render {
        /// Layers YAML file (default: $OVERLAY_LAYERS_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,

        /// Extra color ramps (JSON), overrides `ramps_file` in the config
        #[arg(long, env = "OVERLAY_RAMPS")]
        ramps: Option<PathBuf>,

        /// Legend strip width in pixels
        #[arg(long, default_value = "256")]
        legend_width: usize,

        /// Legend strip height in pixels
        #[arg(long, default_value = "16")]
        legend_height: usize,
    },

    /// Sample a layer at a coordinate
    Query {
        /// Layers YAML file (default: $OVERLAY_LAYERS_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Layer to query (default: the active layer in the config)
        #[arg(short, long)]
        layer: Option<String>,

        /// Extra color ramps (JSON)
        #[arg(long, env = "OVERLAY_RAMPS")]
        ramps: Option<PathBuf>,
    },

    /// Decode a GeoTIFF and print its size, bounds and value range
    Inspect {
        /// GeoTIFF file
        file: PathBuf,

        /// No-data sentinel (repeatable)
        #[arg(long = "no-data", allow_hyphen_values = true)]
        no_data: Vec<f32>,

        /// Band to read
        #[arg(long, default_value = "0")]
        band: usize,
    },

    /// Classify a gauge reading against its normal and maximum levels
    Gauge {
        /// Current water level (m)
        #[arg(long, allow_hyphen_values = true)]
        current: f64,

        /// Normal water level (m)
        #[arg(long)]
        normal: f64,

        /// Maximum (bank-full) level (m)
        #[arg(long)]
        max: f64,

        /// Previous reading, for the trend
        #[arg(long, allow_hyphen_values = true)]
        previous: Option<f64>,

        /// Use the station detail cut-offs
        #[arg(long)]
        detail: bool,
    },
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs)?;

    match cli.command {
        Commands::Render {
            config,
            out_dir,
            ramps,
            legend_width,
            legend_height,
        } => {
            let layers = commands::load_config(config.as_deref())?;
            let legend = LegendSize {
                width: legend_width.max(1),
                height: legend_height.max(1),
            };
            let written =
                commands::render_layers(&layers, ramps.as_deref(), &out_dir, legend).await?;
            info!(written, "Done");
        }
        Commands::Query {
            config,
            lat,
            lon,
            layer,
            ramps,
        } => {
            let layers = commands::load_config(config.as_deref())?;
            let report = commands::query_layer(
                &layers,
                ramps.as_deref(),
                layer.map(LayerId::new),
                lat,
                lon,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Inspect {
            file,
            no_data,
            band,
        } => {
            let report = commands::inspect_file(&file, &no_data, band).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Gauge {
            current,
            normal,
            max,
            previous,
            detail,
        } => {
            let thresholds = if detail {
                GaugeThresholds::detail_page()
            } else {
                GaugeThresholds::default()
            };
            let report = commands::classify_gauge(current, normal, max, previous, &thresholds);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
