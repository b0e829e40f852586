//! Error types for raster loading, rendering and layer management.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay operations.
///
/// Every variant is local to the layer that produced it. A point query that
/// lands on no data is not an error and is reported through the query result
/// instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    // === Data Errors ===
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Raster has no valid samples: every pixel is no-data")]
    EmptyRange,

    #[error("Failed to fetch raster from {location}: {message}")]
    Fetch { location: String, message: String },

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    // === Rendering Errors ===
    #[error("Invalid color ramp: {0}")]
    InvalidRamp(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    // === Layer Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OverlayError {
    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a Fetch error.
    pub fn fetch(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            OverlayError::Decode(_) => "decode",
            OverlayError::EmptyRange => "empty_range",
            OverlayError::Fetch { .. } => "fetch",
            OverlayError::InvalidBbox(_) => "invalid_bbox",
            OverlayError::InvalidRamp(_) => "invalid_ramp",
            OverlayError::Encode(_) => "encode",
            OverlayError::LayerNotFound(_) => "layer_not_found",
            OverlayError::Config(_) => "config",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::Fetch {
            location: "local".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Config(format!("JSON error: {}", err))
    }
}
