//! Layer identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an overlay layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Interpolation method a raster layer was produced with.
///
/// Layers covering the same extent with different methods are alternatives;
/// only one is active for queries at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Nearest neighbor.
    #[default]
    #[serde(alias = "nn")]
    Nearest,
    /// Inverse distance weighting.
    #[serde(alias = "idw", alias = "inverse-distance")]
    InverseDistance,
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::InverseDistance => write!(f, "idw"),
        }
    }
}
