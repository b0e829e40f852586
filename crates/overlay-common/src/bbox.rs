//! Geographic bounding box of a raster.

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, OverlayResult};

/// A geographic bounding box in degrees (EPSG:4326).
///
/// Invariant: `min_lon < max_lon` and `min_lat < max_lat`, all finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates, validating the extent.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> OverlayResult<Self> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a "minlon,minlat,maxlon,maxlat" string.
    pub fn from_csv(s: &str) -> OverlayResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(OverlayError::InvalidBbox(format!(
                "{}. Expected 'minlon,minlat,maxlon,maxlat'",
                s
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| OverlayError::InvalidBbox(format!("invalid number '{}'", part)))?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Check the ordering and finiteness invariant.
    pub fn validate(&self) -> OverlayResult<()> {
        let all_finite = [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(OverlayError::InvalidBbox(format!(
                "non-finite bounds {:?}",
                self
            )));
        }
        if self.min_lon >= self.max_lon {
            return Err(OverlayError::InvalidBbox(format!(
                "min_lon {} must be less than max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat >= self.max_lat {
            return Err(OverlayError::InvalidBbox(format!(
                "min_lat {} must be less than max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a coordinate falls inside the box.
    ///
    /// The max edges are exclusive so that every contained point maps to
    /// exactly one pixel.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lon >= self.min_lon && lon < self.max_lon && lat > self.min_lat && lat <= self.max_lat
    }

    /// Corner pairs in `[lat, lon]` order, south-west first, as expected by
    /// map display libraries for image overlays.
    pub fn to_leaflet_bounds(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lon], [self.max_lat, self.max_lon]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_bbox() {
        let bbox = BoundingBox::from_csv("98.9,18.6,99.1,18.8").unwrap();
        assert_eq!(bbox.min_lon, 98.9);
        assert_eq!(bbox.min_lat, 18.6);
        assert_eq!(bbox.max_lon, 99.1);
        assert_eq!(bbox.max_lat, 18.8);
    }

    #[test]
    fn test_rejects_inverted_extent() {
        assert!(matches!(
            BoundingBox::new(101.0, 10.0, 100.0, 11.0),
            Err(OverlayError::InvalidBbox(_))
        ));
        assert!(matches!(
            BoundingBox::new(100.0, 11.0, 101.0, 11.0),
            Err(OverlayError::InvalidBbox(_))
        ));
    }
}
