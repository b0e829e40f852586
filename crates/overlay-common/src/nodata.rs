//! No-data sentinel configuration.
//!
//! Which sample values mean "no measurement" is configured per dataset rather
//! than inferred from magnitudes. A policy combines exact sentinel values with
//! an optional threshold; NaN and infinities are always treated as no-data.

use serde::{Deserialize, Serialize};

/// Sentinel set for a single raster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoDataPolicy {
    /// Exact sentinel values (e.g. `-9999`, `0`).
    #[serde(default)]
    pub values: Vec<f32>,

    /// Any value at or below this threshold is no-data.
    #[serde(default)]
    pub at_or_below: Option<f32>,
}

impl NoDataPolicy {
    /// Only non-finite values are no-data.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single exact sentinel.
    pub fn sentinel(value: f32) -> Self {
        Self {
            values: vec![value],
            at_or_below: None,
        }
    }

    /// Sentinels used by the water-level rasters: `-9999` and `0`.
    pub fn water_level() -> Self {
        Self {
            values: vec![-9999.0, 0.0],
            at_or_below: None,
        }
    }

    /// Add an exact sentinel.
    pub fn with_value(mut self, value: f32) -> Self {
        self.push_value(value);
        self
    }

    /// Treat everything at or below `threshold` as no-data.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.at_or_below = Some(threshold);
        self
    }

    /// Merge a sentinel declared by the file itself (GDAL_NODATA tag).
    pub fn merge_file_nodata(&mut self, declared: Option<f32>) {
        if let Some(value) = declared {
            self.push_value(value);
        }
    }

    /// Check whether a sample is a no-data value.
    #[inline]
    pub fn is_no_data(&self, value: f32) -> bool {
        if !value.is_finite() {
            return true;
        }
        if let Some(threshold) = self.at_or_below {
            if value <= threshold {
                return true;
            }
        }
        self.values.iter().any(|&s| s == value)
    }

    fn push_value(&mut self, value: f32) {
        // non-finite sentinels are implicit
        if !value.is_finite() || self.values.contains(&value) {
            return;
        }
        self.values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_always_no_data() {
        assert!(NoDataPolicy::none().is_no_data(f32::NAN));
        assert!(NoDataPolicy::none().is_no_data(f32::INFINITY));
        assert!(NoDataPolicy::none().is_no_data(f32::NEG_INFINITY));
        assert!(!NoDataPolicy::none().is_no_data(0.0));
    }

    #[test]
    fn test_water_level_sentinels() {
        let policy = NoDataPolicy::water_level();
        assert!(policy.is_no_data(-9999.0));
        assert!(policy.is_no_data(0.0));
        assert!(!policy.is_no_data(1.25));
        assert!(!policy.is_no_data(-1.0));
    }

    #[test]
    fn test_threshold() {
        let policy = NoDataPolicy::none().with_threshold(-1000.0);
        assert!(policy.is_no_data(-3.4e38));
        assert!(policy.is_no_data(-1000.0));
        assert!(!policy.is_no_data(-999.0));
    }

    #[test]
    fn test_merge_file_nodata_deduplicates() {
        let mut policy = NoDataPolicy::sentinel(-9999.0);
        policy.merge_file_nodata(Some(-9999.0));
        policy.merge_file_nodata(Some(f32::NAN));
        policy.merge_file_nodata(None);
        assert_eq!(policy.values, vec![-9999.0]);

        policy.merge_file_nodata(Some(-32768.0));
        assert_eq!(policy.values, vec![-9999.0, -32768.0]);
    }

    #[test]
    fn test_yaml_shape_defaults() {
        let policy: NoDataPolicy = serde_json::from_str(r#"{"values": [-9999.0]}"#).unwrap();
        assert_eq!(policy.at_or_below, None);
        assert!(policy.is_no_data(-9999.0));
    }
}
