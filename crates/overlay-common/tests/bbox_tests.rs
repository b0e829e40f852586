//! Tests for BoundingBox construction, parsing and containment.

use overlay_common::bbox::BoundingBox;
use overlay_common::OverlayError;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
    assert_eq!(bbox.min_lon, -180.0);
    assert_eq!(bbox.min_lat, -90.0);
    assert_eq!(bbox.max_lon, 180.0);
    assert_eq!(bbox.max_lat, 90.0);
}

#[test]
fn test_bbox_copy() {
    let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let bbox2 = bbox1;
    assert_eq!(bbox1, bbox2);
}

#[test]
fn test_bbox_rejects_nan() {
    assert!(matches!(
        BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0),
        Err(OverlayError::InvalidBbox(_))
    ));
    assert!(matches!(
        BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0),
        Err(OverlayError::InvalidBbox(_))
    ));
}

#[test]
fn test_bbox_rejects_degenerate() {
    assert!(BoundingBox::new(5.0, 5.0, 5.0, 6.0).is_err());
    assert!(BoundingBox::new(5.0, 6.0, 6.0, 6.0).is_err());
}

// ============================================================================
// from_csv tests
// ============================================================================

#[test]
fn test_parse_csv_with_spaces() {
    let bbox = BoundingBox::from_csv(" 98.5, 18.25 ,99.5,19.0").unwrap();
    assert!((bbox.min_lon - 98.5).abs() < 1e-9);
    assert!((bbox.min_lat - 18.25).abs() < 1e-9);
    assert!((bbox.max_lon - 99.5).abs() < 1e-9);
    assert!((bbox.max_lat - 19.0).abs() < 1e-9);
}

#[test]
fn test_parse_csv_wrong_arity() {
    assert!(matches!(
        BoundingBox::from_csv("1,2,3"),
        Err(OverlayError::InvalidBbox(_))
    ));
    assert!(BoundingBox::from_csv("1,2,3,4,5").is_err());
}

#[test]
fn test_parse_csv_bad_number() {
    let err = BoundingBox::from_csv("1,abc,3,4").unwrap_err();
    assert!(err.to_string().contains("abc"));
}

#[test]
fn test_parse_csv_inverted() {
    assert!(BoundingBox::from_csv("101,10,100,11").is_err());
}

// ============================================================================
// Geometry tests
// ============================================================================

#[test]
fn test_width_height() {
    let bbox = BoundingBox::new(100.0, 10.0, 101.5, 10.5).unwrap();
    assert!((bbox.width() - 1.5).abs() < 1e-12);
    assert!((bbox.height() - 0.5).abs() < 1e-12);
}

#[test]
fn test_contains_interior() {
    let bbox = BoundingBox::new(100.0, 10.0, 101.0, 11.0).unwrap();
    assert!(bbox.contains(10.5, 100.5));
    assert!(!bbox.contains(12.0, 100.5));
    assert!(!bbox.contains(10.5, 99.0));
}

#[test]
fn test_contains_edges_half_open() {
    let bbox = BoundingBox::new(100.0, 10.0, 101.0, 11.0).unwrap();
    // West and north edges belong to the first column/row
    assert!(bbox.contains(11.0, 100.0));
    // East and south edges are outside
    assert!(!bbox.contains(10.5, 101.0));
    assert!(!bbox.contains(10.0, 100.5));
}

#[test]
fn test_leaflet_bounds_order() {
    let bbox = BoundingBox::new(98.9, 18.6, 99.1, 18.8).unwrap();
    assert_eq!(bbox.to_leaflet_bounds(), [[18.6, 98.9], [18.8, 99.1]]);
}

#[test]
fn test_serde_roundtrip_shape() {
    let bbox = BoundingBox::new(100.0, 10.0, 101.0, 11.0).unwrap();
    let json = serde_json::to_value(bbox).unwrap();
    assert_eq!(json["min_lon"], 100.0);
    assert_eq!(json["max_lat"], 11.0);
}
