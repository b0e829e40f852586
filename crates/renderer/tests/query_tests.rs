//! Point query tests, including the 4x4 reference scenario.

use overlay_common::NoDataPolicy;
use renderer::{pixel_center, query_at, QueryResult};
use test_utils::{assert_coords_approx_eq, dataset, extent, scenario_dataset};

#[test]
fn test_scenario_top_left() {
    match query_at(&scenario_dataset(), 10.9, 100.1) {
        QueryResult::Found(q) => {
            assert_eq!((q.pixel_x, q.pixel_y), (0, 0));
            assert_eq!(q.value, 1.0);
            assert_eq!((q.lat, q.lon), (10.9, 100.1));
        }
        QueryResult::NotFound => panic!("expected a sample"),
    }
}

#[test]
fn test_scenario_sentinel_is_not_found() {
    // index 5 is pixel (1, 1)
    let ds = scenario_dataset();
    let (lat, lon) = pixel_center(&ds, 1, 1).unwrap();
    assert_eq!(query_at(&ds, lat, lon), QueryResult::NotFound);
}

#[test]
fn test_scenario_bottom_right() {
    let result = query_at(&scenario_dataset(), 10.01, 100.99);
    assert_eq!(result.value(), Some(16.0));
}

#[test]
fn test_outside_bbox_is_not_found() {
    let ds = scenario_dataset();
    for (lat, lon) in [(50.0, 100.5), (10.5, 150.0), (-10.5, 100.5), (10.5, 99.0)] {
        assert_eq!(query_at(&ds, lat, lon), QueryResult::NotFound, "({}, {})", lat, lon);
    }
}

#[test]
fn test_pixel_center_round_trip() {
    let ds = dataset(
        vec![1.0; 37 * 23],
        37,
        23,
        extent::CHIANG_MAI,
        NoDataPolicy::none(),
    );

    for y in 0..23 {
        for x in 0..37 {
            let (lat, lon) = pixel_center(&ds, x, y).unwrap();
            match query_at(&ds, lat, lon) {
                QueryResult::Found(q) => assert_eq!((q.pixel_x, q.pixel_y), (x, y)),
                QueryResult::NotFound => panic!("pixel ({}, {}) not found", x, y),
            }
        }
    }
}

#[test]
fn test_pixel_center_geometry() {
    let ds = scenario_dataset();
    let (lat, lon) = pixel_center(&ds, 0, 0).unwrap();
    assert_coords_approx_eq!((lat, lon), (10.875, 100.125), 1e-9);
    assert!(pixel_center(&ds, 4, 0).is_none());
}

#[test]
fn test_zero_is_only_no_data_when_configured() {
    let samples = vec![0.0, 1.0, 2.0, 3.0];
    let plain = dataset(samples.clone(), 2, 2, extent::UNIT_SQUARE, NoDataPolicy::none());
    let water = dataset(samples, 2, 2, extent::UNIT_SQUARE, NoDataPolicy::water_level());

    assert_eq!(query_at(&plain, 10.9, 100.1).value(), Some(0.0));
    assert_eq!(query_at(&water, 10.9, 100.1), QueryResult::NotFound);
}
