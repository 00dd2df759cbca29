use geo_types::Polygon;

use crate::{
    geometry::{bearing, destination, is_valid_coordinate, point_in_polygon},
    types::{Segment, WaterSide},
};

/// Sample positions examined along a segment
pub const WATER_SIDE_SAMPLES: usize = 5;

/// Perpendicular probe distance in meters
pub const WATER_SIDE_OFFSET_M: f64 = 100.0;

fn in_water(point: &[f64; 2], water: &[Polygon<f64>]) -> bool {
    water.iter().any(|polygon| point_in_polygon(point, polygon))
}

/// Majority vote over perpendicular probes at evenly spaced legs.
///
/// A sample votes only when exactly one of its two probes lands in water.
/// Ties, missing polygons and degenerate segments give [`WaterSide::Unknown`].
pub fn determine_water_side(segment: &Segment, water: &[Polygon<f64>]) -> WaterSide {
    let coords = &segment.coordinates;
    if water.is_empty() || coords.len() < 2 {
        return WaterSide::Unknown;
    }

    let legs = coords.len() - 1;
    let samples = legs.min(WATER_SIDE_SAMPLES);
    let (mut left, mut right) = (0usize, 0usize);

    for k in 0..samples {
        let index = k * legs / samples;
        let (here, next) = (&coords[index], &coords[index + 1]);
        if !is_valid_coordinate(here) {
            continue;
        }
        let Some(heading) = bearing(here, next) else {
            continue;
        };

        let left_wet = in_water(&destination(here, heading - 90.0, WATER_SIDE_OFFSET_M), water);
        let right_wet = in_water(&destination(here, heading + 90.0, WATER_SIDE_OFFSET_M), water);
        match (left_wet, right_wet) {
            (true, false) => left += 1,
            (false, true) => right += 1,
            _ => {}
        }
    }

    match left.cmp(&right) {
        std::cmp::Ordering::Greater => WaterSide::Left,
        std::cmp::Ordering::Less => WaterSide::Right,
        std::cmp::Ordering::Equal => WaterSide::Unknown,
    }
}
