//! Geodesic helpers shared by every stage of the pipeline.
//!
//! Coordinates are `[lon, lat]` pairs in WGS84 degrees. The numeric work is
//! delegated to the `geo` haversine algorithms; the wrappers here add the
//! validity rules the pipeline relies on: a coordinate that is non-finite or
//! outside the valid lon/lat range never matches anything (its distance to any
//! point is infinite) instead of producing an error.

use geo::{Contains, HaversineBearing, HaversineDestination, HaversineDistance};
use geo_types::{Coord, LineString, Point, Polygon};

/// Closure tolerance in degrees (about 11 m at the equator).
pub const CLOSURE_EPSILON_DEG: f64 = 1e-4;

/// Meters per degree of arc along the equator.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Meters in one international nautical mile.
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Decimal digits kept by [`round_coordinate`] (about 11 cm at the equator).
pub const COORDINATE_DECIMALS: u32 = 6;

/// Whether a coordinate is finite and within the WGS84 lon/lat domain.
pub fn is_valid_coordinate(coord: &[f64; 2]) -> bool {
    let [lon, lat] = *coord;
    lon.is_finite() && lat.is_finite() && lon.abs() <= 180.0 && lat.abs() <= 90.0
}

fn to_point(coord: &[f64; 2]) -> Point<f64> {
    Point::new(coord[0], coord[1])
}

/// Great-circle distance in meters, or `f64::INFINITY` when either input is invalid.
pub fn haversine_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    if !is_valid_coordinate(a) || !is_valid_coordinate(b) {
        return f64::INFINITY;
    }
    to_point(a).haversine_distance(&to_point(b))
}

/// Initial great-circle bearing from `a` to `b`, normalized to `[0, 360)`.
///
/// Returns `None` when either input is invalid.
pub fn bearing(a: &[f64; 2], b: &[f64; 2]) -> Option<f64> {
    if !is_valid_coordinate(a) || !is_valid_coordinate(b) {
        return None;
    }
    Some(normalize_bearing(to_point(a).haversine_bearing(to_point(b))))
}

/// Normalize any angle in degrees to `[0, 360)`.
pub fn normalize_bearing(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Point reached by travelling `distance_m` from `origin` along `bearing_deg`.
pub fn destination(origin: &[f64; 2], bearing_deg: f64, distance_m: f64) -> [f64; 2] {
    let point = to_point(origin).haversine_destination(bearing_deg, distance_m);
    [point.x(), point.y()]
}

/// Component-wise equality within `epsilon` degrees.
pub fn points_equal(a: &[f64; 2], b: &[f64; 2], epsilon: f64) -> bool {
    (a[0] - b[0]).abs() <= epsilon && (a[1] - b[1]).abs() <= epsilon
}

/// Whether `point` lies strictly inside `polygon` (boundary points are outside).
pub fn point_in_polygon(point: &[f64; 2], polygon: &Polygon<f64>) -> bool {
    is_valid_coordinate(point) && polygon.contains(&to_point(point))
}

/// Round a single coordinate component to [`COORDINATE_DECIMALS`] digits.
pub fn round_coordinate(value: f64) -> f64 {
    let factor = 10f64.powi(COORDINATE_DECIMALS as i32);
    (value * factor).round() / factor
}

/// Copy of `coords` in reverse order.
pub fn reverse_line(coords: &[[f64; 2]]) -> Vec<[f64; 2]> {
    coords.iter().rev().copied().collect()
}

/// Convert a metric distance into an equivalent angular tolerance using the
/// equatorial scale. Distortion grows with latitude.
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Total great-circle length of a polyline in meters, skipping invalid legs.
pub fn line_length(coords: &[[f64; 2]]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .filter(|d| d.is_finite())
        .sum()
}

pub fn to_line_string(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(coords.iter().map(|&[x, y]| Coord { x, y }).collect())
}

pub fn from_line_string(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.coords().map(|coord| [coord.x, coord.y]).collect()
}

/// Build a polygon from an exterior ring, closing it if needed.
pub fn polygon_from_ring(ring: &[[f64; 2]]) -> Polygon<f64> {
    Polygon::new(to_line_string(ring), vec![])
}
