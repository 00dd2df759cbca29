use crate::{
    geometry::{bearing, is_valid_coordinate, line_length, normalize_bearing, METERS_PER_NAUTICAL_MILE},
    types::{CoastlineMetrics, Segment},
};

/// Length, mean bearing and exact endpoints of a segment.
///
/// Invalid coordinates are ignored. Fewer than two valid coordinates yields
/// zeroed metrics.
pub fn calculate_metrics(segment: &Segment) -> CoastlineMetrics {
    let valid: Vec<[f64; 2]> = segment
        .coordinates
        .iter()
        .copied()
        .filter(is_valid_coordinate)
        .collect();

    let (Some(&start), Some(&end)) = (valid.first(), valid.last()) else {
        return CoastlineMetrics::default();
    };
    if valid.len() < 2 {
        return CoastlineMetrics::default();
    }

    let length_m = line_length(&valid);

    CoastlineMetrics {
        length_m,
        length_nm: length_m / METERS_PER_NAUTICAL_MILE,
        orientation: mean_bearing(&valid),
        start,
        end,
    }
}

/// Circular mean of the leg bearings, in `[0, 360)`
fn mean_bearing(coords: &[[f64; 2]]) -> f64 {
    let (sin, cos) = coords
        .windows(2)
        .filter_map(|pair| bearing(&pair[0], &pair[1]))
        .fold((0.0, 0.0), |(sin, cos), degrees: f64| {
            let radians = degrees.to_radians();
            (sin + radians.sin(), cos + radians.cos())
        });

    if sin == 0.0 && cos == 0.0 {
        return 0.0;
    }
    normalize_bearing(sin.atan2(cos).to_degrees())
}
