use geo::{Simplify, SimplifyVw};

use crate::{
    config::SimplifyMethod,
    geometry::{from_line_string, meters_to_degrees, to_line_string},
    traits::{SegmentSimplifier, SegmentSmoother},
    types::Segment,
};

/// Upper bound on re-simplification rounds while looking for a fixed point
const MAX_SIMPLIFY_ROUNDS: usize = 8;

/// Run `pass` until the point count stops shrinking, so a second call at the
/// same tolerance never removes anything more. First and last coordinates are
/// pinned to the input.
fn simplify_to_fixed_point(coords: &[[f64; 2]], pass: impl Fn(&[[f64; 2]]) -> Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    let (Some(&first), Some(&last)) = (coords.first(), coords.last()) else {
        return coords.to_vec();
    };
    if coords.len() <= 2 {
        return coords.to_vec();
    }

    let mut current = coords.to_vec();
    for _ in 0..MAX_SIMPLIFY_ROUNDS {
        let next = pass(&current);
        // geo keeps endpoints, but a degenerate result must not lose them
        if next.len() < 2 || next.len() >= current.len() {
            break;
        }
        current = next;
    }

    if let Some(start) = current.first_mut() {
        *start = first;
    }
    if let Some(end) = current.last_mut() {
        *end = last;
    }
    current
}

/// Douglas-Peucker simplifier using geo crate's implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct DouglasPeuckerSimplifier;

impl SegmentSimplifier for DouglasPeuckerSimplifier {
    fn simplify(&self, segment: &Segment, tolerance_m: f64) -> Segment {
        let epsilon = meters_to_degrees(tolerance_m);
        let coords = simplify_to_fixed_point(&segment.coordinates, |coords| {
            from_line_string(&to_line_string(coords).simplify(&epsilon))
        });
        segment.with_coordinates(coords)
    }
}

/// Visvalingam-Whyatt simplifier using geo crate's implementation.
/// The effective-area threshold is the square of the angular tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisvalingamWhyattSimplifier;

impl SegmentSimplifier for VisvalingamWhyattSimplifier {
    fn simplify(&self, segment: &Segment, tolerance_m: f64) -> Segment {
        let epsilon = meters_to_degrees(tolerance_m);
        let area = epsilon * epsilon;
        let coords = simplify_to_fixed_point(&segment.coordinates, |coords| {
            from_line_string(&to_line_string(coords).simplify_vw(&area))
        });
        segment.with_coordinates(coords)
    }
}

/// Pick the simplifier for a configured method
pub fn simplifier_for(method: SimplifyMethod) -> Box<dyn SegmentSimplifier> {
    match method {
        SimplifyMethod::DouglasPeucker => Box::new(DouglasPeuckerSimplifier),
        SimplifyMethod::VisvalingamWhyatt => Box::new(VisvalingamWhyattSimplifier),
    }
}

/// 1:2:1 weighted moving average over interior points
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAverageSmoother;

impl WeightedAverageSmoother {
    fn smooth_pass(coords: &[[f64; 2]]) -> Vec<[f64; 2]> {
        let mut smoothed = coords.to_vec();
        for i in 1..coords.len() - 1 {
            let (prev, current, next) = (coords[i - 1], coords[i], coords[i + 1]);
            smoothed[i] = [
                (prev[0] + 2.0 * current[0] + next[0]) / 4.0,
                (prev[1] + 2.0 * current[1] + next[1]) / 4.0,
            ];
        }
        smoothed
    }
}

impl SegmentSmoother for WeightedAverageSmoother {
    fn smooth(&self, segment: &Segment, iterations: usize) -> Segment {
        if segment.coordinates.len() <= 2 {
            return segment.clone();
        }
        let coords = (0..iterations).fold(segment.coordinates.clone(), |coords, _| Self::smooth_pass(&coords));
        segment.with_coordinates(coords)
    }
}
