use geo_types::Polygon;
use tracing::{debug, warn};

use crate::{
    config::GapFillingOptions,
    error::Result,
    geometry::{haversine_distance, point_in_polygon},
    traits::GapFillValidator,
    types::{Endpoint, FillMethod, Gap, Segment},
};

use super::stitching::{merged_segment, CoastlineStitcher};

/// Endpoints farther apart than this are unrelated shoreline fragments
pub const MAX_GAP_SEARCH_M: f64 = 50_000.0;

/// Points in a synthesized fill, both gap endpoints included
pub const FILL_POINTS: usize = 5;

/// Accepts every proposed fill
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl GapFillValidator for AcceptAllValidator {
    fn accept(&self, _gap: &Gap, _fill: &[[f64; 2]]) -> bool {
        true
    }
}

/// Rejects fills whose midpoint falls inside a land polygon
#[derive(Debug, Clone, Default)]
pub struct LandMaskValidator {
    pub land: Vec<Polygon<f64>>,
}

impl LandMaskValidator {
    pub fn new(land: Vec<Polygon<f64>>) -> Self {
        Self { land }
    }
}

impl GapFillValidator for LandMaskValidator {
    fn accept(&self, _gap: &Gap, fill: &[[f64; 2]]) -> bool {
        let Some(midpoint) = fill.get(fill.len() / 2) else {
            return true;
        };
        !self.land.iter().any(|polygon| point_in_polygon(midpoint, polygon))
    }
}

/// `count` evenly spaced points from `start` to `end` (both included, exact)
pub fn interpolate_linear(start: [f64; 2], end: [f64; 2], count: usize) -> Vec<[f64; 2]> {
    if count < 2 {
        return vec![start, end];
    }
    let last = (count - 1) as f64;
    let mut points: Vec<[f64; 2]> = (0..count - 1)
        .map(|i| {
            let t = i as f64 / last;
            [start[0] + (end[0] - start[0]) * t, start[1] + (end[1] - start[1]) * t]
        })
        .collect();
    points.push(end);
    points
}

struct FreeEndpoint {
    segment: usize,
    which: Endpoint,
    coord: [f64; 2],
}

impl CoastlineStitcher {
    /// Unconnected endpoint pairs from different segments whose separation lies
    /// strictly between the stitching tolerance and [`MAX_GAP_SEARCH_M`],
    /// nearest first. Closed rings have no free ends.
    pub fn detect_gaps(&self, segments: &[Segment]) -> Vec<Gap> {
        let endpoints: Vec<FreeEndpoint> = segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| !segment.is_closed())
            .flat_map(|(index, segment)| {
                [Endpoint::Start, Endpoint::End].into_iter().filter_map(move |which| {
                    segment.endpoint(which).map(|coord| FreeEndpoint { segment: index, which, coord })
                })
            })
            .collect();

        let all_ends: Vec<(usize, [f64; 2])> = segments
            .iter()
            .enumerate()
            .flat_map(|(index, segment)| [segment.start(), segment.end()].into_iter().flatten().map(move |c| (index, c)))
            .collect();

        let free: Vec<&FreeEndpoint> = endpoints
            .iter()
            .filter(|endpoint| {
                !all_ends
                    .iter()
                    .any(|(other, coord)| *other != endpoint.segment && self.within_tolerance(&endpoint.coord, coord))
            })
            .collect();

        let mut gaps = Vec::new();
        for (i, a) in free.iter().enumerate() {
            for b in &free[i + 1..] {
                if a.segment == b.segment {
                    continue;
                }
                let distance = haversine_distance(&a.coord, &b.coord);
                if distance > self.tolerance_m() && distance < MAX_GAP_SEARCH_M {
                    gaps.push(Gap {
                        start: a.coord,
                        end: b.coord,
                        distance,
                        filled: false,
                        fill_method: None,
                        from_segment: a.segment,
                        from_endpoint: a.which,
                        to_segment: b.segment,
                        to_endpoint: b.which,
                    });
                }
            }
        }

        gaps.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        gaps
    }

    /// Bridge gaps no longer than `options.max_gap_distance_m`, nearest first,
    /// using each segment in at most one fill. Rejected fills leave both
    /// segments untouched.
    pub fn fill_gaps(&self, segments: &[Segment], options: &GapFillingOptions) -> Result<Vec<Segment>> {
        options.validate()?;

        let candidates: Vec<Gap> = self
            .detect_gaps(segments)
            .into_iter()
            .filter(|gap| gap.distance <= options.max_gap_distance_m)
            .collect();

        let mut used = vec![false; segments.len()];
        let mut replacement: Vec<Option<Segment>> = vec![None; segments.len()];
        let mut filled = 0usize;
        let mut rejected = 0usize;

        for mut gap in candidates {
            if used[gap.from_segment] || used[gap.to_segment] {
                continue;
            }

            let fill = match options.method {
                FillMethod::Linear => interpolate_linear(gap.start, gap.end, FILL_POINTS),
            };
            if !self.validator.accept(&gap, &fill) {
                rejected += 1;
                warn!(distance = gap.distance, "gap fill rejected by validator");
                continue;
            }

            let mut leading = segments[gap.from_segment].coordinates.clone();
            if gap.from_endpoint == Endpoint::Start {
                leading.reverse();
            }
            let mut trailing = segments[gap.to_segment].coordinates.clone();
            if gap.to_endpoint == Endpoint::End {
                trailing.reverse();
            }

            let mut coords = leading;
            coords.extend_from_slice(&fill[1..fill.len() - 1]);
            coords.extend(trailing);

            let mut merged = merged_segment(segments, &[gap.from_segment, gap.to_segment], coords);
            merged.gap_count += 1;
            merged.gap_filled = true;

            gap.filled = true;
            gap.fill_method = Some(options.method);
            debug!(?gap, "filled gap");

            used[gap.from_segment] = true;
            used[gap.to_segment] = true;
            replacement[gap.from_segment] = Some(merged);
            filled += 1;
        }

        debug!(filled, rejected, "gap filling finished");

        Ok(segments
            .iter()
            .zip(replacement)
            .enumerate()
            .filter_map(|(index, (segment, merged))| match merged {
                Some(merged) => Some(merged),
                None if !used[index] => Some(segment.clone()),
                None => None,
            })
            .collect())
    }
}
