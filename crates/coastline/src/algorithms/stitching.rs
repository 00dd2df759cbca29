//! Endpoint stitching.
//!
//! Segments whose endpoints lie within the stitching tolerance of each other
//! form an undirected graph. Every connected component is walked into as few
//! continuous polylines as possible: a chain grows from its trailing end, then
//! from its leading end, reversing members where needed. Members a chain cannot
//! reach (branches at a junction) start new chains, so no input is lost.

use std::collections::VecDeque;

use tracing::debug;

use crate::{
    config::GapFillingOptions,
    error::{CoastlineError, Result},
    geometry::haversine_distance,
    traits::GapFillValidator,
    types::{CoastType, ConnectionMap, EndpointConnections, Segment, SourceKind},
};

use super::gaps::AcceptAllValidator;

pub struct CoastlineStitcher {
    tolerance_m: f64,
    pub(crate) validator: Box<dyn GapFillValidator>,
}

impl std::fmt::Debug for CoastlineStitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoastlineStitcher")
            .field("tolerance_m", &self.tolerance_m)
            .finish_non_exhaustive()
    }
}

impl CoastlineStitcher {
    /// Fails when the tolerance is negative or not finite
    pub fn new(tolerance_m: f64) -> Result<Self> {
        if !tolerance_m.is_finite() || tolerance_m < 0.0 {
            return Err(CoastlineError::InvalidTolerance(tolerance_m));
        }
        Ok(Self {
            tolerance_m,
            validator: Box::new(AcceptAllValidator),
        })
    }

    /// Replace the gap-fill validator (accept-all by default)
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: GapFillValidator + 'static,
    {
        self.validator = Box::new(validator);
        self
    }

    pub fn tolerance_m(&self) -> f64 {
        self.tolerance_m
    }

    pub(crate) fn within_tolerance(&self, a: &[f64; 2], b: &[f64; 2]) -> bool {
        haversine_distance(a, b) <= self.tolerance_m
    }

    /// Build the endpoint adjacency graph. Two segments connect when any of the
    /// four endpoint pairings is within tolerance. O(n²) in segment count.
    pub fn find_connectable_endpoints(&self, segments: &[Segment]) -> ConnectionMap {
        let mut nodes: Vec<EndpointConnections> = segments
            .iter()
            .map(|segment| EndpointConnections {
                start: segment.start().unwrap_or([f64::NAN; 2]),
                end: segment.end().unwrap_or([f64::NAN; 2]),
                connections: Vec::new(),
            })
            .collect();

        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                let (a, b) = (&nodes[i], &nodes[j]);
                let connected = self.within_tolerance(&a.end, &b.start)
                    || self.within_tolerance(&a.end, &b.end)
                    || self.within_tolerance(&a.start, &b.start)
                    || self.within_tolerance(&a.start, &b.end);
                if connected {
                    nodes[i].connections.push(j);
                    nodes[j].connections.push(i);
                }
            }
        }

        ConnectionMap { nodes }
    }

    /// Breadth-first flood fill over the adjacency graph.
    /// Components are ordered by their smallest member, members ascending.
    pub fn connected_components(&self, map: &ConnectionMap) -> Vec<Vec<usize>> {
        let mut visited = vec![false; map.len()];
        let mut components = Vec::new();

        for seed in 0..map.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            let mut queue = VecDeque::from([seed]);
            let mut component = Vec::new();

            while let Some(current) = queue.pop_front() {
                component.push(current);
                for &next in map.neighbors(current) {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components
    }

    /// Merge connected segments into continuous polylines, then optionally
    /// bridge the remaining gaps. Every output segment is flagged stitched.
    pub fn stitch_segments(
        &self,
        segments: &[Segment],
        gap_filling: Option<&GapFillingOptions>,
    ) -> Result<Vec<Segment>> {
        if let Some(options) = gap_filling {
            options.validate()?;
        }

        let map = self.find_connectable_endpoints(segments);
        let components = self.connected_components(&map);
        debug!(
            segments = segments.len(),
            connections = map.edge_count(),
            components = components.len(),
            "built endpoint graph"
        );

        let mut stitched = Vec::with_capacity(components.len());
        for component in &components {
            if let [only] = component.as_slice() {
                let mut lone = segments[*only].clone();
                lone.stitched = true;
                stitched.push(lone);
            } else {
                stitched.extend(self.merge_component(segments, component));
            }
        }
        debug!(before = segments.len(), after = stitched.len(), "stitched segments");

        match gap_filling {
            Some(options) if options.enabled && stitched.len() > 1 => self.fill_gaps(&stitched, options),
            _ => Ok(stitched),
        }
    }

    /// Walk one component into chains. Returns one segment when the component
    /// is a simple chain, more when it branches.
    pub fn merge_component(&self, segments: &[Segment], component: &[usize]) -> Vec<Segment> {
        let mut remaining: Vec<usize> = component.to_vec();
        let mut chains = Vec::new();

        while !remaining.is_empty() {
            let first = remaining.remove(0);
            let mut coords = segments[first].coordinates.clone();
            let mut members = vec![first];

            // grow from the trailing end
            while let Some(tail) = coords.last().copied() {
                let Some((position, reverse)) = self.find_attachment(segments, &remaining, &tail, true) else {
                    break;
                };
                let index = remaining.remove(position);
                let mut next = segments[index].coordinates.clone();
                if reverse {
                    next.reverse();
                }
                coords.extend(next.into_iter().skip(1));
                members.push(index);
            }

            // then from the leading end
            while let Some(head) = coords.first().copied() {
                let Some((position, reverse)) = self.find_attachment(segments, &remaining, &head, false) else {
                    break;
                };
                let index = remaining.remove(position);
                let mut prev = segments[index].coordinates.clone();
                if reverse {
                    prev.reverse();
                }
                prev.pop();
                prev.extend(coords);
                coords = prev;
                members.push(index);
            }

            chains.push(merged_segment(segments, &members, coords));
        }

        chains
    }

    /// Find a remaining member with an endpoint within tolerance of `anchor`.
    ///
    /// When appending, a member attaches by its start as-is or by its end
    /// reversed; when prepending, by its end as-is or by its start reversed.
    fn find_attachment(
        &self,
        segments: &[Segment],
        remaining: &[usize],
        anchor: &[f64; 2],
        appending: bool,
    ) -> Option<(usize, bool)> {
        remaining.iter().enumerate().find_map(|(position, &index)| {
            let candidate = &segments[index];
            let (near, far) = if appending {
                (candidate.start(), candidate.end())
            } else {
                (candidate.end(), candidate.start())
            };
            if near.is_some_and(|p| self.within_tolerance(&p, anchor)) {
                Some((position, false))
            } else if far.is_some_and(|p| self.within_tolerance(&p, anchor)) {
                Some((position, true))
            } else {
                None
            }
        })
    }
}

/// Combine member metadata into a stitched segment carrying `coords`
pub(crate) fn merged_segment(segments: &[Segment], members: &[usize], coords: Vec<[f64; 2]>) -> Segment {
    let mut merged = segments[members[0]].with_coordinates(coords);
    merged.sub_type = None;
    merged.merged_count = 0;

    for &index in members {
        let member = &segments[index];
        merged.source_features.extend(member.source_features.iter().cloned());
        merged.merged_count += member.merged_count;
        merged.gap_count += if index == members[0] { 0 } else { member.gap_count };
        merged.gap_filled |= member.gap_filled;
        if merged.category.is_none() {
            merged.category = member.category;
        }
    }

    let all = || members.iter().map(|&i| &segments[i]);
    merged.source = if all().any(|s| s.source == SourceKind::Explicit) {
        SourceKind::Explicit
    } else {
        SourceKind::Derived
    };
    merged.coast_type = if all().any(|s| s.coast_type == Some(CoastType::Coastline)) {
        Some(CoastType::Coastline)
    } else if all().any(|s| s.coast_type == Some(CoastType::Constructed)) {
        Some(CoastType::Constructed)
    } else {
        None
    };
    merged.stitched = true;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::haversine_distance;

    fn seg(coords: &[[f64; 2]], class: &str) -> Segment {
        Segment::new(coords.to_vec(), SourceKind::Explicit, class)
    }

    #[test]
    fn test_negative_tolerance_is_rejected() {
        assert!(matches!(CoastlineStitcher::new(-5.0), Err(CoastlineError::InvalidTolerance(_))));
        assert!(CoastlineStitcher::new(f64::NAN).is_err());
        assert!(CoastlineStitcher::new(0.0).is_ok());
    }

    #[test]
    fn test_stitching_closure() {
        let stitcher = CoastlineStitcher::new(0.0).expect("Should create stitcher");
        let a = seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE");
        let b = seg(&[[1.0, 0.0], [2.0, 0.0]], "COALNE");

        let result = stitcher.stitch_segments(&[a, b], None).expect("Should stitch");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coordinates, vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        assert!(result[0].stitched);
        assert_eq!(result[0].merged_count, 2);
    }

    #[test]
    fn test_reversal_handling() {
        let stitcher = CoastlineStitcher::new(0.0).expect("Should create stitcher");
        let a = seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE");
        let b = seg(&[[2.0, 0.0], [1.0, 0.0]], "COALNE");

        let result = stitcher.stitch_segments(&[a, b], None).expect("Should stitch");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].coordinates, vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
    }

    #[test]
    fn test_prepends_when_first_member_is_in_the_middle() {
        let stitcher = CoastlineStitcher::new(1.0).expect("Should create stitcher");
        let middle = seg(&[[1.0, 0.0], [2.0, 0.0]], "COALNE");
        let head = seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE");
        let tail = seg(&[[3.0, 0.0], [2.0, 0.0]], "COALNE");

        let result = stitcher.stitch_segments(&[middle, head, tail], None).expect("Should stitch");
        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].coordinates,
            vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]
        );
    }

    #[test]
    fn test_tolerance_boundary() {
        let a = seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE");
        let b = seg(&[[1.0001, 0.0], [2.0, 0.0]], "COALNE");
        let d = haversine_distance(&[1.0, 0.0], &[1.0001, 0.0]);

        let at = CoastlineStitcher::new(d).expect("Should create stitcher");
        let joined = at.stitch_segments(&[a.clone(), b.clone()], None).expect("Should stitch");
        assert_eq!(joined.len(), 1);

        let below = CoastlineStitcher::new(d * 0.999).expect("Should create stitcher");
        let separate = below.stitch_segments(&[a, b], None).expect("Should stitch");
        assert_eq!(separate.len(), 2);
        assert!(separate.iter().all(|s| s.stitched));
    }

    #[test]
    fn test_provenance_monotonicity() {
        let stitcher = CoastlineStitcher::new(10.0).expect("Should create stitcher");
        let inputs = vec![
            seg(&[[0.0, 0.0], [0.01, 0.0]], "COALNE"),
            seg(&[[0.01, 0.0], [0.02, 0.0]], "SLCONS"),
            Segment::new(vec![[0.02, 0.0], [0.03, 0.0]], SourceKind::Derived, "LNDARE"),
        ];

        let result = stitcher.stitch_segments(&inputs, None).expect("Should stitch");
        assert_eq!(result.len(), 1);
        for input in &inputs {
            assert!(result[0].source_features.is_superset(&input.source_features));
        }
        assert_eq!(result[0].source, SourceKind::Explicit);
    }

    #[test]
    fn test_branching_component_keeps_every_member() {
        let stitcher = CoastlineStitcher::new(1.0).expect("Should create stitcher");
        // three arms meeting at the origin
        let inputs = vec![
            seg(&[[-1.0, 0.0], [0.0, 0.0]], "COALNE"),
            seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE"),
            seg(&[[0.0, 0.0], [0.0, 1.0]], "COALNE"),
        ];

        let map = stitcher.find_connectable_endpoints(&inputs);
        assert_eq!(stitcher.connected_components(&map), vec![vec![0, 1, 2]]);

        let result = stitcher.stitch_segments(&inputs, None).expect("Should stitch");
        assert_eq!(result.len(), 2);
        let total_members: usize = result.iter().map(|s| s.merged_count).sum();
        assert_eq!(total_members, 3);
        let total_points: usize = result.iter().map(|s| s.point_count()).sum();
        assert_eq!(total_points, 5);
    }

    #[test]
    fn test_connection_map() {
        let stitcher = CoastlineStitcher::new(0.0).expect("Should create stitcher");
        let inputs = vec![
            seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE"),
            seg(&[[5.0, 5.0], [6.0, 5.0]], "COALNE"),
            seg(&[[0.0, 1.0], [0.0, 0.0]], "COALNE"),
        ];
        let map = stitcher.find_connectable_endpoints(&inputs);
        assert_eq!(map.neighbors(0), &[2]);
        assert!(map.neighbors(1).is_empty());
        assert_eq!(map.neighbors(2), &[0]);
        assert_eq!(map.nodes[1].start, [5.0, 5.0]);
        assert_eq!(stitcher.connected_components(&map), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_malformed_coordinates_never_connect() {
        let stitcher = CoastlineStitcher::new(1_000_000.0).expect("Should create stitcher");
        let inputs = vec![
            seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE"),
            seg(&[[f64::NAN, 0.0], [f64::INFINITY, 0.0]], "COALNE"),
        ];
        let result = stitcher.stitch_segments(&inputs, None).expect("Should stitch");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let stitcher = CoastlineStitcher::new(0.0).expect("Should create stitcher");
        let inputs = vec![
            seg(&[[0.0, 0.0], [1.0, 0.0]], "COALNE"),
            seg(&[[1.0, 0.0], [2.0, 0.0]], "COALNE"),
        ];
        let snapshot = inputs.clone();
        let _ = stitcher.stitch_segments(&inputs, None).expect("Should stitch");
        assert_eq!(inputs, snapshot);
    }
}
