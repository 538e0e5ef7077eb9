//! Funnel Algorithm
//!
//! String pulling over a corridor of portals (the "simple stupid funnel").
//!
//! The funnel is a wedge anchored at the apex and bounded by a left and a
//! right point. Each portal either narrows a side or, when a side would cross
//! the other, commits the crossed boundary point as a new apex and restarts
//! from the portal where that point was set. The committed apexes, between
//! source and destination, are the corners of the shortest path through the
//! corridor.

use tracing::trace;

use super::geometry::{triangle_area_squared, Point, Portal};
use super::pathfinder::CorridorGraph;
use crate::error::{PathError, PathResult};

/// Incremental funnel state.
///
/// `on_apex` is called for every committed apex in order.
pub struct Funnel<F> {
    apex: Point,
    left: Point,
    right: Point,
    epsilon: f64,
    on_apex: F,
}

impl<F: FnMut(Point)> Funnel<F> {
    /// A degenerate funnel with apex and both sides at `apex`.
    pub fn new(apex: Point, on_apex: F) -> Self {
        Self {
            apex,
            left: apex,
            right: apex,
            epsilon: 0.0,
            on_apex,
        }
    }

    /// Treat points closer than `epsilon` as the same point.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn apex(&self) -> Point {
        self.apex
    }

    pub fn left(&self) -> Point {
        self.left
    }

    pub fn right(&self) -> Point {
        self.right
    }

    fn same(&self, a: Point, b: Point) -> bool {
        a.approx_eq(b, self.epsilon)
    }

    fn pivot(&mut self, apex: Point) {
        self.apex = apex;
        self.left = apex;
        self.right = apex;
        (self.on_apex)(apex);
    }

    /// Feed a portal sequence through the funnel.
    pub fn update(&mut self, portals: &[Portal]) {
        // Index of the portal each side was last set from; `None` while the
        // side still sits on the starting apex.
        let mut left_index: Option<usize> = None;
        let mut right_index: Option<usize> = None;
        let mut i = 0;

        while i < portals.len() {
            let portal = portals[i];

            if triangle_area_squared(self.apex, self.left, portal.left) >= 0.0 {
                if self.same(self.apex, self.left)
                    || self.same(self.apex, self.right)
                    || triangle_area_squared(self.apex, self.right, portal.left) < 0.0
                {
                    self.left = portal.left;
                    left_index = Some(i);
                } else {
                    // Left crossed over right: the right point is a corner.
                    let corner = self.right;
                    trace!(x = corner.x, y = corner.y, portal = i, "funnel pivots on right");
                    self.pivot(corner);
                    left_index = right_index;
                    i = right_index.map_or(0, |index| index + 1);
                    continue;
                }
            }

            if triangle_area_squared(self.apex, self.right, portal.right) <= 0.0 {
                if self.same(self.apex, self.right)
                    || self.same(self.apex, self.left)
                    || triangle_area_squared(self.apex, self.left, portal.right) > 0.0
                {
                    self.right = portal.right;
                    right_index = Some(i);
                } else {
                    let corner = self.left;
                    trace!(x = corner.x, y = corner.y, portal = i, "funnel pivots on left");
                    self.pivot(corner);
                    right_index = left_index;
                    i = left_index.map_or(0, |index| index + 1);
                    continue;
                }
            }

            i += 1;
        }
    }
}

/// String pulling over a whole corridor.
#[derive(Debug, Clone, Copy)]
pub struct FunnelAlgorithm {
    epsilon: f64,
}

impl FunnelAlgorithm {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Point path through the portals between consecutive `corridor` nodes.
    pub fn find_path<G: CorridorGraph>(
        &self,
        graph: &G,
        source: Point,
        destination: Point,
        corridor: &[G::Node],
    ) -> PathResult<Vec<Point>> {
        let portals = corridor
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                graph
                    .portal_to(pair[0], pair[1])
                    .ok_or(PathError::MissingPortal(index))
            })
            .collect::<PathResult<Vec<_>>>()?;

        Ok(self.string_pull(source, destination, &portals))
    }

    /// Shortest path from `source` to `destination` through `portals`.
    ///
    /// The terminal portal is added here. The result starts at `source`,
    /// ends at `destination` and never repeats a point back to back.
    pub fn string_pull(&self, source: Point, destination: Point, portals: &[Portal]) -> Vec<Point> {
        let mut all = Vec::with_capacity(portals.len() + 1);
        all.extend_from_slice(portals);
        all.push(Portal::end(destination));

        let epsilon = self.epsilon;
        let mut path = vec![source];
        {
            let mut funnel = Funnel::new(source, |apex: Point| {
                if path.last().map_or(true, |last| !last.approx_eq(apex, epsilon)) {
                    path.push(apex);
                }
            })
            .with_epsilon(epsilon);
            funnel.update(&all);
        }

        if path.last().map_or(true, |last| !last.approx_eq(destination, epsilon)) {
            path.push(destination);
        }
        path
    }
}

impl Default for FunnelAlgorithm {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn straight_corridor_is_a_single_segment() {
        let portals: Vec<Portal> = (1..=4)
            .map(|y| Portal::new(p(-1.0, y as f64), p(1.0, y as f64)))
            .collect();

        let path = FunnelAlgorithm::default().string_pull(p(0.0, 0.0), p(0.0, 5.0), &portals);
        assert_eq!(path, vec![p(0.0, 0.0), p(0.0, 5.0)]);
    }

    #[test]
    fn corner_becomes_an_intermediate_apex() {
        // North through a doorway, then east around its right jamb.
        let portals = [
            Portal::new(p(-1.0, 4.0), p(1.0, 4.0)),
            Portal::new(p(1.0, 6.0), p(1.0, 4.0)),
        ];

        let path = FunnelAlgorithm::default().string_pull(p(0.0, 0.0), p(5.0, 5.0), &portals);
        assert_eq!(path, vec![p(0.0, 0.0), p(1.0, 4.0), p(5.0, 5.0)]);
    }

    #[test]
    fn left_turn_commits_the_left_corner() {
        // Mirror of the right turn: north, then west around the left jamb.
        let portals = [
            Portal::new(p(-1.0, 4.0), p(1.0, 4.0)),
            Portal::new(p(-1.0, 4.0), p(-1.0, 6.0)),
        ];

        let path = FunnelAlgorithm::default().string_pull(p(0.0, 0.0), p(-5.0, 5.0), &portals);
        assert_eq!(path, vec![p(0.0, 0.0), p(-1.0, 4.0), p(-5.0, 5.0)]);
    }

    #[test]
    fn empty_corridor_goes_straight() {
        let path = FunnelAlgorithm::default().string_pull(p(1.0, 1.0), p(2.0, 3.0), &[]);
        assert_eq!(path, vec![p(1.0, 1.0), p(2.0, 3.0)]);
    }

    #[test]
    fn same_source_and_destination() {
        let path = FunnelAlgorithm::default().string_pull(p(1.0, 1.0), p(1.0, 1.0), &[]);
        assert_eq!(path, vec![p(1.0, 1.0)]);
    }

    #[test]
    fn funnel_reports_each_apex() {
        let mut apexes = Vec::new();
        let portals = [
            Portal::new(p(-1.0, 4.0), p(1.0, 4.0)),
            Portal::new(p(1.0, 6.0), p(1.0, 4.0)),
            Portal::end(p(5.0, 5.0)),
        ];

        let mut funnel = Funnel::new(p(0.0, 0.0), |apex| apexes.push(apex));
        funnel.update(&portals);
        assert_eq!(funnel.apex(), p(1.0, 4.0));
        drop(funnel);

        assert_eq!(apexes, vec![p(1.0, 4.0)]);
    }
}
