//! Hierarchical Pathfinder
//!
//! Two stages, each pluggable:
//!
//! 1. **Low fidelity** finds a corridor of coarse nodes from the source's
//!    node to the destination's node ([`AStar`] by default).
//! 2. **High fidelity** pulls a point path through the portals between
//!    consecutive corridor nodes ([`FunnelAlgorithm`] by default).
//!
//! A spatial lookup maps world points to coarse nodes. It is injected so the
//! pathfinder stays independent of how the graph is stored.

use std::fmt;

use tracing::debug;

use super::astar::{AStar, AStarGraph, GoalTest};
use super::config::SearchConfig;
use super::funnel::FunnelAlgorithm;
use super::geometry::{Point, Portal};
use crate::error::{PathError, PathResult};

/// A coarse graph whose adjacent nodes are joined by portals.
pub trait CorridorGraph: AStarGraph {
    /// The portal crossed when moving from `from` to the adjacent `to`.
    fn portal_to(&self, from: Self::Node, to: Self::Node) -> Option<Portal>;
}

/// Coarse stage: node corridor from source to destination.
pub trait LowFidelity<G: AStarGraph> {
    fn find_corridor(&self, graph: &G, source: G::Node, destination: G::Node) -> PathResult<Vec<G::Node>>;
}

/// Fine stage: point path through a corridor.
pub trait HighFidelity<G: CorridorGraph> {
    fn refine(
        &self,
        graph: &G,
        source: Point,
        destination: Point,
        corridor: &[G::Node],
    ) -> PathResult<Vec<Point>>;
}

impl<G, T> LowFidelity<G> for AStar<T>
where
    G: AStarGraph,
    T: GoalTest<G::Node>,
{
    fn find_corridor(&self, graph: &G, source: G::Node, destination: G::Node) -> PathResult<Vec<G::Node>> {
        self.find_path(graph, destination, Some(source))
    }
}

impl<G: CorridorGraph> HighFidelity<G> for FunnelAlgorithm {
    fn refine(
        &self,
        graph: &G,
        source: Point,
        destination: Point,
        corridor: &[G::Node],
    ) -> PathResult<Vec<Point>> {
        self.find_path(graph, source, destination, corridor)
    }
}

/// Result of [`Pathfinder::find_path`].
#[derive(Debug, Clone, PartialEq)]
pub enum Route<N> {
    /// Coarse node corridor, source node first.
    Coarse(Vec<N>),

    /// World-space path from source to destination.
    Refined(Vec<Point>),
}

impl<N> Route<N> {
    pub fn corridor(&self) -> Option<&[N]> {
        match self {
            Route::Coarse(nodes) => Some(nodes),
            Route::Refined(_) => None,
        }
    }

    pub fn points(&self) -> Option<&[Point]> {
        match self {
            Route::Coarse(_) => None,
            Route::Refined(points) => Some(points),
        }
    }

    pub fn is_refined(&self) -> bool {
        matches!(self, Route::Refined(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Route::Coarse(nodes) => nodes.len(),
            Route::Refined(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type BoxedLowFidelity<G> = Box<dyn LowFidelity<G> + Send + Sync>;
type BoxedHighFidelity<G> = Box<dyn HighFidelity<G> + Send + Sync>;

/// Maps a world point to the coarse node containing it.
pub type SpatialLookup<N> = Box<dyn Fn(Point) -> Option<N> + Send + Sync>;

/// Composes a low-fidelity and a high-fidelity stage.
///
/// A stage left unset fails with [`PathError::AlgorithmNotImplemented`] the
/// first time a request needs it.
pub struct Pathfinder<G: CorridorGraph> {
    low_fidelity: Option<BoxedLowFidelity<G>>,
    high_fidelity: Option<BoxedHighFidelity<G>>,
    spatial_lookup: SpatialLookup<G::Node>,
}

impl<G: CorridorGraph> Pathfinder<G> {
    /// A pathfinder with no stages configured.
    pub fn new<L>(spatial_lookup: L) -> Self
    where
        L: Fn(Point) -> Option<G::Node> + Send + Sync + 'static,
    {
        Self {
            low_fidelity: None,
            high_fidelity: None,
            spatial_lookup: Box::new(spatial_lookup),
        }
    }

    /// A* corridors refined by the funnel, both driven by `config`.
    pub fn standard<L>(config: SearchConfig, spatial_lookup: L) -> Self
    where
        L: Fn(Point) -> Option<G::Node> + Send + Sync + 'static,
    {
        Self::new(spatial_lookup)
            .with_low_fidelity(AStar::new(config))
            .with_high_fidelity(FunnelAlgorithm::new(config.apex_epsilon))
    }

    pub fn with_low_fidelity<A>(mut self, algorithm: A) -> Self
    where
        A: LowFidelity<G> + Send + Sync + 'static,
    {
        self.low_fidelity = Some(Box::new(algorithm));
        self
    }

    pub fn with_high_fidelity<A>(mut self, algorithm: A) -> Self
    where
        A: HighFidelity<G> + Send + Sync + 'static,
    {
        self.high_fidelity = Some(Box::new(algorithm));
        self
    }

    /// Plan from `source` to `destination` over `graph`.
    ///
    /// With `low_resolution` the coarse corridor is returned as-is and the
    /// high-fidelity stage is not consulted.
    pub fn find_path(
        &self,
        source: Point,
        destination: Point,
        graph: &G,
        low_resolution: bool,
    ) -> PathResult<Route<G::Node>> {
        let source_node =
            (self.spatial_lookup)(source).ok_or(PathError::OutsideNavigation(source))?;
        let destination_node =
            (self.spatial_lookup)(destination).ok_or(PathError::OutsideNavigation(destination))?;

        let low_fidelity = self
            .low_fidelity
            .as_ref()
            .ok_or(PathError::AlgorithmNotImplemented("low"))?;
        let corridor = low_fidelity.find_corridor(graph, source_node, destination_node)?;
        debug!(
            ?source_node,
            ?destination_node,
            corridor = corridor.len(),
            "corridor found"
        );

        if low_resolution {
            return Ok(Route::Coarse(corridor));
        }

        let high_fidelity = self
            .high_fidelity
            .as_ref()
            .ok_or(PathError::AlgorithmNotImplemented("high"))?;
        let points = high_fidelity.refine(graph, source, destination, &corridor)?;
        debug!(points = points.len(), "path refined");

        Ok(Route::Refined(points))
    }
}

impl<G: CorridorGraph> fmt::Debug for Pathfinder<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pathfinder")
            .field("low_fidelity", &self.low_fidelity.is_some())
            .field("high_fidelity", &self.high_fidelity.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::{NavMesh, RegionId};
    use std::sync::Arc;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    /// An L: two squares north, then one east of the top one.
    fn l_shaped() -> Arc<NavMesh> {
        Arc::new(
            NavMesh::new(vec![
                square(0.0, 0.0, 2.0),
                square(0.0, 2.0, 2.0),
                square(2.0, 2.0, 2.0),
            ])
            .unwrap(),
        )
    }

    fn pathfinder(mesh: &Arc<NavMesh>) -> Pathfinder<NavMesh> {
        let lookup = Arc::clone(mesh);
        Pathfinder::standard(SearchConfig::default(), move |point| lookup.locate(point))
    }

    #[test]
    fn low_resolution_returns_the_corridor() {
        let mesh = l_shaped();
        let route = pathfinder(&mesh)
            .find_path(Point::new(1.0, 0.5), Point::new(3.5, 3.0), &mesh, true)
            .unwrap();

        assert_eq!(
            route,
            Route::Coarse(vec![RegionId::from_index(0), RegionId::from_index(1), RegionId::from_index(2)])
        );
        assert!(!route.is_refined());
    }

    #[test]
    fn refined_path_turns_at_the_inner_corner() {
        let mesh = l_shaped();
        let source = Point::new(1.0, 0.5);
        let destination = Point::new(3.5, 3.0);

        let route = pathfinder(&mesh)
            .find_path(source, destination, &mesh, false)
            .unwrap();
        let points = route.points().unwrap();

        assert_eq!(points.first(), Some(&source));
        assert_eq!(points.last(), Some(&destination));
        assert_eq!(points, &[source, Point::new(2.0, 2.0), destination]);
    }

    #[test]
    fn same_region_is_a_straight_line() {
        let mesh = l_shaped();
        let route = pathfinder(&mesh)
            .find_path(Point::new(0.5, 0.5), Point::new(1.5, 1.5), &mesh, false)
            .unwrap();
        assert_eq!(route.points().unwrap(), &[Point::new(0.5, 0.5), Point::new(1.5, 1.5)]);
    }

    #[test]
    fn points_off_the_mesh_are_rejected() {
        let mesh = l_shaped();
        let outside = Point::new(3.0, 0.5);
        let err = pathfinder(&mesh)
            .find_path(outside, Point::new(1.0, 1.0), &mesh, false)
            .unwrap_err();
        assert_eq!(err, PathError::OutsideNavigation(outside));
    }

    #[test]
    fn missing_stages_are_reported() {
        let mesh = l_shaped();
        let lookup = Arc::clone(&mesh);
        let bare: Pathfinder<NavMesh> = Pathfinder::new(move |point| lookup.locate(point));

        let err = bare
            .find_path(Point::new(1.0, 1.0), Point::new(3.0, 3.0), &mesh, true)
            .unwrap_err();
        assert_eq!(err, PathError::AlgorithmNotImplemented("low"));

        let lookup = Arc::clone(&mesh);
        let coarse_only: Pathfinder<NavMesh> = Pathfinder::new(move |point| lookup.locate(point))
            .with_low_fidelity(AStar::default());
        assert!(coarse_only
            .find_path(Point::new(1.0, 1.0), Point::new(3.0, 3.0), &mesh, true)
            .is_ok());
        assert_eq!(
            coarse_only
                .find_path(Point::new(1.0, 1.0), Point::new(3.0, 3.0), &mesh, false)
                .unwrap_err(),
            PathError::AlgorithmNotImplemented("high")
        );
    }

    #[test]
    fn disconnected_regions_have_no_path() {
        let mesh = Arc::new(NavMesh::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]).unwrap());
        let err = pathfinder(&mesh)
            .find_path(Point::new(0.5, 0.5), Point::new(5.5, 5.5), &mesh, false)
            .unwrap_err();
        assert_eq!(err, PathError::PathNotFound);
    }

    #[test]
    fn corridor_without_portal_fails() {
        let mesh = NavMesh::new(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]).unwrap();
        let corridor = [RegionId::from_index(0), RegionId::from_index(1)];
        let err = FunnelAlgorithm::default()
            .refine(&mesh, Point::new(0.5, 0.5), Point::new(5.5, 5.5), &corridor)
            .unwrap_err();
        assert_eq!(err, PathError::MissingPortal(0));
    }
}
