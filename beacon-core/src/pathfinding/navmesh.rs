//! Navigation Mesh
//!
//! Walkable space as convex polygons with counter-clockwise winding. Two
//! polygons are neighbours when they share a full edge; that edge is the
//! portal between them.
//!
//! # Costs
//!
//! Stepping between regions costs the distance between their centroids, and
//! the heuristic is the centroid distance to the goal. The heuristic never
//! overestimates under that cost, so A* corridors are optimal over centroids.
//!
//! # Example
//!
//! ```rust
//! use beacon_core::pathfinding::{NavMesh, Point};
//!
//! let mesh = NavMesh::from_json(r#"{
//!     "polygons": [
//!         [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}, {"x": 0, "y": 1}],
//!         [{"x": 1, "y": 0}, {"x": 2, "y": 0}, {"x": 2, "y": 1}, {"x": 1, "y": 1}]
//!     ]
//! }"#).unwrap();
//!
//! let region = mesh.locate(Point::new(1.5, 0.5)).unwrap();
//! assert_eq!(region.index(), 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use super::astar::AStarGraph;
use super::geometry::{Point, Portal};
use super::pathfinder::CorridorGraph;
use crate::error::{PathError, PathResult};

const VERTEX_EPSILON: f64 = 1e-9;

/// Index of a polygon in its mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(usize);

impl RegionId {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Region {
    vertices: Vec<Point>,
    centroid: Point,
    /// Neighbour and the portal leading to it, oriented for a traveller
    /// leaving this region.
    links: SmallVec<[(RegionId, Portal); 4]>,
}

impl Region {
    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    fn contains(&self, point: Point) -> bool {
        self.edges()
            .all(|(a, b)| (b - a).cross(point - a) >= -VERTEX_EPSILON)
    }
}

#[derive(Debug, Deserialize)]
struct NavMeshData {
    polygons: Vec<Vec<Point>>,
}

/// A convex-polygon navigation mesh.
#[derive(Debug, Clone)]
pub struct NavMesh {
    regions: Vec<Region>,
}

impl NavMesh {
    /// Build a mesh and derive adjacency from shared edges.
    ///
    /// Every polygon needs at least three vertices in counter-clockwise
    /// order.
    pub fn new(polygons: Vec<Vec<Point>>) -> PathResult<Self> {
        let mut regions = Vec::with_capacity(polygons.len());
        for (index, vertices) in polygons.into_iter().enumerate() {
            if vertices.len() < 3 {
                return Err(PathError::Config(format!(
                    "polygon {index} has {} vertices; at least 3 are required",
                    vertices.len()
                )));
            }
            if signed_area(&vertices) <= 0.0 {
                return Err(PathError::Config(format!(
                    "polygon {index} is not wound counter-clockwise"
                )));
            }

            let sum = vertices.iter().fold(Point::default(), |acc, &v| acc + v);
            let centroid = sum * (1.0 / vertices.len() as f64);
            regions.push(Region {
                vertices,
                centroid,
                links: SmallVec::new(),
            });
        }

        let mut mesh = Self { regions };
        mesh.link_regions();
        debug!(
            regions = mesh.regions.len(),
            links = mesh.regions.iter().map(|r| r.links.len()).sum::<usize>(),
            "navmesh built"
        );
        Ok(mesh)
    }

    pub fn from_json(json: &str) -> PathResult<Self> {
        let data: NavMeshData = serde_json::from_str(json)?;
        Self::new(data.polygons)
    }

    fn link_regions(&mut self) {
        let count = self.regions.len();
        for a in 0..count {
            for b in (a + 1)..count {
                if let Some((start, end)) = self.shared_edge(a, b) {
                    // CCW winding walks the shared edge start -> end in `a`.
                    // Leaving `a`, `end` is on the traveller's left.
                    self.regions[a]
                        .links
                        .push((RegionId(b), Portal::new(end, start)));
                    self.regions[b]
                        .links
                        .push((RegionId(a), Portal::new(start, end)));
                }
            }
        }
    }

    /// The edge of `a`, in `a`'s winding, that `b` walks in reverse.
    fn shared_edge(&self, a: usize, b: usize) -> Option<(Point, Point)> {
        let first = &self.regions[a];
        let second = &self.regions[b];
        first.edges().find(|&(start, end)| {
            second.edges().any(|(other_start, other_end)| {
                start.approx_eq(other_end, VERTEX_EPSILON) && end.approx_eq(other_start, VERTEX_EPSILON)
            })
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionId> {
        (0..self.regions.len()).map(RegionId)
    }

    pub fn centroid(&self, region: RegionId) -> Option<Point> {
        self.regions.get(region.0).map(|r| r.centroid)
    }

    pub fn vertices(&self, region: RegionId) -> Option<&[Point]> {
        self.regions.get(region.0).map(|r| r.vertices.as_slice())
    }

    /// The region containing `point`, boundary included.
    ///
    /// A point on a shared edge belongs to the lower-indexed region.
    pub fn locate(&self, point: Point) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|region| region.contains(point))
            .map(RegionId)
    }

    fn centroid_distance(&self, a: RegionId, b: RegionId) -> f64 {
        match (self.centroid(a), self.centroid(b)) {
            (Some(a), Some(b)) => a.distance(b),
            _ => f64::INFINITY,
        }
    }
}

impl AStarGraph for NavMesh {
    type Node = RegionId;

    fn neighbours(&self, node: RegionId) -> Vec<RegionId> {
        self.regions
            .get(node.0)
            .map(|region| region.links.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    fn g_score_from(&self, node: RegionId, from: RegionId) -> f64 {
        self.centroid_distance(from, node)
    }

    fn h_score_from(&self, goal: RegionId, node: RegionId) -> f64 {
        self.centroid_distance(node, goal)
    }
}

impl CorridorGraph for NavMesh {
    fn portal_to(&self, from: RegionId, to: RegionId) -> Option<Portal> {
        self.regions
            .get(from.0)?
            .links
            .iter()
            .find(|(id, _)| *id == to)
            .map(|(_, portal)| *portal)
    }
}

/// Twice the signed area; positive for counter-clockwise winding.
fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum()
}
