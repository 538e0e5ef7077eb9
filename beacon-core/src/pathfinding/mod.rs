//! Pathfinding
//!
//! Hierarchical planning: A* over a coarse region graph picks a corridor,
//! then the funnel pulls the shortest point path through the corridor's
//! portals. [`NavMesh`] is a ready-made coarse graph built from convex
//! polygons.

mod astar;
mod config;
mod funnel;
mod geometry;
mod navmesh;
mod pathfinder;

pub use astar::{reconstruct_path, AStar, AStarGraph, GoalTest, ReachedGoal};
pub use config::SearchConfig;
pub use funnel::{Funnel, FunnelAlgorithm};
pub use geometry::{triangle_area_squared, Point, Portal};
pub use navmesh::{NavMesh, RegionId};
pub use pathfinder::{CorridorGraph, HighFidelity, LowFidelity, Pathfinder, Route, SpatialLookup};
