//! A* Search
//!
//! Best-first search over any graph implementing [`AStarGraph`]. Scores and
//! predecessors live in the search itself, so graph nodes stay plain values
//! and one graph can serve concurrent searches.
//!
//! # Ordering
//!
//! The frontier is a binary heap keyed on `f = g + h`. Entries with equal
//! `f` pop in push order. A node whose cost improves is pushed again; the
//! older entry is skipped when it surfaces.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{trace, warn};

use super::config::SearchConfig;
use crate::error::{PathError, PathResult};

/// A graph A* can walk.
pub trait AStarGraph {
    type Node: Copy + Eq + Hash + Debug;

    fn neighbours(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Cost of stepping from `from` to its neighbour `node`.
    fn g_score_from(&self, node: Self::Node, from: Self::Node) -> f64;

    /// Estimated remaining cost from `node` to `goal`.
    fn h_score_from(&self, goal: Self::Node, node: Self::Node) -> f64;
}

/// Decides when the search may stop.
///
/// `path` maps each reached node to its predecessor.
pub trait GoalTest<N> {
    fn is_finished(&self, current: N, goal: N, path: &HashMap<N, N>) -> bool;
}

impl<N, F> GoalTest<N> for F
where
    F: Fn(N, N, &HashMap<N, N>) -> bool,
{
    fn is_finished(&self, current: N, goal: N, path: &HashMap<N, N>) -> bool {
        self(current, goal, path)
    }
}

/// Stop when the goal node itself is expanded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReachedGoal;

impl<N: PartialEq> GoalTest<N> for ReachedGoal {
    fn is_finished(&self, current: N, goal: N, _path: &HashMap<N, N>) -> bool {
        current == goal
    }
}

/// Frontier entry.
#[derive(Debug)]
struct HeapEntry<N> {
    f_score: f64,
    seq: u64,
    node: N,
}

impl<N> PartialEq for HeapEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N> Eq for HeapEntry<N> {}

impl<N> Ord for HeapEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: lower f first, then earlier push.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<N> PartialOrd for HeapEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search with a pluggable goal test.
#[derive(Debug, Clone)]
pub struct AStar<T = ReachedGoal> {
    config: SearchConfig,
    goal_test: T,
}

impl AStar<ReachedGoal> {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            goal_test: ReachedGoal,
        }
    }
}

impl Default for AStar<ReachedGoal> {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl<T> AStar<T> {
    pub fn with_goal_test(config: SearchConfig, goal_test: T) -> Self {
        Self { config, goal_test }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search from `start` to `goal`. A missing `start` searches from the
    /// goal itself.
    ///
    /// Returns the nodes from start to the node that satisfied the goal
    /// test, inclusive.
    pub fn find_path<G>(&self, graph: &G, goal: G::Node, start: Option<G::Node>) -> PathResult<Vec<G::Node>>
    where
        G: AStarGraph,
        T: GoalTest<G::Node>,
    {
        let start = start.unwrap_or(goal);

        let mut g_scores: HashMap<G::Node, f64> = HashMap::from([(start, 0.0)]);
        let mut path: HashMap<G::Node, G::Node> = HashMap::new();
        let mut closed: HashSet<G::Node> = HashSet::new();
        let mut frontier = BinaryHeap::new();
        let mut seq = 0;
        let mut expansions = 0;

        frontier.push(HeapEntry {
            f_score: 0.0,
            seq,
            node: start,
        });

        while let Some(HeapEntry { node: current, .. }) = frontier.pop() {
            if !closed.insert(current) {
                continue;
            }

            if self.goal_test.is_finished(current, goal, &path) {
                trace!(?start, ?goal, expansions, "path found");
                return Ok(reconstruct_path(current, &path));
            }

            if let Some(limit) = self.config.max_expansions {
                if expansions >= limit {
                    warn!(?start, ?goal, limit, "search expansion limit reached");
                    return Err(PathError::ExpansionLimit(limit));
                }
            }
            expansions += 1;

            let current_g = g_scores.get(&current).copied().unwrap_or_default();
            for neighbour in graph.neighbours(current) {
                if closed.contains(&neighbour) {
                    continue;
                }

                let tentative = current_g + graph.g_score_from(neighbour, current);
                let improves = g_scores
                    .get(&neighbour)
                    .map_or(true, |&known| tentative < known);

                if improves {
                    path.insert(neighbour, current);
                    g_scores.insert(neighbour, tentative);
                    seq += 1;
                    frontier.push(HeapEntry {
                        f_score: tentative + graph.h_score_from(goal, neighbour),
                        seq,
                        node: neighbour,
                    });
                }
            }
        }

        trace!(?start, ?goal, expansions, "frontier exhausted");
        Err(PathError::PathNotFound)
    }
}

/// Walk predecessors back from `node` and return the path in forward order.
pub fn reconstruct_path<N>(node: N, path: &HashMap<N, N>) -> Vec<N>
where
    N: Copy + Eq + Hash,
{
    let mut result = vec![node];
    let mut current = node;
    while let Some(&previous) = path.get(&current) {
        result.push(previous);
        current = previous;
    }
    result.reverse();
    result
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
