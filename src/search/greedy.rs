// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{explore, HeapEntry, Path, SearchError, SearchOptions, Strategy};
use crate::map::Edge;
use crate::{GraphNode, MapStore};

/// Orders the frontier by squared straight-line distance to the goal.
struct Greedy;

impl Strategy for Greedy {
    fn seed(&self, start: &GraphNode, goal: &GraphNode) -> f64 {
        start.point.squared_distance_to(&goal.point)
    }

    fn priority(&self, _: &HeapEntry, edge: &Edge, goal: &GraphNode) -> Option<f64> {
        Some(edge.to.point.squared_distance_to(&goal.point))
    }
}

/// Runs a greedy best-first search between two nodes over the implicit graph of `map`.
///
/// The node closest to `end` (in a straight line) is always expanded first.
/// This finds a route quickly and with little memory, but the route is not guaranteed
/// to be the shortest one.
///
/// Returns `Ok(None)` if `end` is unreachable from `start`.
pub fn greedy_path(
    map: &MapStore,
    start: GraphNode,
    end: GraphNode,
    options: &SearchOptions,
) -> Result<Option<Path>, SearchError> {
    explore(map, start, end, &Greedy, options)
}
