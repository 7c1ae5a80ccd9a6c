// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::{explore, greedy_path, HeapEntry, Path, SearchError, SearchOptions, Strategy};
use crate::map::Edge;
use crate::{GraphNode, MapStore};

/// Orders the frontier by travelled distance, discarding every traversal which
/// can't beat `bound` even in a straight line to the goal.
struct Bounded {
    bound: f64,
}

impl Strategy for Bounded {
    fn seed(&self, _: &GraphNode, _: &GraphNode) -> f64 {
        0.0
    }

    fn priority(&self, current: &HeapEntry, edge: &Edge, goal: &GraphNode) -> Option<f64> {
        let travelled = current.distance + edge.length();
        let estimate = travelled + edge.to.point.distance_to(&goal.point);
        if estimate < self.bound {
            Some(travelled)
        } else {
            None
        }
    }
}

/// Finds a short route between two nodes over the implicit graph of `map`.
///
/// A [greedy search](super::greedy_path) runs first, and the length of its route is used
/// as an upper bound for a second, Dijkstra-like pass ordered by travelled distance.
/// Any branch which can't produce a route strictly shorter than the bound is pruned,
/// which keeps the second pass small. If nothing shorter exists, the greedy route is returned,
/// so the result is never longer than the greedy one.
///
/// Returns `Ok(None)` if `end` is unreachable from `start`.
pub fn a_star(
    map: &MapStore,
    start: GraphNode,
    end: GraphNode,
    options: &SearchOptions,
) -> Result<Option<Path>, SearchError> {
    let Some(greedy) = greedy_path(map, start, end, options)? else {
        return Ok(None);
    };

    let bound = greedy.length();
    match explore(map, start, end, &Bounded { bound }, options)? {
        Some(path) if path.length() <= bound => Ok(Some(path)),
        _ => Ok(Some(greedy)),
    }
}
