// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};

use crate::map::Edge;
use crate::{Error, GraphNode, IndexError, MapStore};

mod astar;
mod greedy;
mod heap;
mod path;
mod visited;

pub use astar::a_star;
pub use greedy::greedy_path;
pub use path::Path;

use heap::{MinHeap, Prioritized};
use path::PredecessorLog;
use visited::VisitedSet;

/// Recommended number of allowed heap pops in [greedy_path] and [a_star]
/// before [SearchError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during [greedy_path] or [a_star].
///
/// Lack of a route is not an error: searches return `Ok(None)` in that case.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Map data could not be read. Signals corrupt data or an invalid start/end node.
    #[error(transparent)]
    Map(#[from] Error),

    /// The search was aborted through [SearchOptions::cancel].
    #[error("search cancelled")]
    Cancelled,

    /// Route search has exceeded its limit of steps.
    #[error("step limit exceeded")]
    StepLimitExceeded,
}

impl From<IndexError> for SearchError {
    fn from(e: IndexError) -> Self {
        Self::Map(Error::Index(e))
    }
}

/// Additional controls for route searches.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions<'a> {
    /// Limits how many entries may be popped from the frontier. Concluding that no route
    /// exists requires expanding every node reachable from the start, which may take
    /// very long on constrained hardware.
    pub step_limit: usize,

    /// Flag checked before every step of the search; once set, the search
    /// returns [SearchError::Cancelled].
    pub cancel: Option<&'a AtomicBool>,
}

impl Default for SearchOptions<'_> {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            cancel: None,
        }
    }
}

impl SearchOptions<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Search strategy used by [find_path].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Best-first search towards the goal, see [greedy_path].
    Greedy,

    /// Greedy search followed by a bounded shortest-path search, see [a_star].
    #[default]
    AStar,
}

/// Finds a route between two nodes with the chosen [Algorithm].
pub fn find_path(
    map: &MapStore,
    start: GraphNode,
    end: GraphNode,
    algorithm: Algorithm,
    options: &SearchOptions,
) -> Result<Option<Path>, SearchError> {
    match algorithm {
        Algorithm::Greedy => greedy_path(map, start, end, options),
        Algorithm::AStar => a_star(map, start, end, options),
    }
}

/// Frontier element: a directed traversal towards `end`, entered from `predecessor`.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    predecessor: Option<GraphNode>,
    start: GraphNode,
    end: GraphNode,
    distance: f64,
}

impl Prioritized for HeapEntry {
    #[inline]
    fn priority(&self) -> f64 {
        self.distance
    }
}

/// Decides how frontier entries are ordered and which ones are discarded upfront.
trait Strategy {
    /// Priority of the initial entry at `start`.
    fn seed(&self, start: &GraphNode, goal: &GraphNode) -> f64;

    /// Priority of traversing `edge` after settling `current`,
    /// or `None` if the traversal should never be considered.
    fn priority(&self, current: &HeapEntry, edge: &Edge, goal: &GraphNode) -> Option<f64>;
}

/// Shared search loop over the implicit graph of `map`.
///
/// Every popped entry whose end slot was not yet visited marks both its slots as visited
/// and is logged, together with its predecessor, for path reconstruction.
fn explore<S: Strategy>(
    map: &MapStore,
    start: GraphNode,
    goal: GraphNode,
    strategy: &S,
    options: &SearchOptions,
) -> Result<Option<Path>, SearchError> {
    let slots = map.total_node_slots();
    let mut heap: MinHeap<HeapEntry> = MinHeap::default();
    let mut visited = VisitedSet::new(slots);
    let mut log = PredecessorLog::with_capacity(slots);
    let mut steps: usize = 0;

    heap.push(HeapEntry {
        predecessor: None,
        start,
        end: start,
        distance: strategy.seed(&start, &goal),
    });

    loop {
        if options.is_cancelled() {
            log::warn!("search cancelled after {} steps", steps);
            return Err(SearchError::Cancelled);
        }

        let Some(entry) = heap.pop() else {
            log::debug!("no path found after {} steps", steps);
            return Ok(None);
        };

        let end_slot = map.node_offset_id(entry.end.id)?;
        if visited.contains(end_slot) {
            continue;
        }

        steps += 1;
        if steps > options.step_limit {
            log::warn!("search exceeded its limit of {} steps", options.step_limit);
            return Err(SearchError::StepLimitExceeded);
        }

        visited.insert(map.node_offset_id(entry.start.id)?);
        visited.insert(end_slot);
        log.push(entry.end, entry.predecessor);

        if entry.end.is(&goal) {
            let path = log.reconstruct(entry.end);
            log::debug!(
                "path found after {} steps: {} nodes, length {}",
                steps,
                path.len(),
                path.length(),
            );
            return Ok(Some(path));
        }

        for edge in map.neighbours(&entry.end) {
            if let Some(distance) = strategy.priority(&entry, &edge, &goal) {
                heap.push(HeapEntry {
                    predecessor: Some(entry.end),
                    start: edge.from,
                    end: edge.to,
                    distance,
                });
            }
        }

        if steps % 10_000 == 0 {
            log::trace!("step {}: frontier holds {} entries", steps, heap.len());
        }
    }
}
