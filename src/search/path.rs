// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{GraphNode, Point};

/// A route found by a search, stored from the destination back to the origin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    nodes: Vec<GraphNode>,
}

impl Path {
    /// Nodes of the path, from the destination to the origin.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Positions of the path in travel order, from the origin to the destination.
    pub fn travel_order(&self) -> Vec<Point> {
        self.nodes.iter().rev().map(|n| n.point).collect()
    }

    /// Sum of planar lengths of all path segments, in degrees.
    pub fn length(&self) -> f64 {
        self.nodes
            .windows(2)
            .map(|w| w[0].point.distance_to(&w[1].point))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Chronological record of settled nodes and the node they were reached from.
#[derive(Debug, Clone, Default)]
pub(crate) struct PredecessorLog {
    entries: Vec<(GraphNode, Option<GraphNode>)>,
}

impl PredecessorLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, node: GraphNode, predecessor: Option<GraphNode>) {
        self.entries.push((node, predecessor));
    }

    /// Walks the log backwards from `goal`, following predecessors of
    /// geometrically identical nodes, until an entry without a predecessor is reached.
    pub(crate) fn reconstruct(&self, goal: GraphNode) -> Path {
        let mut nodes = vec![goal];
        let mut last = goal;

        for &(node, predecessor) in self.entries.iter().rev() {
            if !node.is(&last) {
                continue;
            }
            match predecessor {
                Some(p) => {
                    nodes.push(p);
                    last = p;
                }
                None => break,
            }
        }

        Path { nodes }
    }
}
