// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::MapStore;
use crate::GraphNode;

/// Represents a directed traversal of a way.
///
/// `from` is the copy of the starting junction stored in the way's own tile;
/// it is geometrically identical (see [GraphNode::is]), but not necessarily
/// address-identical, to the node whose neighbours were requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: GraphNode,
    pub to: GraphNode,
}

impl Edge {
    /// Planar length of the edge, in degrees.
    #[inline]
    pub fn length(&self) -> f64 {
        self.from.point.distance_to(&self.to.point)
    }
}

impl MapStore {
    /// Lists all edges leaving a node.
    ///
    /// There is no stored adjacency: every tile the node's position belongs to is
    /// re-scanned, and every way with an endpoint coincident with `node` yields an
    /// edge towards its other endpoint. Junctions duplicated across tile borders
    /// are stitched together this way.
    pub fn neighbours(&self, node: &GraphNode) -> Vec<Edge> {
        let mut edges = Vec::new();
        for key in node.point.tiles(self.side()) {
            let Some((tile_x, tile_y)) = self.local_tile(key) else {
                continue;
            };

            for (_, (a, b)) in self.tile_ways_unchecked(self.tile_number(tile_x, tile_y)) {
                if a.is(node) {
                    edges.push(Edge { from: a, to: b });
                }
                if b.is(node) {
                    edges.push(Edge { from: b, to: a });
                }
            }
        }
        edges
    }
}
