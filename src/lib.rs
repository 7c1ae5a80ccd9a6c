// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Offline routing over tiled binary road maps.
//!
//! The map file splits the world into a grid of square tiles. Every tile stores its road
//! segments ("ways") as 4 bytes: two endpoints, each encoded as a fraction of the tile side.
//! A [MapStore] gives random access to those ways without building an explicit graph.
//! Instead, adjacency is recomputed on demand by looking for geometrically coincident
//! endpoints in all tiles a node touches ([MapStore::neighbours]).
//!
//! Two searches run over this implicit graph: a greedy best-first search ([greedy_path])
//! and a bounded A*-like search ([a_star]), which uses the greedy route length to prune
//! dominated branches.
//!
//! # Example
//!
//! ```no_run
//! use tileroute::{MapStore, Point, SearchOptions};
//!
//! let map = MapStore::open("path/to/city.map").expect("failed to load the map");
//!
//! let start = map.nearest_node(Point::new(5.7912, 45.2203)).unwrap();
//! let end = map.nearest_node(Point::new(5.8001, 45.2244)).unwrap();
//!
//! match tileroute::a_star(&map, start, end, &SearchOptions::default()) {
//!     Ok(Some(path)) => println!("Route: {:?}", path.travel_order()),
//!     Ok(None) => println!("No route"),
//!     Err(e) => eprintln!("Search failed: {}", e),
//! }
//! ```

mod compression;
mod error;
pub mod map;
mod point;
mod search;
mod spatial;

pub use compression::{Bzip2, Compressor, DecompressError, Decompressor, Raw, Zlib};
pub use error::{Error, FormatError, IndexError};
pub use map::{
    fold_label, Edge, MapHeader, MapStore, MapWriter, Street, StreetBlock, StreetCatalog,
};
pub use point::Point;
pub use search::{
    a_star, find_path, greedy_path, Algorithm, Path, SearchError, SearchOptions,
    DEFAULT_STEP_LIMIT,
};
pub use spatial::{TileKey, TILE_BORDER_THICKNESS};

/// Address of a single way endpoint inside the map file.
///
/// Every way owns two consecutive node slots, so `local_node_id` is either
/// `2 * local_way_id` or `2 * local_way_id + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub tile_number: u32,
    pub local_node_id: u32,
}

impl NodeId {
    /// Returns the id of the way this endpoint belongs to.
    pub fn way(&self) -> WayId {
        WayId {
            tile_number: self.tile_number,
            local_way_id: self.local_node_id / 2,
        }
    }
}

/// Address of a way (road segment) inside the map file.
///
/// Street catalog entries refer to ways with this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WayId {
    pub tile_number: u32,
    pub local_way_id: u32,
}

impl WayId {
    /// Returns ids of both endpoints of the way.
    pub fn nodes(&self) -> [NodeId; 2] {
        [
            NodeId {
                tile_number: self.tile_number,
                local_node_id: 2 * self.local_way_id,
            },
            NodeId {
                tile_number: self.tile_number,
                local_node_id: 2 * self.local_way_id + 1,
            },
        ]
    }
}

/// A node of the implicit road graph: a way endpoint together with its decoded position.
///
/// Junctions lying on tile borders are stored once per tile they touch, so a single physical
/// junction may be represented by several [GraphNodes](GraphNode) with different ids.
/// Use [GraphNode::is] to check whether two nodes are the same junction; the derived
/// `PartialEq` compares addresses and positions exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub point: Point,
}

impl GraphNode {
    /// Returns true if both nodes lie within [TILE_BORDER_THICKNESS] of each other.
    #[inline]
    pub fn is(&self, other: &GraphNode) -> bool {
        self.point.is(&other.point)
    }
}
