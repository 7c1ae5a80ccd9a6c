// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

#![allow(dead_code)]

use tileroute::{GraphNode, MapStore, MapWriter, Point, Raw};

/// Side of fixture tiles, in degrees.
pub const SIDE: f64 = 0.01;

/// Fixture grid step: 51/255 of a tile side, so that every grid point is encoded exactly.
pub const STEP: f64 = SIDE * 51. / 255.;

macro_rules! assert_almost_eq {
    ($a:expr, $b:expr) => {
        assert!(
            (($a - $b).abs() < 1e-9),
            "assertion failed: {} ≈ {}",
            $a,
            $b
        )
    };
}
pub(crate) use assert_almost_eq;

/// Returns the fixture grid point `(i, j)`. Tile borders fall on multiples of 5.
pub fn p(i: u32, j: u32) -> Point {
    Point::new(i as f64 * STEP, j as f64 * STEP)
}

/// Builds a map over a `width`x`height` grid of tiles from segments between grid points.
/// Segments crossing a tile border must be split at the border by the caller.
pub fn build(width: u32, height: u32, segments: &[((u32, u32), (u32, u32))]) -> Vec<u8> {
    let mut w = MapWriter::new((0, 0), (width, height), SIDE);
    for &((ai, aj), (bi, bj)) in segments {
        w.add_segment(p(ai, aj), p(bi, bj))
            .expect("fixture segment must fit in a single tile");
    }
    w.to_bytes(&Raw).unwrap()
}

/// Two tiles side by side, with a short route S-B-(5,0)-G along the bottom
/// and a longer one S-A-(5,4)-C-G, which a greedy search prefers.
///
/// ```text
///  4       A ─────── (5,4) ─ C
///        /                     \
///  0  S ─ B ─────────── (5,0) ──── G
///     0   1    3         5    6    8
/// ```
pub fn detour() -> MapStore {
    MapStore::from_buffer(&build(
        2,
        1,
        &[
            ((0, 0), (3, 4)),
            ((3, 4), (5, 4)),
            ((5, 4), (6, 4)),
            ((6, 4), (8, 0)),
            ((0, 0), (1, 0)),
            ((1, 0), (5, 0)),
            ((5, 0), (8, 0)),
        ],
    ))
    .unwrap()
}

/// Two disconnected roads, one in each tile of a 2x1 grid.
pub fn disconnected() -> MapStore {
    MapStore::from_buffer(&build(2, 1, &[((1, 1), (4, 4)), ((6, 1), (9, 4))])).unwrap()
}

/// Returns the map node at the provided grid point.
pub fn node_at(map: &MapStore, i: u32, j: u32) -> GraphNode {
    let target = p(i, j);
    let node = map.nearest_node(target).expect("no node close to the point");
    assert!(node.point.is(&target), "no node exactly at ({}, {})", i, j);
    node
}
