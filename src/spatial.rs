// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Point;

/// Distance (in degrees) under which a point is considered to lie on a tile border,
/// roughly one meter. Also used as the tolerance for [Point::is].
pub const TILE_BORDER_THICKNESS: f64 = 1. / 111_200.;

/// Absolute coordinates of a tile in the global grid of tiles with a given side.
///
/// Tile `(x, y)` covers longitudes `[x * side, (x + 1) * side)`
/// and latitudes `[y * side, (y + 1) * side)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: i64,
    pub y: i64,
}

impl TileKey {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Point {
    /// Returns the tile owning this point, after snapping the point to the
    /// 1/255 sub-grid used by way encoding.
    pub fn tile(&self, side: f64) -> TileKey {
        let x = (self.x * 255. / side).round() as i64;
        let y = (self.y * 255. / side).round() as i64;
        TileKey::new(x.div_euclid(255), y.div_euclid(255))
    }

    /// Iterates over all tiles this point belongs to.
    ///
    /// Besides its owning tile, a point within [TILE_BORDER_THICKNESS] of a tile border
    /// also belongs to the tile across that border, and a point close to two adjacent
    /// borders also belongs to the diagonal tile. This yields 1, 2 or 4 tiles.
    ///
    /// Junctions on tile borders are duplicated into every tile they touch when the map
    /// is built, so scanning all of these tiles finds every copy of a junction.
    pub fn tiles(&self, side: f64) -> impl Iterator<Item = TileKey> {
        let TileKey { x, y } = self.tile(side);

        let at_right = (x + 1) as f64 * side - self.x < TILE_BORDER_THICKNESS;
        let at_left = self.x - x as f64 * side < TILE_BORDER_THICKNESS;
        let at_top = (y + 1) as f64 * side - self.y < TILE_BORDER_THICKNESS;
        let at_bottom = self.y - y as f64 * side < TILE_BORDER_THICKNESS;

        [
            Some(TileKey::new(x, y)),
            at_left.then_some(TileKey::new(x - 1, y)),
            (at_top && at_left).then_some(TileKey::new(x - 1, y + 1)),
            at_top.then_some(TileKey::new(x, y + 1)),
            (at_top && at_right).then_some(TileKey::new(x + 1, y + 1)),
            at_right.then_some(TileKey::new(x + 1, y)),
            (at_bottom && at_right).then_some(TileKey::new(x + 1, y - 1)),
            at_bottom.then_some(TileKey::new(x, y - 1)),
            (at_bottom && at_left).then_some(TileKey::new(x - 1, y - 1)),
        ]
        .into_iter()
        .flatten()
    }
}
