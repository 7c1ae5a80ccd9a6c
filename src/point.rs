// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::TILE_BORDER_THICKNESS;

/// A geographic position in degrees: `x` is the longitude, `y` the latitude.
///
/// All distances between points are planar (euclidean over degrees). This is only
/// a proxy for real distances, good enough over the small extent of a few tiles,
/// but distorted by latitude and meaningless across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared planar distance, in squared degrees.
    #[inline]
    pub fn squared_distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Planar distance, in degrees.
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.squared_distance_to(other).sqrt()
    }

    /// Checks whether two points should be considered the same junction,
    /// that is, if they are no further than [TILE_BORDER_THICKNESS] apart.
    #[inline]
    pub fn is(&self, other: &Point) -> bool {
        self.squared_distance_to(other) <= TILE_BORDER_THICKNESS * TILE_BORDER_THICKNESS
    }
}
