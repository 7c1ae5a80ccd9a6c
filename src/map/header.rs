// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{FormatError, Point};

/// Size of the fixed map file header, in bytes.
pub(super) const HEADER_SIZE: usize = 2 * 4 + 2 * 4 + 2 * 8 + 8;

/// Fixed-size description of the tile grid, stored at the start of every map file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapHeader {
    /// Absolute coordinates of the bottom-left tile of the grid.
    /// Negative west of Greenwich and south of the equator.
    pub first_tile: (i32, i32),

    /// Width and height of the grid, in tiles.
    pub grid_size: (u32, u32),

    /// Longitude and latitude of the south-west corner of the grid.
    pub start_coordinates: Point,

    /// Length of a tile side, in degrees.
    pub side: f64,
}

impl MapHeader {
    /// Total number of tiles in the grid, saturating at `usize::MAX`.
    pub fn tiles_count(&self) -> usize {
        (self.grid_size.0 as usize).saturating_mul(self.grid_size.1 as usize)
    }

    pub(super) fn parse(bytes: &mut Bytes<'_>) -> Result<Self, FormatError> {
        bytes.ensure("header", HEADER_SIZE)?;
        let header = Self {
            first_tile: (bytes.i32("header")?, bytes.i32("header")?),
            grid_size: (bytes.u32("header")?, bytes.u32("header")?),
            start_coordinates: Point::new(bytes.f64("header")?, bytes.f64("header")?),
            side: bytes.f64("header")?,
        };

        if header.tiles_count() == 0 {
            return Err(FormatError::EmptyGrid);
        }
        Ok(header)
    }

    pub(super) fn write(&self, out: &mut Vec<u8>) {
        out.extend(self.first_tile.0.to_le_bytes());
        out.extend(self.first_tile.1.to_le_bytes());
        out.extend(self.grid_size.0.to_le_bytes());
        out.extend(self.grid_size.1.to_le_bytes());
        out.extend(self.start_coordinates.x.to_le_bytes());
        out.extend(self.start_coordinates.y.to_le_bytes());
        out.extend(self.side.to_le_bytes());
    }
}

/// Little-endian cursor over a byte buffer, failing with [FormatError::Truncated]
/// instead of panicking when the data runs out.
pub(super) struct Bytes<'a> {
    data: &'a [u8],
}

impl<'a> Bytes<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(super) fn remaining(&self) -> usize {
        self.data.len()
    }

    pub(super) fn ensure(&self, section: &'static str, needed: usize) -> Result<(), FormatError> {
        if self.data.len() < needed {
            Err(FormatError::Truncated {
                section,
                needed,
                available: self.data.len(),
            })
        } else {
            Ok(())
        }
    }

    pub(super) fn take(&mut self, section: &'static str, n: usize) -> Result<&'a [u8], FormatError> {
        self.ensure(section, n)?;
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, section: &'static str) -> Result<[u8; N], FormatError> {
        let mut a = [0; N];
        a.copy_from_slice(self.take(section, N)?);
        Ok(a)
    }

    pub(super) fn u8(&mut self, section: &'static str) -> Result<u8, FormatError> {
        self.array::<1>(section).map(|[b]| b)
    }

    pub(super) fn u16(&mut self, section: &'static str) -> Result<u16, FormatError> {
        self.array(section).map(u16::from_le_bytes)
    }

    pub(super) fn u24(&mut self, section: &'static str) -> Result<u32, FormatError> {
        self.array::<3>(section)
            .map(|[a, b, c]| u32::from_le_bytes([a, b, c, 0]))
    }

    pub(super) fn u32(&mut self, section: &'static str) -> Result<u32, FormatError> {
        self.array(section).map(u32::from_le_bytes)
    }

    pub(super) fn i32(&mut self, section: &'static str) -> Result<i32, FormatError> {
        self.array(section).map(i32::from_le_bytes)
    }

    pub(super) fn f64(&mut self, section: &'static str) -> Result<f64, FormatError> {
        self.array(section).map(f64::from_le_bytes)
    }
}
