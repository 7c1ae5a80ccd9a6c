// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io::{self, Write};

use super::streets::{fold_label, StreetBlock, STREETS_HEADER_SIZE};
use super::{MapHeader, Street};
use crate::compression::Compressor;
use crate::{IndexError, Point, WayId};

/// Largest offset representable in the 24-bit tile prefix table.
const MAX_PREFIX: usize = (1 << 24) - 1;

/// Helper object for producing map files understood by [MapStore](crate::MapStore).
///
/// Ways are added to specific tiles, already encoded, or as segments between two points
/// which fit in a single tile. Streets are grouped into roughly `sqrt(n)` alphabetically
/// sorted blocks, each compressed with the [Compressor] given to [MapWriter::write].
#[derive(Debug, Clone)]
pub struct MapWriter {
    header: MapHeader,
    tiles: Vec<Vec<[u8; 4]>>,
    streets: Vec<Street>,
}

impl MapWriter {
    /// Creates an empty map over a grid of `grid_size` tiles, starting at absolute tile `first_tile`.
    pub fn new(first_tile: (i32, i32), grid_size: (u32, u32), side: f64) -> Self {
        let header = MapHeader {
            first_tile,
            grid_size,
            start_coordinates: Point::new(first_tile.0 as f64 * side, first_tile.1 as f64 * side),
            side,
        };
        Self {
            tiles: vec![Vec::new(); header.tiles_count()],
            header,
            streets: Vec::new(),
        }
    }

    /// Adds an already-encoded way (`[cx1, cy1, cx2, cy2]`) to a tile with the given grid coordinates.
    pub fn add_way(&mut self, tile_x: u32, tile_y: u32, encoded: [u8; 4]) -> Result<WayId, IndexError> {
        let (width, height) = self.header.grid_size;
        if tile_x >= width || tile_y >= height {
            return Err(IndexError::Tile {
                tile: tile_y.saturating_mul(width).saturating_add(tile_x),
                tiles: self.tiles.len(),
            });
        }

        let tile_number = tile_x + tile_y * width;
        let tile = &mut self.tiles[tile_number as usize];
        tile.push(encoded);
        Ok(WayId {
            tile_number,
            local_way_id: (tile.len() - 1) as u32,
        })
    }

    /// Adds a segment between two points. Both points must lie within (or on the border of)
    /// the tile containing the segment's midpoint, which must be inside the grid.
    ///
    /// Returns `None` if the segment doesn't fit in a single tile of the grid.
    pub fn add_segment(&mut self, a: Point, b: Point) -> Option<WayId> {
        let side = self.header.side;
        let midpoint = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        let tile_x = (midpoint.x / side).floor() as i64 - self.header.first_tile.0 as i64;
        let tile_y = (midpoint.y / side).floor() as i64 - self.header.first_tile.1 as i64;
        if tile_x < 0 || tile_y < 0 {
            return None;
        }
        let (tile_x, tile_y) = (u32::try_from(tile_x).ok()?, u32::try_from(tile_y).ok()?);

        let origin = Point::new(
            self.header.start_coordinates.x + tile_x as f64 * side,
            self.header.start_coordinates.y + tile_y as f64 * side,
        );
        let [cx1, cy1] = encode(a, origin, side)?;
        let [cx2, cy2] = encode(b, origin, side)?;
        self.add_way(tile_x, tile_y, [cx1, cy1, cx2, cy2]).ok()
    }

    /// Registers a named street made of previously added ways.
    /// The label is stored without accents (see [fold_label]).
    pub fn add_street<S: AsRef<str>>(&mut self, label: S, ways: Vec<WayId>) {
        self.streets.push(Street {
            label: fold_label(label.as_ref()),
            ways,
        });
    }

    /// Encodes the map into a new buffer.
    pub fn to_bytes(&self, compressor: &dyn Compressor) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, compressor)?;
        Ok(out)
    }

    /// Encodes the map into the provided writer.
    pub fn write<W: Write>(&self, writer: &mut W, compressor: &dyn Compressor) -> io::Result<()> {
        let mut out = Vec::new();
        self.header.write(&mut out);

        let mut end = 0;
        for tile in &self.tiles {
            end += 4 * tile.len();
            if end > MAX_PREFIX {
                return Err(invalid_data("ways don't fit in the 24-bit prefix table"));
            }
            out.extend(&(end as u32).to_le_bytes()[0..3]);
        }
        out.extend(self.tiles.iter().flatten().flatten());

        self.write_streets(&mut out, compressor)?;
        writer.write_all(&out)
    }

    fn write_streets(&self, out: &mut Vec<u8>, compressor: &dyn Compressor) -> io::Result<()> {
        for way in self.streets.iter().flat_map(|s| &s.ways) {
            if way.tile_number > u16::MAX as u32 || way.local_way_id > u8::MAX as u32 {
                return Err(invalid_data("street way reference doesn't fit in 3 bytes"));
            }
        }

        let mut sorted = self.streets.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.label.cmp(&b.label));

        let block_size = ((sorted.len() as f64).sqrt().ceil() as usize).max(1);
        let mut labels = String::new();
        let mut offsets = vec![0u32];
        let mut blocks = Vec::new();
        for chunk in sorted.chunks(block_size) {
            labels.push_str(&chunk[0].label);
            labels.push('\n');

            let streets = chunk.iter().map(|&s| s.clone()).collect::<Vec<_>>();
            blocks.extend(compressor.compress(&StreetBlock::encode(&streets))?);
            offsets.push(blocks.len() as u32);
        }

        let blocks_count =
            u16::try_from(offsets.len() - 1).map_err(|_| invalid_data("too many street blocks"))?;
        let labels_size =
            u16::try_from(labels.len()).map_err(|_| invalid_data("street labels too long"))?;
        let total = STREETS_HEADER_SIZE + labels.len() + 4 * offsets.len() + blocks.len();
        let total = u32::try_from(total).map_err(|_| invalid_data("streets section too large"))?;

        out.extend(total.to_le_bytes());
        out.extend(blocks_count.to_le_bytes());
        out.extend(labels_size.to_le_bytes());
        out.extend(labels.as_bytes());
        out.extend(offsets.iter().flat_map(|o| o.to_le_bytes()));
        out.extend(blocks);
        Ok(())
    }
}

/// Encodes a point as a fraction of a tile side, in 1/255 units.
fn encode(p: Point, origin: Point, side: f64) -> Option<[u8; 2]> {
    let cx = ((p.x - origin.x) * 255. / side).round();
    let cy = ((p.y - origin.y) * 255. / side).round();
    if (0.0..=255.0).contains(&cx) && (0.0..=255.0).contains(&cy) {
        Some([cx as u8, cy as u8])
    } else {
        None
    }
}

fn invalid_data(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MapStore, Raw, Zlib};

    #[test]
    fn layout() {
        let mut w = MapWriter::new((0, 0), (1, 1), 0.01);
        w.add_way(0, 0, [1, 2, 3, 4]).unwrap();
        let data = w.to_bytes(&Raw).unwrap();

        // header, one prefix entry, one way, empty streets section (header + one offset)
        assert_eq!(data.len(), 40 + 3 + 4 + 8 + 4);
        assert_eq!(&data[40..43], &[4, 0, 0]);
        assert_eq!(&data[43..47], &[1, 2, 3, 4]);
        assert_eq!(&data[47..51], &12u32.to_le_bytes());
    }

    #[test]
    fn segment_outside_of_tile() {
        let mut w = MapWriter::new((0, 0), (2, 2), 0.01);
        assert!(w
            .add_segment(Point::new(0.001, 0.001), Point::new(0.019, 0.001))
            .is_none());
        assert!(w
            .add_segment(Point::new(0.031, 0.001), Point::new(0.032, 0.001))
            .is_none());
        assert!(w
            .add_segment(Point::new(0.011, 0.001), Point::new(0.02, 0.001))
            .is_some());
    }

    #[test]
    fn streets_are_readable() {
        let mut w = MapWriter::new((10, 20), (2, 1), 0.01);
        let a = w
            .add_segment(Point::new(0.101, 0.201), Point::new(0.105, 0.205))
            .unwrap();
        let b = w
            .add_segment(Point::new(0.111, 0.201), Point::new(0.115, 0.205))
            .unwrap();
        for (i, label) in ["Rue E", "Rue A", "Rue D", "Rue B", "Rue C"].iter().enumerate() {
            w.add_street(*label, vec![if i % 2 == 0 { a } else { b }]);
        }

        let map = MapStore::from_buffer(&w.to_bytes(&Zlib).unwrap()).unwrap();
        let streets = map.streets();
        assert_eq!(streets.blocks_count(), 2);
        assert_eq!(streets.labels(), ["Rue A", "Rue D"]);

        let c = streets.find("Rue C", &Zlib).unwrap().unwrap();
        assert_eq!(c.ways, [a]);
        assert!(streets.find("Rue Ç", &Zlib).unwrap().is_some());
        let (start, _) = map.way(c.ways[0]).unwrap();
        assert!((start.point.x - 0.101).abs() < 0.01 / 255.0);
    }
}
