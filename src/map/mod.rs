// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use header::Bytes;

use crate::{Error, FormatError, GraphNode, IndexError, NodeId, Point, TileKey, WayId};

mod header;
mod neighbours;
mod streets;
mod writer;

pub use header::MapHeader;
pub use neighbours::Edge;
pub use streets::{fold_label, Street, StreetBlock, StreetCatalog};
pub use writer::MapWriter;

/// Number of bytes used by a single way: two endpoints, two coordinates each.
pub(crate) const WAY_SIZE: usize = 4;

/// Read-only, random-access view of a tiled binary map.
///
/// Ways are kept in their compact on-disk encoding, one buffer per row of tiles,
/// and decoded on demand. The store is immutable after loading, and may be shared
/// between any number of concurrent searches.
#[derive(Debug, Clone)]
pub struct MapStore {
    header: MapHeader,

    /// Cumulative end offsets (in bytes) of every tile's ways, in row-major order.
    tiles_sizes_prefix: Vec<u32>,

    /// Encoded ways of every row of tiles.
    rows: Vec<Box<[u8]>>,

    streets: StreetCatalog,
}

impl MapStore {
    /// Loads a map from a file at the provided path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let f = File::open(path)?;
        Self::from_reader(io::BufReader::new(f))
    }

    /// Loads a map by reading the provided stream to its end.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_buffer(&data)?)
    }

    /// Parses a map from an in-memory buffer.
    pub fn from_buffer(data: &[u8]) -> Result<Self, FormatError> {
        let mut bytes = Bytes::new(data);
        let header = MapHeader::parse(&mut bytes)?;
        let tiles = header.tiles_count();

        let prefix_size = tiles.checked_mul(3).ok_or(FormatError::Truncated {
            section: "tile prefix table",
            needed: usize::MAX,
            available: bytes.remaining(),
        })?;
        bytes.ensure("tile prefix table", prefix_size)?;
        if u32::try_from(tiles).is_err() {
            let (width, height) = header.grid_size;
            return Err(FormatError::GridTooLarge { width, height });
        }

        let tiles_sizes_prefix = (0..tiles)
            .map(|_| bytes.u24("tile prefix table"))
            .collect::<Result<Vec<_>, _>>()?;
        validate_prefix(&tiles_sizes_prefix)?;

        let ways_size = tiles_sizes_prefix.last().copied().unwrap_or_default() as usize;
        let ways = bytes.take("ways", ways_size)?;
        let width = header.grid_size.0 as usize;
        let rows: Vec<Box<[u8]>> = (0..header.grid_size.1 as usize)
            .map(|y| {
                let start = prefix_before(&tiles_sizes_prefix, y * width);
                let end = tiles_sizes_prefix[(y + 1) * width - 1] as usize;
                Box::from(&ways[start..end])
            })
            .collect();

        let streets = StreetCatalog::parse(&mut bytes)?;
        if bytes.remaining() > 0 {
            return Err(FormatError::TrailingBytes(bytes.remaining()));
        }

        let map = Self {
            header,
            tiles_sizes_prefix,
            rows,
            streets,
        };
        log::debug!(
            "loaded map: {}x{} tiles, {} ways, {} streets blocks",
            map.header.grid_size.0,
            map.header.grid_size.1,
            map.total_ways(),
            map.streets.blocks_count(),
        );
        Ok(map)
    }

    pub fn header(&self) -> &MapHeader {
        &self.header
    }

    /// Length of a tile side, in degrees.
    pub fn side(&self) -> f64 {
        self.header.side
    }

    pub fn streets(&self) -> &StreetCatalog {
        &self.streets
    }

    pub fn tiles_count(&self) -> usize {
        self.tiles_sizes_prefix.len()
    }

    pub fn total_ways(&self) -> usize {
        self.ways_size() / WAY_SIZE
    }

    /// Returns the number of node slots (way endpoints) in the whole map.
    /// Every endpoint has a distinct [MapStore::node_offset_id] below this value.
    pub fn total_node_slots(&self) -> usize {
        self.ways_size() / 2
    }

    fn ways_size(&self) -> usize {
        self.tiles_sizes_prefix.last().copied().unwrap_or_default() as usize
    }

    /// Returns the covered area as `[min lon, min lat, max lon, max lat]`.
    pub fn bounding_box(&self) -> [f64; 4] {
        let Point { x, y } = self.header.start_coordinates;
        let side = self.header.side;
        [
            x,
            y,
            x + self.header.grid_size.0 as f64 * side,
            y + self.header.grid_size.1 as f64 * side,
        ]
    }

    /// Translates absolute tile coordinates into this map's grid coordinates,
    /// returning `None` for tiles outside of the grid.
    pub fn local_tile(&self, key: TileKey) -> Option<(u32, u32)> {
        let x = key.x - self.header.first_tile.0 as i64;
        let y = key.y - self.header.first_tile.1 as i64;
        let (width, height) = self.header.grid_size;
        if x >= 0 && y >= 0 && x < width as i64 && y < height as i64 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// Returns the row-major number of a tile with the provided grid coordinates,
    /// which must be inside the grid. Loading rejects grids with more than `u32::MAX` tiles,
    /// so the result always fits.
    #[inline]
    pub(crate) fn tile_number(&self, tile_x: u32, tile_y: u32) -> u32 {
        tile_x + tile_y * self.header.grid_size.0
    }

    /// Iterates over grid coordinates of all tiles holding at least one way.
    pub fn non_empty_tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.header.grid_size.0;
        (0..self.tiles_sizes_prefix.len())
            .filter(|&n| !self.tile_span(n).is_empty())
            .map(move |n| (n as u32 % width, n as u32 / width))
    }

    /// Returns the number of ways inside a tile.
    pub fn tile_ways_number(&self, tile_number: u32) -> Result<usize, IndexError> {
        self.check_tile(tile_number)?;
        Ok(self.tile_span(tile_number as usize).len() / WAY_SIZE)
    }

    /// Iterates over all ways inside a tile.
    pub fn tile_ways(
        &self,
        tile_number: u32,
    ) -> Result<impl Iterator<Item = (WayId, (GraphNode, GraphNode))> + '_, IndexError> {
        self.check_tile(tile_number)?;
        Ok(self.tile_ways_unchecked(tile_number))
    }

    /// Returns both endpoints of all ways inside a tile with the provided grid coordinates.
    pub fn tile_edges(&self, tile_x: u32, tile_y: u32) -> Result<Vec<(GraphNode, GraphNode)>, IndexError> {
        let (width, height) = self.header.grid_size;
        if tile_x >= width || tile_y >= height {
            return Err(IndexError::Tile {
                tile: tile_y.saturating_mul(width).saturating_add(tile_x),
                tiles: self.tiles_count(),
            });
        }
        Ok(self
            .tile_ways_unchecked(self.tile_number(tile_x, tile_y))
            .map(|(_, nodes)| nodes)
            .collect())
    }

    /// Decodes both endpoints of a way.
    pub fn way(&self, way_id: WayId) -> Result<(GraphNode, GraphNode), IndexError> {
        let ways = self.tile_ways_number(way_id.tile_number)?;
        if way_id.local_way_id as usize >= ways {
            return Err(IndexError::Way { way: way_id, ways });
        }
        let [a, b] = way_id.nodes();
        Ok((self.node(a)?, self.node(b)?))
    }

    /// Decodes a way endpoint into a [GraphNode].
    pub fn node(&self, node_id: NodeId) -> Result<GraphNode, IndexError> {
        Ok(GraphNode {
            id: node_id,
            point: self.decode_node(node_id)?,
        })
    }

    /// Decodes the position of a way endpoint.
    pub fn decode_node(&self, node_id: NodeId) -> Result<Point, IndexError> {
        self.check_node(node_id)?;
        Ok(self.decode_node_unchecked(node_id))
    }

    /// Returns a compact, map-wide index of a node slot, suitable for bitsets
    /// of [MapStore::total_node_slots] bits.
    pub fn node_offset_id(&self, node_id: NodeId) -> Result<usize, IndexError> {
        self.check_node(node_id)?;
        let offset = prefix_before(&self.tiles_sizes_prefix, node_id.tile_number as usize)
            + 2 * node_id.local_node_id as usize;
        debug_assert_eq!(offset % 2, 0);
        Ok(offset / 2)
    }

    /// Finds the way endpoint closest to the provided position,
    /// looking at the position's tile and its 8 neighbors.
    ///
    /// Returns `None` if none of those tiles contains any ways.
    pub fn nearest_node(&self, position: Point) -> Option<GraphNode> {
        let center = position.tile(self.header.side);
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| TileKey::new(center.x + dx, center.y + dy)))
            .filter_map(|key| self.local_tile(key))
            .flat_map(|(x, y)| self.tile_ways_unchecked(self.tile_number(x, y)))
            .flat_map(|(_, (a, b))| [a, b])
            .min_by(|a, b| {
                let da = a.point.squared_distance_to(&position);
                let db = b.point.squared_distance_to(&position);
                da.total_cmp(&db)
            })
    }

    fn check_tile(&self, tile_number: u32) -> Result<(), IndexError> {
        if (tile_number as usize) < self.tiles_count() {
            Ok(())
        } else {
            Err(IndexError::Tile {
                tile: tile_number,
                tiles: self.tiles_count(),
            })
        }
    }

    fn check_node(&self, node_id: NodeId) -> Result<(), IndexError> {
        self.check_tile(node_id.tile_number)?;
        let nodes = self.tile_span(node_id.tile_number as usize).len() / 2;
        if (node_id.local_node_id as usize) < nodes {
            Ok(())
        } else {
            Err(IndexError::Node {
                node: node_id,
                nodes,
            })
        }
    }

    /// Returns the byte range of a tile's ways inside the whole way data.
    /// `tile_number` must be in bounds.
    fn tile_span(&self, tile_number: usize) -> std::ops::Range<usize> {
        prefix_before(&self.tiles_sizes_prefix, tile_number)
            ..self.tiles_sizes_prefix[tile_number] as usize
    }

    /// Returns the encoded ways of a tile. `tile_number` must be in bounds.
    fn tile_binary(&self, tile_number: u32) -> &[u8] {
        let width = self.header.grid_size.0 as usize;
        let tile_y = tile_number as usize / width;
        let row_start = prefix_before(&self.tiles_sizes_prefix, tile_y * width);
        let span = self.tile_span(tile_number as usize);
        &self.rows[tile_y][span.start - row_start..span.end - row_start]
    }

    fn tile_ways_unchecked(
        &self,
        tile_number: u32,
    ) -> impl Iterator<Item = (WayId, (GraphNode, GraphNode))> + '_ {
        let width = self.header.grid_size.0;
        let (tile_x, tile_y) = (tile_number % width, tile_number / width);
        self.tile_binary(tile_number)
            .chunks_exact(WAY_SIZE)
            .enumerate()
            .map(move |(local_way_id, c)| {
                let way_id = WayId {
                    tile_number,
                    local_way_id: local_way_id as u32,
                };
                let [a_id, b_id] = way_id.nodes();
                let a = GraphNode {
                    id: a_id,
                    point: self.decode_in_tile(tile_x, tile_y, c[0], c[1]),
                };
                let b = GraphNode {
                    id: b_id,
                    point: self.decode_in_tile(tile_x, tile_y, c[2], c[3]),
                };
                (way_id, (a, b))
            })
    }

    /// `node_id` must be in bounds.
    fn decode_node_unchecked(&self, node_id: NodeId) -> Point {
        let width = self.header.grid_size.0;
        let tile_x = node_id.tile_number % width;
        let tile_y = node_id.tile_number / width;
        let binary_tile = self.tile_binary(node_id.tile_number);
        let offset = 2 * node_id.local_node_id as usize;
        self.decode_in_tile(tile_x, tile_y, binary_tile[offset], binary_tile[offset + 1])
    }

    #[inline]
    fn decode_in_tile(&self, tile_x: u32, tile_y: u32, cx: u8, cy: u8) -> Point {
        let Point { x, y } = self.header.start_coordinates;
        let side = self.header.side;
        Point::new(
            x + tile_x as f64 * side + cx as f64 / 255. * side,
            y + tile_y as f64 * side + cy as f64 / 255. * side,
        )
    }
}

/// Returns the offset at which the ways of a tile start.
#[inline]
fn prefix_before(prefix: &[u32], tile_number: usize) -> usize {
    tile_number
        .checked_sub(1)
        .map(|i| prefix[i] as usize)
        .unwrap_or_default()
}

fn validate_prefix(prefix: &[u32]) -> Result<(), FormatError> {
    let mut previous = 0;
    for (tile, &current) in prefix.iter().enumerate() {
        let (previous_offset, current_offset) = (previous as usize, current as usize);
        if current < previous {
            return Err(FormatError::NonMonotonicPrefix {
                tile,
                previous: previous_offset,
                current: current_offset,
            });
        }
        let span = current_offset - previous_offset;
        if span % WAY_SIZE != 0 {
            return Err(FormatError::MisalignedPrefix { tile, span });
        }
        previous = current;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-12),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    /// 2x2 grid of tiles with side 0.01 starting at (0, 0).
    /// Tile 0 holds two ways, tile 1 is empty, tile 2 holds one way and tile 3 holds one way.
    fn simple_map() -> MapStore {
        let mut w = MapWriter::new((0, 0), (2, 2), 0.01);
        w.add_way(0, 0, [128, 0, 255, 255]).unwrap();
        w.add_way(0, 0, [0, 0, 10, 20]).unwrap();
        w.add_way(0, 1, [1, 2, 3, 4]).unwrap();
        w.add_way(1, 1, [0, 0, 255, 0]).unwrap();
        MapStore::from_buffer(&w.to_bytes(&crate::Raw).unwrap()).unwrap()
    }

    #[test]
    fn header_and_counts() {
        let map = simple_map();
        assert_eq!(map.header().grid_size, (2, 2));
        assert_eq!(map.header().first_tile, (0, 0));
        assert_eq!(map.side(), 0.01);
        assert_eq!(map.tiles_count(), 4);
        assert_eq!(map.total_ways(), 4);
        assert_eq!(map.total_node_slots(), 8);
        assert_eq!(map.tile_ways_number(0).unwrap(), 2);
        assert_eq!(map.tile_ways_number(1).unwrap(), 0);
        assert_eq!(map.tile_ways_number(2).unwrap(), 1);
        assert_eq!(map.tile_ways_number(3).unwrap(), 1);
        assert!(map.tile_ways_number(4).is_err());
        assert_eq!(
            map.non_empty_tiles().collect::<Vec<_>>(),
            [(0, 0), (0, 1), (1, 1)]
        );
    }

    #[test]
    fn decode_way() {
        let map = simple_map();
        let (a, b) = map
            .way(WayId {
                tile_number: 0,
                local_way_id: 0,
            })
            .unwrap();
        assert_almost_eq!(a.point.x, 128. / 255. * 0.01);
        assert_almost_eq!(a.point.y, 0.0);
        assert_almost_eq!(b.point.x, 0.01);
        assert_almost_eq!(b.point.y, 0.01);
        assert_eq!(
            b.id,
            NodeId {
                tile_number: 0,
                local_node_id: 1
            }
        );
    }

    #[test]
    fn decode_node_in_other_row() {
        let map = simple_map();
        let p = map
            .decode_node(NodeId {
                tile_number: 3,
                local_node_id: 1,
            })
            .unwrap();
        assert_almost_eq!(p.x, 0.02);
        assert_almost_eq!(p.y, 0.01);
    }

    #[test]
    fn out_of_bounds() {
        let map = simple_map();
        assert_eq!(
            map.way(WayId {
                tile_number: 0,
                local_way_id: 2
            }),
            Err(IndexError::Way {
                way: WayId {
                    tile_number: 0,
                    local_way_id: 2
                },
                ways: 2
            })
        );
        assert_eq!(
            map.decode_node(NodeId {
                tile_number: 1,
                local_node_id: 0
            }),
            Err(IndexError::Node {
                node: NodeId {
                    tile_number: 1,
                    local_node_id: 0
                },
                nodes: 0
            })
        );
        assert_eq!(
            map.node_offset_id(NodeId {
                tile_number: 9,
                local_node_id: 0
            }),
            Err(IndexError::Tile { tile: 9, tiles: 4 })
        );
        assert!(map.tile_edges(2, 0).is_err());
    }

    #[test]
    fn node_offsets_are_compact() {
        let map = simple_map();
        let mut offsets = (0..map.tiles_count() as u32)
            .flat_map(|t| map.tile_ways(t).unwrap().collect::<Vec<_>>())
            .flat_map(|(_, (a, b))| [a.id, b.id])
            .map(|id| map.node_offset_id(id).unwrap())
            .collect::<Vec<_>>();
        offsets.sort();
        assert_eq!(offsets, (0..map.total_node_slots()).collect::<Vec<_>>());
    }

    #[test]
    fn tile_edges() {
        let map = simple_map();
        let edges = map.tile_edges(1, 1).unwrap();
        assert_eq!(edges.len(), 1);
        assert_almost_eq!(edges[0].0.point.x, 0.01);
        assert_almost_eq!(edges[0].1.point.x, 0.02);
        assert!(map.tile_edges(1, 0).unwrap().is_empty());
    }

    #[test]
    fn nearest_node() {
        let map = simple_map();
        let n = map.nearest_node(Point::new(0.0003, 0.0009)).unwrap();
        assert_eq!(
            n.id,
            NodeId {
                tile_number: 0,
                local_node_id: 3
            }
        );
        assert!(map.nearest_node(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn bounding_box() {
        let map = simple_map();
        assert_eq!(map.bounding_box(), [0.0, 0.0, 0.02, 0.02]);
    }

    #[test]
    fn truncated_ways() {
        let mut data = simple_map_bytes();
        data.truncate(40 + 12 + 4);
        assert!(matches!(
            MapStore::from_buffer(&data),
            Err(FormatError::Truncated { section: "ways", .. })
        ));
    }

    #[test]
    fn non_monotonic_prefix() {
        let mut data = simple_map_bytes();
        // Second prefix entry (tile 1) set to 4, lower than tile 0's 8
        data[40 + 3] = 4;
        assert_eq!(
            MapStore::from_buffer(&data).unwrap_err(),
            FormatError::NonMonotonicPrefix {
                tile: 1,
                previous: 8,
                current: 4
            }
        );
    }

    #[test]
    fn misaligned_prefix() {
        let mut data = simple_map_bytes();
        data[40] = 6;
        assert_eq!(
            MapStore::from_buffer(&data).unwrap_err(),
            FormatError::MisalignedPrefix { tile: 0, span: 6 }
        );
    }

    #[test]
    fn trailing_bytes() {
        let mut data = simple_map_bytes();
        data.extend([0, 0]);
        assert_eq!(
            MapStore::from_buffer(&data).unwrap_err(),
            FormatError::TrailingBytes(2)
        );
    }

    #[test]
    fn huge_grid() {
        let header = MapHeader {
            first_tile: (0, 0),
            grid_size: (u32::MAX, u32::MAX),
            start_coordinates: Point::default(),
            side: 0.01,
        };
        let mut data = Vec::new();
        header.write(&mut data);

        assert!(matches!(
            MapStore::from_buffer(&data),
            Err(FormatError::Truncated {
                section: "tile prefix table",
                available: 0,
                ..
            })
        ));
    }

    fn simple_map_bytes() -> Vec<u8> {
        let mut w = MapWriter::new((0, 0), (2, 2), 0.01);
        w.add_way(0, 0, [128, 0, 255, 255]).unwrap();
        w.add_way(0, 0, [0, 0, 10, 20]).unwrap();
        w.to_bytes(&crate::Raw).unwrap()
    }
}
