// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::header::Bytes;
use crate::{Decompressor, Error, FormatError, IndexError, WayId};

/// Size of the fixed streets section header: total size, block count and labels size.
pub(super) const STREETS_HEADER_SIZE: usize = 4 + 2 + 2;

/// A named street, made of ways possibly scattered over many tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Street {
    pub label: String,
    pub ways: Vec<WayId>,
}

/// Decompressed contents of a single street catalog block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreetBlock {
    pub streets: Vec<Street>,
}

/// Alphabetically sorted index of street names, split into compressed blocks.
///
/// Only the label of the first street of every block is kept uncompressed;
/// everything else requires decompressing a block with a caller-provided [Decompressor].
#[derive(Debug, Clone, Default)]
pub struct StreetCatalog {
    labels: Vec<String>,
    block_offsets: Vec<u32>,
    compressed: Vec<u8>,
}

impl StreetCatalog {
    pub(super) fn parse(bytes: &mut Bytes<'_>) -> Result<Self, FormatError> {
        const SECTION: &str = "streets section";

        let declared = bytes.u32(SECTION)? as usize;
        let blocks_count = bytes.u16(SECTION)? as usize;
        let labels_size = bytes.u16(SECTION)? as usize;

        let fixed = STREETS_HEADER_SIZE + labels_size + 4 * (blocks_count + 1);
        let compressed_size =
            declared
                .checked_sub(fixed)
                .ok_or(FormatError::StreetsSizeMismatch {
                    declared,
                    computed: fixed,
                })?;

        let labels = std::str::from_utf8(bytes.take("street labels", labels_size)?)
            .map_err(|_| FormatError::InvalidUtf8 {
                section: "street labels",
            })?;
        let labels = split_lines(labels);

        let block_offsets = (0..=blocks_count)
            .map(|_| bytes.u32("street block offsets"))
            .collect::<Result<Vec<_>, _>>()?;
        let compressed = bytes.take("street blocks", compressed_size)?.to_vec();

        let offsets_valid = block_offsets.windows(2).all(|w| w[0] <= w[1])
            && block_offsets.last().copied() == Some(compressed.len() as u32);
        if !offsets_valid {
            return Err(FormatError::BadBlockOffsets);
        }

        Ok(Self {
            labels,
            block_offsets,
            compressed,
        })
    }

    /// Labels of the first street in every block, usable as a top-level menu.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the number of compressed blocks.
    pub fn blocks_count(&self) -> usize {
        self.block_offsets.len().saturating_sub(1)
    }

    /// Returns the raw (still compressed) bytes of a block.
    pub fn compressed_block(&self, index: usize) -> Result<&[u8], IndexError> {
        if index >= self.blocks_count() {
            return Err(IndexError::Block {
                block: index,
                blocks: self.blocks_count(),
            });
        }
        let start = self.block_offsets[index] as usize;
        let end = self.block_offsets[index + 1] as usize;
        Ok(&self.compressed[start..end])
    }

    /// Decompresses and decodes a single block.
    pub fn block(&self, index: usize, decompressor: &dyn Decompressor) -> Result<StreetBlock, Error> {
        let raw = decompressor.decompress(self.compressed_block(index)?)?;
        Ok(StreetBlock::parse(&raw)?)
    }

    /// Finds a street by its label, ignoring accents (see [fold_label]).
    ///
    /// As streets are sorted, only the block whose first label precedes `label`
    /// needs to be decompressed.
    pub fn find(&self, label: &str, decompressor: &dyn Decompressor) -> Result<Option<Street>, Error> {
        let key = fold_label(label);
        let candidates = self.labels.partition_point(|l| fold_label(l) <= key);
        if candidates == 0 || candidates > self.blocks_count() {
            return Ok(None);
        }

        let block = self.block(candidates - 1, decompressor)?;
        Ok(block.streets.into_iter().find(|s| fold_label(&s.label) == key))
    }
}

impl StreetBlock {
    /// Decodes a decompressed block: a way reference table followed by newline-terminated labels,
    /// one per street.
    pub fn parse(raw: &[u8]) -> Result<Self, FormatError> {
        let malformed = |_| FormatError::MalformedStreetBlock("truncated way references");

        let mut bytes = Bytes::new(raw);
        let table_size = bytes.u16("street block").map_err(malformed)? as usize;
        let mut table = Bytes::new(bytes.take("street block", table_size).map_err(malformed)?);

        let mut ways = Vec::new();
        while table.remaining() > 0 {
            let length = table.u16("street block").map_err(malformed)?;
            let street = (0..length)
                .map(|_| -> Result<WayId, FormatError> {
                    Ok(WayId {
                        tile_number: table.u16("street block")? as u32,
                        local_way_id: table.u8("street block")? as u32,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(malformed)?;
            ways.push(street);
        }

        let labels = std::str::from_utf8(bytes.take("street block", bytes.remaining())?)
            .map_err(|_| FormatError::InvalidUtf8 {
                section: "street block labels",
            })?;
        let labels = split_lines(labels);

        if labels.len() != ways.len() {
            return Err(FormatError::MalformedStreetBlock(
                "number of labels does not match number of streets",
            ));
        }

        Ok(Self {
            streets: labels
                .into_iter()
                .zip(ways)
                .map(|(label, ways)| Street { label, ways })
                .collect(),
        })
    }

    pub(super) fn encode(streets: &[Street]) -> Vec<u8> {
        let mut table = Vec::new();
        let mut labels = String::new();
        for street in streets {
            table.extend((street.ways.len() as u16).to_le_bytes());
            for way in &street.ways {
                table.extend((way.tile_number as u16).to_le_bytes());
                table.push(way.local_way_id as u8);
            }
            labels.push_str(&street.label);
            labels.push('\n');
        }

        let mut raw = Vec::with_capacity(2 + table.len() + labels.len());
        raw.extend((table.len() as u16).to_le_bytes());
        raw.extend(table);
        raw.extend(labels.as_bytes());
        raw
    }
}

/// Strips accents and other combining marks from a street label,
/// so that "Place de l'Église" is stored and looked up as "Place de l'Eglise".
pub fn fold_label(label: &str) -> String {
    label.nfd().filter(|&c| !is_combining_mark(c)).collect()
}

/// Splits newline-terminated text into lines, dropping the empty line after the last terminator.
fn split_lines(s: &str) -> Vec<String> {
    let s = s.strip_suffix('\n').unwrap_or(s);
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('\n').map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecompressError, Raw};

    fn street(label: &str, ways: &[(u32, u32)]) -> Street {
        Street {
            label: label.to_string(),
            ways: ways
                .iter()
                .map(|&(tile_number, local_way_id)| WayId {
                    tile_number,
                    local_way_id,
                })
                .collect(),
        }
    }

    #[test]
    fn block_round_trip() {
        let streets = vec![
            street("Avenue Alsace-Lorraine", &[(0, 1), (0, 2), (1, 0)]),
            street("Boulevard Gambetta", &[(300, 255)]),
        ];
        let raw = StreetBlock::encode(&streets);
        assert_eq!(StreetBlock::parse(&raw).unwrap().streets, streets);
    }

    #[test]
    fn block_layout() {
        let raw = StreetBlock::encode(&[street("Rue", &[(2, 7)])]);
        assert_eq!(raw, b"\x05\x00\x01\x00\x02\x00\x07Rue\n");
    }

    #[test]
    fn truncated_block() {
        assert_eq!(
            StreetBlock::parse(b"\x05\x00\x01\x00\x02"),
            Err(FormatError::MalformedStreetBlock("truncated way references"))
        );
    }

    #[test]
    fn label_count_mismatch() {
        assert!(StreetBlock::parse(b"\x05\x00\x01\x00\x02\x00\x07A\nB\n").is_err());
    }

    fn catalog_bytes(labels: &str, blocks: &[&[u8]]) -> Vec<u8> {
        let compressed_len: usize = blocks.iter().map(|b| b.len()).sum();
        let total = STREETS_HEADER_SIZE + labels.len() + 4 * (blocks.len() + 1) + compressed_len;
        let mut out = Vec::new();
        out.extend((total as u32).to_le_bytes());
        out.extend((blocks.len() as u16).to_le_bytes());
        out.extend((labels.len() as u16).to_le_bytes());
        out.extend(labels.as_bytes());
        let mut offset = 0u32;
        out.extend(offset.to_le_bytes());
        for b in blocks {
            offset += b.len() as u32;
            out.extend(offset.to_le_bytes());
        }
        for b in blocks {
            out.extend(*b);
        }
        out
    }

    #[test]
    fn catalog_find() {
        let first = StreetBlock::encode(&[street("A", &[(0, 0)]), street("B", &[(0, 1)])]);
        let second = StreetBlock::encode(&[street("C", &[(1, 0)]), street("D", &[(1, 1)])]);
        let data = catalog_bytes("A\nC\n", &[&first, &second]);

        let mut bytes = Bytes::new(&data);
        let catalog = StreetCatalog::parse(&mut bytes).unwrap();
        assert_eq!(bytes.remaining(), 0);
        assert_eq!(catalog.labels(), ["A", "C"]);
        assert_eq!(catalog.blocks_count(), 2);

        let b = catalog.find("B", &Raw).unwrap().unwrap();
        assert_eq!(b, street("B", &[(0, 1)]));
        let d = catalog.find("D", &Raw).unwrap().unwrap();
        assert_eq!(d, street("D", &[(1, 1)]));
        assert!(catalog.find("0", &Raw).unwrap().is_none());
        assert!(catalog.find("BB", &Raw).unwrap().is_none());
    }

    #[test]
    fn catalog_decompress_failure() {
        let block = StreetBlock::encode(&[street("A", &[(0, 0)])]);
        let data = catalog_bytes("A\n", &[&block]);
        let catalog = StreetCatalog::parse(&mut Bytes::new(&data)).unwrap();

        let failing = |_: &[u8]| -> Result<Vec<u8>, DecompressError> {
            Err(DecompressError::Corrupted("bad checksum".to_string()))
        };
        match catalog.block(0, &failing) {
            Err(Error::Decompress(DecompressError::Corrupted(msg))) => {
                assert_eq!(msg, "bad checksum")
            }
            other => panic!("expected a decompression error, got {:?}", other),
        }
        assert!(matches!(
            catalog.find("A", &failing),
            Err(Error::Decompress(DecompressError::Corrupted(_)))
        ));
    }

    #[test]
    fn folded_labels() {
        assert_eq!(fold_label("Place de l'Église"), "Place de l'Eglise");
        assert_eq!(fold_label("Straße"), "Straße");
        assert_eq!(fold_label("Rue Émile Zola"), fold_label("Rue Emile Zola"));
    }

    #[test]
    fn catalog_find_ignores_accents() {
        let block = StreetBlock::encode(&[
            street("Cours Berriat", &[(0, 0)]),
            street("Rue Emile Zola", &[(0, 1)]),
        ]);
        let data = catalog_bytes("Cours Berriat\n", &[&block]);
        let catalog = StreetCatalog::parse(&mut Bytes::new(&data)).unwrap();

        let zola = catalog.find("Rue Émile Zola", &Raw).unwrap().unwrap();
        assert_eq!(zola, street("Rue Emile Zola", &[(0, 1)]));
        assert!(catalog.find("Rue Emile Zola", &Raw).unwrap().is_some());
    }

    #[test]
    fn catalog_block_out_of_bounds() {
        let data = catalog_bytes("", &[]);
        let catalog = StreetCatalog::parse(&mut Bytes::new(&data)).unwrap();
        assert_eq!(catalog.blocks_count(), 0);
        assert!(matches!(
            catalog.block(0, &Raw),
            Err(Error::Index(IndexError::Block { block: 0, blocks: 0 }))
        ));
    }

    #[test]
    fn catalog_size_mismatch() {
        let mut data = catalog_bytes("A\n", &[b"xyz"]);
        data[0] += 1;
        data.push(0);
        assert_eq!(
            StreetCatalog::parse(&mut Bytes::new(&data)).unwrap_err(),
            FormatError::BadBlockOffsets
        );

        let mut data = catalog_bytes("A\n", &[b"xyz"]);
        data[0] = 3;
        data[1] = 0;
        assert!(matches!(
            StreetCatalog::parse(&mut Bytes::new(&data)),
            Err(FormatError::StreetsSizeMismatch { declared: 3, .. })
        ));
    }
}
