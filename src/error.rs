// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;

use crate::{DecompressError, NodeId, WayId};

/// Error which can occur when loading a map or reading data out of it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid map file: {0}")]
    Format(#[from] FormatError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("street block: {0}")]
    Decompress(#[from] DecompressError),
}

/// The map file does not follow the expected binary layout.
///
/// A map which failed to load with this error is unusable;
/// nothing is clamped or repaired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("{section}: truncated, need {needed} bytes, got {available}")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("grid has no tiles")]
    EmptyGrid,

    #[error("grid of {width}x{height} tiles has more tiles than can be addressed")]
    GridTooLarge { width: u32, height: u32 },

    #[error("tile {tile}: prefix offset {current} is smaller than previous offset {previous}")]
    NonMonotonicPrefix {
        tile: usize,
        previous: usize,
        current: usize,
    },

    #[error("tile {tile}: way data spans {span} bytes, which is not a multiple of 4")]
    MisalignedPrefix { tile: usize, span: usize },

    #[error("streets section declares {declared} bytes, but its contents take {computed}")]
    StreetsSizeMismatch { declared: usize, computed: usize },

    #[error("street block offsets are not monotonic or exceed the compressed region")]
    BadBlockOffsets,

    #[error("{section}: invalid UTF-8")]
    InvalidUtf8 { section: &'static str },

    #[error("{0} unexpected bytes after the streets section")]
    TrailingBytes(usize),

    #[error("malformed street block: {0}")]
    MalformedStreetBlock(&'static str),
}

/// An id refers outside of the map tables.
///
/// This signals a bug in the caller or inconsistent catalog data,
/// not a routine condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("tile {tile} out of bounds (map has {tiles} tiles)")]
    Tile { tile: u32, tiles: usize },

    #[error("way {way:?} out of bounds (tile has {ways} ways)")]
    Way { way: WayId, ways: usize },

    #[error("node {node:?} out of bounds (tile has {nodes} nodes)")]
    Node { node: NodeId, nodes: usize },

    #[error("street block {block} out of bounds (catalog has {blocks} blocks)")]
    Block { block: usize, blocks: usize },
}
