// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Pluggable (de)compression of street catalog blocks.
//!
//! The map file treats every street block as opaque bytes, and the algorithm used to
//! compress them depends on the tool which produced the map. Callers inject the matching
//! [Decompressor] when reading blocks; any `Fn(&[u8]) -> Result<Vec<u8>, DecompressError>`
//! works, which allows plugging in algorithms not bundled with this crate (e.g. heatshrink).

use std::io::{self, Read, Write};

/// Error returned by a [Decompressor] when the data can't be restored.
#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("corrupted data: {0}")]
    Corrupted(String),
}

/// Capability of restoring a single compressed street block.
pub trait Decompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError>;
}

/// Capability of compressing a single street block, used by [MapWriter](crate::MapWriter).
pub trait Compressor {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>>;
}

impl<F> Decompressor for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, DecompressError>,
{
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        self(bytes)
    }
}

/// Blocks stored without any compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Decompressor for Raw {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        Ok(bytes.to_vec())
    }
}

impl Compressor for Raw {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// Blocks compressed with [zlib](https://en.wikipedia.org/wiki/Zlib).
#[derive(Debug, Clone, Copy, Default)]
pub struct Zlib;

impl Decompressor for Zlib {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(2 * bytes.len());
        flate2::read::ZlibDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(decoder_error)?;
        Ok(out)
    }
}

impl Compressor for Zlib {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut e = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
        e.write_all(bytes)?;
        e.finish()
    }
}

/// Blocks compressed with [bzip2](https://en.wikipedia.org/wiki/Bzip2).
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2;

impl Decompressor for Bzip2 {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(2 * bytes.len());
        bzip2::read::BzDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(decoder_error)?;
        Ok(out)
    }
}

impl Compressor for Bzip2 {
    fn compress(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut e = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
        e.write_all(bytes)?;
        e.finish()
    }
}

/// Decoders report malformed input as io errors of these kinds.
fn decoder_error(e: io::Error) -> DecompressError {
    match e.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            DecompressError::Corrupted(e.to_string())
        }
        _ => DecompressError::Io(e),
    }
}
