//! GeoPackage binary geometry blobs.
//!
//! Layout: `"GP"` magic, version byte, flags byte, 4-byte SRS id, an optional
//! envelope of doubles, then a standard WKB geometry.
//!
//! Flags bit 0 is the byte order of the header (1 = little endian), bits 1-3
//! the envelope code and bit 4 the empty-geometry marker. The WKB part carries
//! its own byte-order marker.

use crate::error::CodecError;
use crate::geom::{BoundingBox, Shape};
use crate::io::wkb::{read_shape, write_shape, ByteOrder, ByteReader, ByteWriter};

/// Magic bytes at the start of every blob.
const MAGIC: [u8; 2] = *b"GP";
/// Version written by [`write`].
const VERSION: u8 = 0;

const FLAG_LITTLE_ENDIAN: u8 = 0b0000_0001;
const FLAG_EMPTY: u8 = 0b0001_0000;
const ENVELOPE_SHIFT: u8 = 1;
const ENVELOPE_MASK: u8 = 0b0000_0111;

/// Envelope length in bytes for the 3-bit envelope code in `flags`.
///
/// | code | contents           | bytes |
/// |------|--------------------|-------|
/// | 0    | none               | 0     |
/// | 1    | x, y               | 32    |
/// | 2, 3 | x, y + z or m      | 48    |
/// | 4    | x, y, z, m         | 64    |
pub fn envelope_len(flags: u8) -> Result<usize, CodecError> {
    match (flags >> ENVELOPE_SHIFT) & ENVELOPE_MASK {
        0 => Ok(0),
        1 => Ok(32),
        2 | 3 => Ok(48),
        4 => Ok(64),
        code => Err(CodecError::MalformedHeader(format!("invalid envelope code {code}"))),
    }
}

/// Decoded fixed header and envelope of a blob.
#[derive(Debug, Clone, PartialEq)]
pub struct GpbHeader {
    pub version: u8,
    pub flags: u8,
    pub byte_order: ByteOrder,
    pub srs_id: i32,
    /// The x/y part of the envelope, if one was stored.
    pub envelope: Option<BoundingBox>,
    pub is_empty: bool,
}

fn read_header(reader: &mut ByteReader) -> Result<GpbHeader, CodecError> {
    // The fixed part must be complete before any of it is interpreted.
    let mut fixed = ByteReader::new(reader.take(8)?);
    let magic = fixed.take(2)?;
    if magic != MAGIC.as_slice() {
        return Err(CodecError::MalformedHeader(format!("bad magic {magic:02x?}")));
    }
    let version = fixed.u8()?;
    let flags = fixed.u8()?;
    let byte_order = if flags & FLAG_LITTLE_ENDIAN != 0 { ByteOrder::Little } else { ByteOrder::Big };
    let srs_id = fixed.i32(byte_order)?;

    let env_len = envelope_len(flags)?;
    let envelope = if env_len == 0 {
        None
    } else {
        // Envelope order is minx, maxx, miny, maxy, then optional z/m pairs.
        let min_x = reader.f64(byte_order)?;
        let max_x = reader.f64(byte_order)?;
        let min_y = reader.f64(byte_order)?;
        let max_y = reader.f64(byte_order)?;
        reader.take(env_len - 32)?;
        Some(BoundingBox { min_x, min_y, max_x, max_y })
    };

    Ok(GpbHeader { version, flags, byte_order, srs_id, envelope, is_empty: flags & FLAG_EMPTY != 0 })
}

/// Decode a blob into its header and canonical shape.
pub fn read(bytes: &[u8]) -> Result<(GpbHeader, Shape), CodecError> {
    let mut reader = ByteReader::new(bytes);
    let header = read_header(&mut reader)?;
    let shape = read_shape(&mut reader)?;
    if reader.remaining() > 0 {
        log::debug!("[io::gpb] {} trailing bytes after geometry at offset {}", reader.remaining(), reader.position());
    }
    Ok((header, shape))
}

/// Decode a blob into its canonical shape.
pub fn decode(bytes: &[u8]) -> Result<Shape, CodecError> {
    read(bytes).map(|(_, shape)| shape)
}

/// Encode a shape as a little-endian blob with an x/y envelope (code 1), or
/// with no envelope and the empty flag set if the shape is empty.
pub fn write(shape: &Shape, srs_id: i32) -> Vec<u8> {
    let bounds = shape.bounds();
    let flags = FLAG_LITTLE_ENDIAN | match bounds {
        Some(_) => 1 << ENVELOPE_SHIFT,
        None => FLAG_EMPTY,
    };

    let mut writer = ByteWriter::new(ByteOrder::Little);
    writer.bytes(&MAGIC);
    writer.u8(VERSION);
    writer.u8(flags);
    writer.i32(srs_id);
    if let Some(bbox) = bounds {
        writer.f64(bbox.min_x);
        writer.f64(bbox.max_x);
        writer.f64(bbox.min_y);
        writer.f64(bbox.max_y);
    }
    write_shape(&mut writer, shape);
    writer.finish()
}
