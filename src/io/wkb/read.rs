//! WKB reading operations.

use geo::{Coord, LineString, MultiPolygon, Polygon};

use crate::error::CodecError;
use crate::geom::Shape;
use super::{ByteOrder, WKB_MULTIPOLYGON, WKB_POLYGON};

/// Bounds-checked cursor over a byte slice.
///
/// Every read goes through [`ByteReader::take`], so running off the end of
/// the buffer is always reported as [`CodecError::TruncatedData`].
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset into the buffer.
    #[inline] pub(crate) fn position(&self) -> usize { self.pos }

    /// Bytes left after the cursor.
    #[inline] pub(crate) fn remaining(&self) -> usize { self.buf.len() - self.pos }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(CodecError::TruncatedData { offset: self.pos, needed: n, len: self.buf.len() })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self, order: ByteOrder) -> Result<u32, CodecError> {
        let bytes = self.array::<4>()?;
        Ok(match order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    pub(crate) fn i32(&mut self, order: ByteOrder) -> Result<i32, CodecError> {
        let bytes = self.array::<4>()?;
        Ok(match order {
            ByteOrder::Little => i32::from_le_bytes(bytes),
            ByteOrder::Big => i32::from_be_bytes(bytes),
        })
    }

    /// Read an IEEE-754 double by assembling its bit pattern in the given order.
    pub(crate) fn f64(&mut self, order: ByteOrder) -> Result<f64, CodecError> {
        let bytes = self.array::<8>()?;
        let bits = match order {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        };
        Ok(f64::from_bits(bits))
    }

    /// Read a WKB byte-order marker.
    fn byte_order(&mut self) -> Result<ByteOrder, CodecError> {
        let marker = self.u8()?;
        ByteOrder::from_marker(marker).ok_or(CodecError::InvalidByteOrder(marker))
    }

    /// Capacity to reserve for `count` items of at least `item_len` bytes each,
    /// clamped to what the rest of the buffer could possibly hold.
    fn capacity_hint(&self, count: u32, item_len: usize) -> usize {
        (count as usize).min(self.remaining() / item_len)
    }
}

fn read_ring(reader: &mut ByteReader, order: ByteOrder) -> Result<LineString<f64>, CodecError> {
    let num_points = reader.u32(order)?;
    let mut coords = Vec::with_capacity(reader.capacity_hint(num_points, 16));
    for _ in 0..num_points {
        let x = reader.f64(order)?;
        let y = reader.f64(order)?;
        coords.push(Coord { x, y });
    }
    Ok(LineString::from(coords))
}

/// Read the ring list of a polygon (everything after its type code).
fn read_polygon_body(reader: &mut ByteReader, order: ByteOrder) -> Result<Polygon<f64>, CodecError> {
    let num_rings = reader.u32(order)?;
    if num_rings == 0 {
        return Ok(Polygon::new(LineString::new(Vec::new()), Vec::new()));
    }

    let exterior = read_ring(reader, order)?;
    let mut interiors = Vec::with_capacity(reader.capacity_hint(num_rings - 1, 4));
    for _ in 1..num_rings {
        interiors.push(read_ring(reader, order)?);
    }
    Ok(Polygon::new(exterior, interiors))
}

/// Read one WKB geometry starting at the reader's cursor.
pub(crate) fn read_shape(reader: &mut ByteReader) -> Result<Shape, CodecError> {
    let order = reader.byte_order()?;
    match reader.u32(order)? {
        WKB_POLYGON => Ok(Shape::Polygon(read_polygon_body(reader, order)?)),
        WKB_MULTIPOLYGON => {
            let num_polygons = reader.u32(order)?;
            let mut parts = Vec::with_capacity(reader.capacity_hint(num_polygons, 9));
            for _ in 0..num_polygons {
                // Each part carries its own byte order and type code.
                let part_order = reader.byte_order()?;
                match reader.u32(part_order)? {
                    WKB_POLYGON => parts.push(read_polygon_body(reader, part_order)?),
                    other => return Err(CodecError::UnsupportedGeometryType(other)),
                }
            }
            Ok(Shape::MultiPolygon(MultiPolygon::new(parts)))
        }
        other => Err(CodecError::UnsupportedGeometryType(other)),
    }
}

/// Decode a standalone WKB Polygon or MultiPolygon.
pub fn read_wkb(bytes: &[u8]) -> Result<Shape, CodecError> {
    read_shape(&mut ByteReader::new(bytes))
}
