//! WKB writing operations.

use geo::{LineString, Polygon};

use crate::geom::Shape;
use super::{ByteOrder, WKB_MULTIPOLYGON, WKB_POLYGON};

/// Append-only byte sink that writes numbers in a fixed byte order.
pub(crate) struct ByteWriter {
    out: Vec<u8>,
    order: ByteOrder,
}

impl ByteWriter {
    pub(crate) fn new(order: ByteOrder) -> Self {
        Self { out: Vec::new(), order }
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.out.push(value);
    }

    pub(crate) fn u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::Little => self.out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub(crate) fn i32(&mut self, value: i32) {
        match self.order {
            ByteOrder::Little => self.out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => self.out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub(crate) fn f64(&mut self, value: f64) {
        let bits = value.to_bits();
        match self.order {
            ByteOrder::Little => self.out.extend_from_slice(&bits.to_le_bytes()),
            ByteOrder::Big => self.out.extend_from_slice(&bits.to_be_bytes()),
        }
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub(crate) fn finish(self) -> Vec<u8> { self.out }
}

fn write_ring(writer: &mut ByteWriter, ring: &LineString<f64>) {
    writer.u32(ring.0.len() as u32);
    for coord in ring.coords() {
        writer.f64(coord.x);
        writer.f64(coord.y);
    }
}

fn write_polygon(writer: &mut ByteWriter, poly: &Polygon<f64>) {
    writer.u8(writer.order.marker());
    writer.u32(WKB_POLYGON);

    if poly.exterior().0.is_empty() {
        writer.u32(0);
        return;
    }

    // Number of rings (1 exterior + interiors)
    writer.u32((1 + poly.interiors().len()) as u32);
    write_ring(writer, poly.exterior());
    for interior in poly.interiors() {
        write_ring(writer, interior);
    }
}

/// Append a WKB encoding of `shape` to the writer.
pub(crate) fn write_shape(writer: &mut ByteWriter, shape: &Shape) {
    match shape {
        Shape::Polygon(poly) => write_polygon(writer, poly),
        Shape::MultiPolygon(mp) => {
            writer.u8(writer.order.marker());
            writer.u32(WKB_MULTIPOLYGON);
            writer.u32(mp.0.len() as u32);
            for poly in &mp.0 {
                write_polygon(writer, poly);
            }
        }
    }
}

/// Encode a shape as standalone WKB in the given byte order.
pub fn write_wkb(shape: &Shape, order: ByteOrder) -> Vec<u8> {
    let mut writer = ByteWriter::new(order);
    write_shape(&mut writer, shape);
    writer.finish()
}
