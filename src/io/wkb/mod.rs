//! Well-Known Binary encoding of Polygon and MultiPolygon shapes.

mod read;
mod write;

pub(crate) use read::{read_shape, ByteReader};
pub use read::read_wkb;
pub(crate) use write::{write_shape, ByteWriter};
pub use write::write_wkb;

/// WKB geometry type for Polygon
pub(crate) const WKB_POLYGON: u32 = 3;
/// WKB geometry type for MultiPolygon
pub(crate) const WKB_MULTIPOLYGON: u32 = 6;

/// Byte order of multi-byte numbers in an encoded geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// Interpret a WKB byte-order marker (0 = big endian, 1 = little endian).
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0 => Some(ByteOrder::Big),
            1 => Some(ByteOrder::Little),
            _ => None,
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            ByteOrder::Big => 0,
            ByteOrder::Little => 1,
        }
    }
}
