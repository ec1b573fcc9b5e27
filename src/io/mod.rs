//! IO module for format-specific geometry encoding and decoding.
//!
//! # Format Modules
//!
//! - `wkb` - Well-Known Binary Polygon/MultiPolygon
//! - `gpb` - GeoPackage binary blobs (header + envelope + WKB)
//! - `geojson` - GeoJSON geometry objects

pub mod geojson;
pub mod gpb;
pub mod wkb;
