use thiserror::Error;

use crate::store::CatchmentId;

/// Failures while decoding a single geometry value.
///
/// These are always local to the one value being decoded; bulk readers log
/// them and move on to the next row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The GeoPackage binary header is missing its magic or carries an
    /// invalid envelope code.
    #[error("malformed geometry header: {0}")]
    MalformedHeader(String),

    /// The WKB type code is not Polygon (3) or MultiPolygon (6).
    #[error("unsupported geometry type code {0}")]
    UnsupportedGeometryType(u32),

    /// A read would run past the end of the buffer.
    #[error("truncated geometry data: needed {needed} bytes at offset {offset}, buffer has {len}")]
    TruncatedData { offset: usize, needed: usize, len: usize },

    /// The WKB byte-order marker is neither 0 (big) nor 1 (little endian).
    #[error("invalid WKB byte order marker {0:#04x}")]
    InvalidByteOrder(u8),

    /// A GeoJSON geometry object could not be interpreted as a polygon shape.
    #[error("invalid GeoJSON geometry: {0}")]
    InvalidGeoJson(String),
}

/// Engine-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The attribute name is not one of the known data columns.
    #[error("invalid attribute: {0:?}")]
    InvalidAttribute(String),

    /// The attribute has no precomputed domain range.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// The attribute has no present values in the scenario.
    #[error("no data for attribute {attribute} in scenario {scenario}")]
    NoData { scenario: String, attribute: String },

    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// None of the requested catchments produced a usable geometry.
    #[error("no valid geometries found")]
    NoValidGeometry,

    #[error("catchment not found: {0}")]
    CatchmentNotFound(CatchmentId),

    #[error("invalid store configuration: {0}")]
    Config(String),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
