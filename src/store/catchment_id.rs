use std::{fmt, str::FromStr};

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

/// Stable integer key of a catchment, shared by geometry and scenario tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatchmentId(pub i64);

impl CatchmentId {
    /// Read an id from a SQL value stored as INTEGER, integral REAL, or TEXT.
    pub(crate) fn from_sql(value: ValueRef<'_>) -> Option<Self> {
        match value {
            ValueRef::Integer(i) => Some(Self(i)),
            ValueRef::Real(f) if f.is_finite() && f.fract() == 0.0 => Some(Self(f as i64)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CatchmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CatchmentId {
    type Err = std::num::ParseIntError;

    /// Accepts plain integers and the `"1234.0"` form produced by REAL id columns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_suffix(".0").unwrap_or(s).parse().map(Self)
    }
}

impl From<i64> for CatchmentId {
    fn from(id: i64) -> Self { Self(id) }
}
