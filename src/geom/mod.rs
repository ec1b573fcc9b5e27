pub mod algebra;
mod bbox;
mod index;
mod shape;

pub use bbox::BoundingBox;
pub(crate) use bbox::IndexedBox;
pub(crate) use index::SpatialIndex;
pub use shape::Shape;
