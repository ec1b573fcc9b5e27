#![doc = "Catchmap: geospatial data engine for catchment scenario comparison"]
pub mod boundary;
pub mod error;
pub mod geom;
pub mod io;
pub mod store;

#[doc(inline)]
pub use error::{CodecError, Error, Result};

#[doc(inline)]
pub use geom::{BoundingBox, Shape};

#[doc(inline)]
pub use store::{CatchmentId, CatchmentStore, StoreConfig, MAX_FEATURES};

#[doc(inline)]
pub use boundary::{BoundaryComposer, ComposedBoundary, SiteBoundary};
