//! Analysis boundaries composed from catchments.

mod composer;
mod site;

pub use composer::{BoundaryComposer, CatchmentIndicators, ComposedBoundary};
pub use site::SiteBoundary;
