use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::{algebra, BoundingBox, Shape};
use crate::store::{CatchmentId, CatchmentStore};

/// A composed boundary with its derived measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedBoundary {
    pub geometry: Shape,
    pub bounding_box: Option<BoundingBox>,
    pub area_km2: f64,
}

impl ComposedBoundary {
    pub(crate) fn new(geometry: Shape) -> Self {
        Self {
            bounding_box: geometry.bounds(),
            area_km2: algebra::area_km2(&geometry),
            geometry,
        }
    }
}

/// Area and per-scenario attribute values of one catchment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchmentIndicators {
    pub id: CatchmentId,
    pub area_km2: f64,
    pub scenarios: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Builds and edits analysis boundaries out of stored catchments.
///
/// Holds no state of its own: every edit takes the previous boundary as
/// input and returns a new one, so callers own persistence.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryComposer<'s> {
    store: &'s CatchmentStore,
}

impl<'s> BoundaryComposer<'s> {
    pub fn new(store: &'s CatchmentStore) -> Self {
        Self { store }
    }

    /// True if the store holds a geometry for `id`.
    pub fn has_catchment(&self, id: CatchmentId) -> Result<bool> {
        Ok(self.store.read()?.catchment(id).is_some())
    }

    /// Dissolve the given catchments into one boundary. Unknown ids and
    /// undecodable geometries are logged and left out; any other failure is
    /// returned.
    pub fn dissolve_catchments(&self, ids: &[CatchmentId]) -> Result<ComposedBoundary> {
        let mut shapes: Vec<Shape> = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.store.catchment_shape(id) {
                Ok(shape) => shapes.push(shape),
                Err(e @ (Error::CatchmentNotFound(_) | Error::Codec(_))) => {
                    log::warn!("[boundary] Skipping catchment {id}: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        if shapes.is_empty() {
            return Err(Error::NoValidGeometry);
        }
        log::debug!("[boundary] Dissolving {} of {} catchments", shapes.len(), ids.len());
        Ok(ComposedBoundary::new(algebra::dissolve(&shapes)))
    }

    /// Add one catchment to a boundary.
    pub fn union_with_catchment(&self, boundary: &Shape, id: CatchmentId) -> Result<ComposedBoundary> {
        let other = self.store.catchment_shape(id)?;
        Ok(ComposedBoundary::new(algebra::union(boundary, &other)))
    }

    /// Remove one catchment from a boundary.
    pub fn difference_with_catchment(&self, boundary: &Shape, id: CatchmentId) -> Result<ComposedBoundary> {
        let other = self.store.catchment_shape(id)?;
        Ok(ComposedBoundary::new(algebra::difference(boundary, &other)))
    }

    /// Area and attribute values for each known catchment, in input order.
    pub fn aggregate_indicators(&self, ids: &[CatchmentId]) -> Result<Vec<CatchmentIndicators>> {
        let mut indicators = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(area_km2) = self.catchment_area(id)? else {
                log::warn!("[boundary] No geometry for catchment {id}; skipping indicators");
                continue;
            };
            let scenarios = self.store.catchment_attributes(id)?;
            indicators.push(CatchmentIndicators { id, area_km2, scenarios });
        }
        Ok(indicators)
    }

    /// Stored area when the datapack has one, otherwise the geometry's area.
    fn catchment_area(&self, id: CatchmentId) -> Result<Option<f64>> {
        let stored = {
            let data = self.store.read()?;
            match data.catchment(id) {
                Some(catchment) => catchment.area_km2,
                None => return Ok(None),
            }
        };
        match stored {
            Some(area) => Ok(Some(area)),
            None => match self.store.catchment_shape(id) {
                Ok(shape) => Ok(Some(algebra::area_km2(&shape))),
                Err(Error::Codec(e)) => {
                    log::warn!("[boundary] Catchment {id}: {e}");
                    Ok(None)
                }
                Err(e) => Err(e),
            },
        }
    }
}
