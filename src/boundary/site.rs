use serde::{Deserialize, Serialize};

use crate::boundary::{BoundaryComposer, ComposedBoundary};
use crate::error::Result;
use crate::geom::{algebra, Shape};
use crate::store::CatchmentId;

/// An analysis boundary, either composed from catchments or drawn freehand.
///
/// Edits never mutate a boundary; they return the replacement. Two edits
/// applied concurrently to the same boundary each start from the same input,
/// so whichever result the caller stores last wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteBoundary {
    pub geometry: Shape,
    /// Constituent catchments in the order they were added, or `None` for a
    /// drawn or uploaded boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catchment_ids: Option<Vec<CatchmentId>>,
}

impl SiteBoundary {
    /// A boundary that was not built from catchments.
    pub fn drawn(geometry: Shape) -> Self {
        Self { geometry, catchment_ids: None }
    }

    /// Dissolve catchments into a new boundary. Ids unknown to the store are
    /// not recorded.
    pub fn from_catchments(composer: &BoundaryComposer<'_>, ids: &[CatchmentId]) -> Result<Self> {
        let composed = composer.dissolve_catchments(ids)?;
        let mut kept: Vec<CatchmentId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if !kept.contains(&id) && composer.has_catchment(id)? {
                kept.push(id);
            }
        }
        Ok(Self { geometry: composed.geometry, catchment_ids: Some(kept) })
    }

    /// This boundary with one more catchment unioned in.
    pub fn with_catchment(&self, composer: &BoundaryComposer<'_>, id: CatchmentId) -> Result<Self> {
        let composed = composer.union_with_catchment(&self.geometry, id)?;
        let catchment_ids = self.catchment_ids.as_ref().map(|ids| {
            let mut ids = ids.clone();
            if !ids.contains(&id) {
                ids.push(id);
            }
            ids
        });
        Ok(Self { geometry: composed.geometry, catchment_ids })
    }

    /// This boundary with one catchment cut out.
    pub fn without_catchment(&self, composer: &BoundaryComposer<'_>, id: CatchmentId) -> Result<Self> {
        let composed = composer.difference_with_catchment(&self.geometry, id)?;
        let catchment_ids = self.catchment_ids.as_ref()
            .map(|ids| ids.iter().copied().filter(|&other| other != id).collect());
        Ok(Self { geometry: composed.geometry, catchment_ids })
    }

    #[inline] pub fn area_km2(&self) -> f64 { algebra::area_km2(&self.geometry) }

    /// Geometry plus derived area and bounds.
    pub fn composed(&self) -> ComposedBoundary {
        ComposedBoundary::new(self.geometry.clone())
    }
}
