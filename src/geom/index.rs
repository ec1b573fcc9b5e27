use rstar::RTree;

use crate::geom::{BoundingBox, IndexedBox};

/// R-tree over the bounding boxes of stored geometries, addressed by row index.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpatialIndex {
    rtree: RTree<IndexedBox>,
}

impl SpatialIndex {
    /// Bulk-load the index from `(row index, bbox)` pairs.
    pub(crate) fn new(boxes: impl IntoIterator<Item = (usize, BoundingBox)>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                boxes.into_iter()
                    .map(|(idx, bbox)| IndexedBox::new(idx, bbox))
                    .collect()
            ),
        }
    }

    /// Number of indexed boxes.
    #[inline] pub(crate) fn len(&self) -> usize { self.rtree.size() }

    /// Row indices whose box overlaps `bbox` on both axes, in ascending order.
    pub(crate) fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .filter(|entry| entry.bbox().intersects(bbox))
            .map(|entry| entry.idx())
            .collect();
        hits.sort_unstable();
        hits
    }
}
