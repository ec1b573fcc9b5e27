use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in longitude/latitude degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Build a box from two corners, swapping coordinates so that min <= max on both axes.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// True iff the boxes overlap on both axes (touching edges count).
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x && self.max_x >= other.min_x
            && self.min_y <= other.max_y && self.max_y >= other.min_y
    }

    #[inline]
    pub(crate) fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self { min_x: rect.min().x, min_y: rect.min().y, max_x: rect.max().x, max_y: rect.max().y }
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        Rect::new(Coord { x: bbox.min_x, y: bbox.min_y }, Coord { x: bbox.max_x, y: bbox.max_y })
    }
}

/// A bounding box in an R-tree, associated with a stored geometry by index.
#[derive(Debug, Clone)]
pub(crate) struct IndexedBox {
    idx: usize, // Index of the corresponding row in the catchment table
    bbox: BoundingBox,
}

impl IndexedBox {
    pub(crate) fn new(idx: usize, bbox: BoundingBox) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding geometry.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }

    /// Get a reference to the bounding box.
    #[inline] pub(crate) fn bbox(&self) -> &BoundingBox { &self.bbox }
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox.envelope()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_swapped_corners() {
        let bbox = BoundingBox::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(bbox, BoundingBox { min_x: -10.0, min_y: -5.0, max_x: 10.0, max_y: 5.0 });
    }

    #[test]
    fn overlap_requires_both_axes() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);

        assert!(a.intersects(&BoundingBox::new(0.5, 0.5, 2.0, 2.0)));
        assert!(a.intersects(&BoundingBox::new(1.0, 1.0, 2.0, 2.0))); // corner touch
        assert!(!a.intersects(&BoundingBox::new(0.5, 1.5, 2.0, 2.0))); // x overlaps, y does not
        assert!(!a.intersects(&BoundingBox::new(1.5, 0.5, 2.0, 0.8))); // y overlaps, x does not
    }

    #[test]
    fn rect_conversion_preserves_corners() {
        let bbox = BoundingBox::new(-3.0, 2.0, 4.0, 7.5);
        let rect: Rect<f64> = bbox.into();
        assert_eq!(BoundingBox::from(rect), bbox);
    }
}
