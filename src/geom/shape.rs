use geo::{BoundingRect, MultiPolygon, Polygon};

use crate::geom::BoundingBox;

/// Canonical in-memory geometry: a polygon or a multi-polygon in lon/lat degrees.
///
/// A polygon's first ring is its exterior, the remaining rings are holes. Ring
/// winding is not assumed anywhere in this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Shape {
    /// The empty geometry (a multi-polygon with no parts).
    pub fn empty() -> Self {
        Shape::MultiPolygon(MultiPolygon::new(Vec::new()))
    }

    /// Collapse a multi-polygon into the simplest shape that represents it.
    pub fn from_multi(mut mp: MultiPolygon<f64>) -> Self {
        if mp.0.len() == 1 {
            Shape::Polygon(mp.0.remove(0))
        } else {
            Shape::MultiPolygon(mp)
        }
    }

    /// The polygon parts of this shape.
    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            Shape::Polygon(p) => std::slice::from_ref(p),
            Shape::MultiPolygon(mp) => &mp.0,
        }
    }

    /// True if no part has a non-empty exterior ring.
    pub fn is_empty(&self) -> bool {
        self.polygons().iter().all(|p| p.exterior().0.is_empty())
    }

    /// Total number of rings (exteriors and holes) across all parts.
    pub fn ring_count(&self) -> usize {
        self.polygons().iter()
            .filter(|p| !p.exterior().0.is_empty())
            .map(|p| 1 + p.interiors().len())
            .sum()
    }

    /// Bounding box of every coordinate, or `None` for an empty shape.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Shape::Polygon(p) => p.bounding_rect().map(BoundingBox::from),
            Shape::MultiPolygon(mp) => mp.bounding_rect().map(BoundingBox::from),
        }
    }
}

impl From<Polygon<f64>> for Shape {
    fn from(p: Polygon<f64>) -> Self { Shape::Polygon(p) }
}

impl From<MultiPolygon<f64>> for Shape {
    fn from(mp: MultiPolygon<f64>) -> Self { Shape::MultiPolygon(mp) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn empty_shape_has_no_rings_or_bounds() {
        let empty = Shape::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.ring_count(), 0);
        assert_eq!(empty.bounds(), None);
    }

    #[test]
    fn from_multi_unwraps_single_part() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let shape = Shape::from_multi(MultiPolygon::new(vec![square.clone()]));
        assert_eq!(shape, Shape::Polygon(square));
    }

    #[test]
    fn bounds_span_all_parts() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let b = polygon![(x: 5.0, y: -2.0), (x: 6.0, y: -2.0), (x: 6.0, y: 3.0)];
        let shape = Shape::MultiPolygon(MultiPolygon::new(vec![a, b]));

        assert_eq!(shape.bounds(), Some(BoundingBox::new(0.0, -2.0, 6.0, 3.0)));
        assert_eq!(shape.ring_count(), 2);
    }
}
