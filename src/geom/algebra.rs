//! Polygon boolean algebra over canonical shapes.
//!
//! Clipping is delegated to `geo`'s `BooleanOps`. Everything here is a pure
//! function of its inputs; degenerate operands (rings with fewer than four
//! points) are dropped before clipping, and an operand that ends up empty
//! yields an empty result rather than an error.

use geo::{BooleanOps, LineString, MultiPolygon, Polygon};

use crate::geom::Shape;

/// Kilometres per degree at the equator, used to convert squared degrees to km².
pub const KM_PER_DEGREE: f64 = 111.0;

/// Minimum number of coordinates in a closed ring (three distinct vertices).
const MIN_RING_LEN: usize = 4;

#[inline]
fn is_valid_ring(ring: &LineString<f64>) -> bool {
    ring.0.len() >= MIN_RING_LEN
}

/// Drop parts with a degenerate exterior and holes that are degenerate.
fn valid_parts(shape: &Shape) -> MultiPolygon<f64> {
    MultiPolygon::new(
        shape.polygons().iter()
            .filter(|p| is_valid_ring(p.exterior()))
            .map(|p| Polygon::new(
                p.exterior().clone(),
                p.interiors().iter().filter(|r| is_valid_ring(r)).cloned().collect(),
            ))
            .collect()
    )
}

/// Resolve an operand to a single region: a multi-polygon is the union of its parts.
fn region(shape: &Shape) -> MultiPolygon<f64> {
    let parts = valid_parts(shape);
    if parts.0.len() <= 1 { return parts }

    parts.0.into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .reduce(|acc, p| acc.union(&p))
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Geometric union of two shapes.
pub fn union(a: &Shape, b: &Shape) -> Shape {
    if ring_set_eq(a, b) { return a.clone() }

    let (a, b) = (region(a), region(b));
    match (a.0.is_empty(), b.0.is_empty()) {
        (true, true) => Shape::empty(),
        (false, true) => Shape::from_multi(a),
        (true, false) => Shape::from_multi(b),
        (false, false) => Shape::from_multi(a.union(&b)),
    }
}

/// Geometric difference `a - b`.
pub fn difference(a: &Shape, b: &Shape) -> Shape {
    let a_region = region(a);
    if a_region.0.is_empty() || ring_set_eq(a, b) { return Shape::empty() }

    let b_region = region(b);
    if b_region.0.is_empty() { return Shape::from_multi(a_region) }

    Shape::from_multi(a_region.difference(&b_region))
}

/// Left-fold union over a list of shapes.
///
/// A single input is returned unchanged (bit-for-bit), and an empty list
/// dissolves to the empty shape.
pub fn dissolve(shapes: &[Shape]) -> Shape {
    match shapes {
        [] => Shape::empty(),
        [only] => only.clone(),
        [first, rest @ ..] => {
            let merged = rest.iter().fold(region(first), |acc, shape| {
                let next = region(shape);
                match (acc.0.is_empty(), next.0.is_empty()) {
                    (_, true) => acc,
                    (true, false) => next,
                    (false, false) => acc.union(&next),
                }
            });
            if merged.0.is_empty() { Shape::empty() } else { Shape::from_multi(merged) }
        }
    }
}

/// Signed shoelace area of a ring, in squared degrees.
fn ring_signed_area(ring: &LineString<f64>) -> f64 {
    let coords = &ring.0;
    let n = coords.len();
    if n < 3 { return 0.0 }

    let mut twice = 0.0;
    for j in 0..n {
        let k = (j + 1) % n;
        twice += coords[j].x * coords[k].y - coords[k].x * coords[j].y;
    }
    twice / 2.0
}

/// Planar area in squared degrees: each exterior counts positively and each
/// hole is subtracted, independent of the winding of either.
pub fn area(shape: &Shape) -> f64 {
    shape.polygons().iter()
        .map(|p| {
            let holes: f64 = p.interiors().iter().map(|r| ring_signed_area(r).abs()).sum();
            ring_signed_area(p.exterior()).abs() - holes
        })
        .sum::<f64>()
        .abs()
}

/// Approximate area in km², using a fixed equatorial scale.
#[inline]
pub fn area_km2(shape: &Shape) -> f64 {
    area(shape) * KM_PER_DEGREE * KM_PER_DEGREE
}

type RingKey = Vec<[u64; 2]>;

/// Canonical key for a ring: closing point dropped, rotated to start at the
/// smallest vertex, and read in whichever direction compares smaller.
fn ring_key(ring: &LineString<f64>) -> RingKey {
    // `+ 0.0` folds -0.0 into 0.0 before taking bits.
    let mut pts: Vec<[u64; 2]> = ring.0.iter()
        .map(|c| [(c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()])
        .collect();
    if pts.len() > 1 && pts.first() == pts.last() { pts.pop(); }
    if pts.is_empty() { return pts }

    let start = pts.iter().enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let n = pts.len();
    let forward: RingKey = (0..n).map(|i| pts[(start + i) % n]).collect();
    let backward: RingKey = (0..n).map(|i| pts[(start + n - i) % n]).collect();
    forward.min(backward)
}

fn shape_key(shape: &Shape) -> Vec<(RingKey, Vec<RingKey>)> {
    let mut parts: Vec<_> = shape.polygons().iter()
        .filter(|p| !p.exterior().0.is_empty())
        .map(|p| {
            let mut holes: Vec<RingKey> = p.interiors().iter().map(ring_key).collect();
            holes.sort();
            (ring_key(p.exterior()), holes)
        })
        .collect();
    parts.sort();
    parts
}

/// Equality that ignores part order, hole order, ring start vertex and ring winding.
pub fn ring_set_eq(a: &Shape, b: &Shape) -> bool {
    shape_key(a) == shape_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    const EPS: f64 = 1e-9;

    fn square(x0: f64, y0: f64, size: f64) -> Shape {
        Shape::Polygon(polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ])
    }

    fn square_with_hole() -> Shape {
        Shape::Polygon(polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 1.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 1.0)]],
        ))
    }

    #[test]
    fn area_ignores_winding() {
        let ccw = square(0.0, 0.0, 2.0);
        let cw = Shape::Polygon(polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0)]);

        assert!((area(&ccw) - 4.0).abs() < EPS);
        assert!((area(&cw) - 4.0).abs() < EPS);
    }

    #[test]
    fn area_subtracts_holes() {
        let shape = square_with_hole();
        assert!((area(&shape) - 15.0).abs() < EPS);
        assert!(area(&shape) < area(&square(0.0, 0.0, 4.0)));
    }

    #[test]
    fn area_km2_uses_equatorial_scale() {
        let shape = square(0.0, 0.0, 1.0);
        assert!((area_km2(&shape) - 111.0 * 111.0).abs() < 1e-6);
    }

    #[test]
    fn area_of_empty_is_zero() {
        assert_eq!(area(&Shape::empty()), 0.0);
    }

    #[test]
    fn union_with_self_is_identity() {
        let a = square_with_hole();
        assert!(ring_set_eq(&union(&a, &a), &a));
    }

    #[test]
    fn union_with_reordered_copy_is_identity() {
        let a = square(0.0, 0.0, 1.0);
        // Same ring, other winding, different start vertex.
        let b = Shape::Polygon(polygon![(x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 0.0), (x: 0.0, y: 1.0)]);

        assert!(ring_set_eq(&a, &b));
        assert_eq!(union(&a, &b), a);
    }

    #[test]
    fn union_of_disjoint_squares_keeps_both_parts() {
        let merged = union(&square(0.0, 0.0, 1.0), &square(5.0, 5.0, 1.0));

        assert_eq!(merged.polygons().len(), 2);
        assert!((area(&merged) - 2.0).abs() < EPS);
    }

    #[test]
    fn union_of_adjacent_squares_is_single_polygon() {
        let merged = union(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0));

        assert_eq!(merged.polygons().len(), 1);
        assert!((area(&merged) - 2.0).abs() < EPS);
    }

    #[test]
    fn union_merges_overlapping_parts_of_multipolygon() {
        let overlapping = Shape::MultiPolygon(MultiPolygon::new(vec![
            square(0.0, 0.0, 2.0).polygons()[0].clone(),
            square(1.0, 1.0, 2.0).polygons()[0].clone(),
        ]));
        let merged = union(&overlapping, &square(10.0, 10.0, 1.0));

        // 4 + 4 - 1 overlap, plus the disjoint unit square
        assert!((area(&merged) - 8.0).abs() < EPS);
    }

    #[test]
    fn difference_cuts_a_hole() {
        let result = difference(&square(0.0, 0.0, 4.0), &square(1.0, 1.0, 1.0));

        assert_eq!(result.polygons().len(), 1);
        assert_eq!(result.ring_count(), 2);
        assert!((area(&result) - 15.0).abs() < EPS);
    }

    #[test]
    fn difference_with_disjoint_keeps_area() {
        let a = square(0.0, 0.0, 2.0);
        let result = difference(&a, &square(10.0, 10.0, 1.0));
        assert!((area(&result) - 4.0).abs() < EPS);
    }

    #[test]
    fn difference_with_self_is_empty() {
        let a = square_with_hole();
        assert!(difference(&a, &a).is_empty());
    }

    #[test]
    fn degenerate_operands_resolve_to_empty_or_other() {
        let sliver = Shape::Polygon(Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]), vec![]));
        let b = square(0.0, 0.0, 1.0);

        assert!(ring_set_eq(&union(&sliver, &b), &b));
        assert!(difference(&sliver, &b).is_empty());
        assert!(union(&Shape::empty(), &Shape::empty()).is_empty());
    }

    #[test]
    fn dissolve_single_is_exact() {
        // Clockwise, starting mid-edge: must come back untouched.
        let a = Shape::Polygon(polygon![(x: 0.5, y: 0.0), (x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)]);
        assert_eq!(dissolve(std::slice::from_ref(&a)), a);
    }

    #[test]
    fn dissolve_folds_all_inputs() {
        let shapes = vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0), square(2.0, 0.0, 1.0)];
        let merged = dissolve(&shapes);

        assert_eq!(merged.polygons().len(), 1);
        assert!((area(&merged) - 3.0).abs() < EPS);
        assert!(dissolve(&[]).is_empty());
    }
}
