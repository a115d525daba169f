//! Planar geometry helpers: distances, centroids and the triangular search region.

use nalgebra::{Point2, Vector2};

/// Squared Euclidean distance between two positions.
#[inline]
pub fn squared_distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance_squared(a, b)
}

/// Midpoint between two positions.
#[inline]
pub fn midpoint(a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
    nalgebra::center(a, b)
}

/// Arithmetic mean of a set of positions, `None` when the set is empty.
pub fn centroid<I>(positions: I) -> Option<Point2<f64>>
where
    I: IntoIterator<Item = Point2<f64>>,
{
    let mut sum = Vector2::<f64>::zeros();
    let mut count = 0usize;
    for p in positions {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Point2::from(sum / count as f64))
    }
}

/// Admissible area for a point's next match.
///
/// A triangle whose apex sits slightly behind the point and whose base opens
/// up in the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRegion {
    /// Vertices in order: rear apex, counter-clockwise base, clockwise base.
    pub vertices: [Point2<f64>; 3],
}

impl SearchRegion {
    #[inline]
    pub fn new(apex: Point2<f64>, ccw: Point2<f64>, cw: Point2<f64>) -> Self {
        Self {
            vertices: [apex, ccw, cw],
        }
    }

    #[inline]
    pub fn apex(&self) -> Point2<f64> {
        self.vertices[0]
    }

    /// Point-in-triangle test. Points on an edge count as inside.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        let [a, b, c] = &self.vertices;
        let d1 = edge_side(a, b, p);
        let d2 = edge_side(b, c, p);
        let d3 = edge_side(c, a, p);

        let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
        let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

        !(has_neg && has_pos)
    }

    /// Unsigned area of the triangle.
    pub fn area(&self) -> f64 {
        let [a, b, c] = &self.vertices;
        edge_side(a, b, c).abs() / 2.0
    }
}

/// Z component of `(b - a) x (p - a)`: which side of the directed edge `a -> b` `p` lies on.
#[inline]
fn edge_side(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> f64 {
    (b - a).perp(&(p - a))
}
