//! Planar polygon helpers for support polygons.
//!
//! Support polygons are convex and stored in clockwise order, the convention
//! the ZMP half-space constraints are written against.

use nalgebra::Vector2;

/// Cross product of `(b - a)` and `(c - a)`.
fn cross(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Convex hull of a planar point set, returned in clockwise order.
///
/// Monotone chain; collinear points on the hull boundary are dropped.
/// Degenerate inputs (fewer than 3 distinct points) are returned as-is.
#[must_use]
pub fn convex_hull(points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let mut sorted: Vec<Vector2<f64>> = points.to_vec();
    sorted.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).expect("NaN in polygon point"));
    sorted.dedup_by(|a, b| (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12);

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Vector2<f64>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Vector2<f64>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    // Counter-clockwise hull, last point of each chain duplicates the start
    // of the other.
    lower.pop();
    upper.pop();
    lower.extend(upper);

    lower.reverse();
    lower
}

/// Whether `point` lies inside a clockwise convex polygon, shrunk inward by
/// `margin`.
#[must_use]
pub fn point_in_polygon(point: &Vector2<f64>, polygon: &[Vector2<f64>], margin: f64) -> bool {
    polygon_edges(polygon).all(|(normal, offset)| normal.dot(point) + offset - margin >= 0.0)
}

/// Iterate the half-spaces of a clockwise convex polygon.
///
/// Each edge yields `(n, c)` with `n` the unit inward normal such that a
/// point `p` is inside the polygon iff `n . p + c >= 0` for every edge.
pub fn polygon_edges(
    polygon: &[Vector2<f64>],
) -> impl Iterator<Item = (Vector2<f64>, f64)> + '_ {
    let n = polygon.len();
    (0..n).filter_map(move |i| {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let edge = b - a;
        let length = edge.norm();
        if length < 1e-12 {
            return None;
        }
        // Inward normal of a clockwise polygon edge.
        let normal = Vector2::new(edge.y, -edge.x) / length;
        Some((normal, -normal.dot(&a)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ]
    }

    fn is_clockwise(polygon: &[Vector2<f64>]) -> bool {
        let mut area = 0.0;
        for i in 0..polygon.len() {
            let a = polygon[i];
            let b = polygon[(i + 1) % polygon.len()];
            area += a.x * b.y - b.x * a.y;
        }
        area < 0.0
    }

    #[test]
    fn hull_of_square_with_interior_point() {
        let mut points = square();
        points.push(Vector2::new(0.5, 0.5));
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(is_clockwise(&hull));
    }

    #[test]
    fn hull_of_two_feet() {
        // Two unit squares side by side: hull is the bounding rectangle.
        let mut points = square();
        points.extend(square().iter().map(|p| p + Vector2::new(0.0, 2.0)));
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(is_clockwise(&hull));
        assert!(point_in_polygon(&Vector2::new(0.5, 1.5), &hull, 0.0));
    }

    #[test]
    fn point_in_polygon_with_margin() {
        let hull = convex_hull(&square());
        assert!(point_in_polygon(&Vector2::new(0.5, 0.5), &hull, 0.4));
        assert!(!point_in_polygon(&Vector2::new(0.5, 0.5), &hull, 0.6));
        assert!(!point_in_polygon(&Vector2::new(1.1, 0.5), &hull, 0.0));
    }

    #[test]
    fn edges_normals_point_inward() {
        let hull = convex_hull(&square());
        let center = Vector2::new(0.5, 0.5);
        for (normal, offset) in polygon_edges(&hull) {
            assert!(normal.dot(&center) + offset > 0.0);
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        }
    }
}
