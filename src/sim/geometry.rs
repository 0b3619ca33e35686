//! Geometry helpers
//!
//! Screen convention: x grows right, y grows down.

use glam::DVec2;

/// Rotate a vector a quarter turn clockwise on screen ((1, 0) -> (0, 1))
#[inline]
pub fn perpendicular_right(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

/// Rotate a vector a quarter turn counter-clockwise on screen ((1, 0) -> (0, -1))
#[inline]
pub fn perpendicular_left(v: DVec2) -> DVec2 {
    DVec2::new(v.y, -v.x)
}

/// Intersection point of segments `a1-a2` and `b1-b2`, endpoints included.
///
/// Parallel and collinear segments report no intersection.
pub fn segment_intersection(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2) -> Option<DVec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.perp_dot(s);
    if denom.abs() < f64::EPSILON {
        return None;
    }

    let qp = b1 - a1;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + r * t)
    } else {
        None
    }
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: DVec2, b: DVec2, t: f64) -> DVec2 {
    a + (b - a) * t
}
