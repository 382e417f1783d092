use std::f64::consts::TAU;

use super::{Point3, Vector3, TOLERANCE};

/// Arithmetic mean of a point set, or `None` when empty.
#[must_use]
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / n))
}

/// Orders coplanar points of a convex polygon so that consecutive points
/// form its boundary.
///
/// Each point is measured by its angle from the first point as seen from the
/// centroid. The arccosine of the normalized dot product only spans `[0, π]`,
/// so the sign of `first × p` along `reference` decides whether the angle is
/// reflected to `2π - θ`. `reference` should be the polygon's plane normal; a
/// normal derived from two of the points themselves becomes unstable when they
/// are nearly collinear with the centroid.
///
/// The first point stays first, and the winding is counter-clockwise when
/// viewed from the tip of `reference`.
#[must_use]
pub fn order_polygon(points: &[Point3], reference: &Vector3) -> Vec<Point3> {
    let Some(center) = centroid(points) else {
        return Vec::new();
    };
    let relative: Vec<Vector3> = points.iter().map(|p| p - center).collect();
    let first = relative[0];

    let mut keyed: Vec<(f64, Vector3)> = relative
        .iter()
        .skip(1)
        .map(|r| (angle_from(&first, r, reference), *r))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    std::iter::once(first)
        .chain(keyed.into_iter().map(|(_, r)| r))
        .map(|r| center + r)
        .collect()
}

/// Angle in `[0, 2π)` swept from `first` to `other` around `reference`.
fn angle_from(first: &Vector3, other: &Vector3, reference: &Vector3) -> f64 {
    let denom = (first.norm_squared() * other.norm_squared()).sqrt();
    if denom < TOLERANCE {
        return 0.0;
    }
    let cos = (first.dot(other) / denom).clamp(-1.0, 1.0);
    let angle = cos.acos();
    if first.cross(other).dot(reference) < 0.0 {
        TAU - angle
    } else {
        angle
    }
}

/// Splits an ordered convex polygon into a fan of triangles sharing point 0.
///
/// Always yields `max(0, n - 2)` triangles.
#[must_use]
pub fn fan_triangles(points: &[Point3]) -> Vec<[Point3; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }
    points
        .windows(2)
        .skip(1)
        .map(|w| [points[0], w[0], w[1]])
        .collect()
}

/// Returns `true` if every turn of the closed polygon bends the same way
/// around `normal` (the polygon is convex and does not self-intersect).
#[cfg(test)]
#[must_use]
pub(crate) fn has_consistent_winding(points: &[Point3], normal: &Vector3) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let a = points[(i + 1) % n] - points[i];
        let b = points[(i + 2) % n] - points[(i + 1) % n];
        let turn = a.cross(&b).dot(normal);
        if turn.abs() < TOLERANCE {
            continue;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Compute the area of a 3D polygon (coplanar points).
///
/// Uses the cross-product summation method projected along the polygon normal.
#[cfg(test)]
#[must_use]
pub(crate) fn polygon_area(points: &[Point3], normal: &Vector3) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let o = &points[0];
    let cross_sum = points
        .windows(2)
        .skip(1)
        .fold(Vector3::zeros(), |acc, w| acc + (w[0] - o).cross(&(w[1] - o)));
    0.5 * cross_sum.dot(normal).abs()
}
