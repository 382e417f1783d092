pub mod plane;
pub mod polygon;

pub use plane::{CuttingPlane, EdgeCrossing};

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from two corners, normalizing their order per axis.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates a box centered on the origin with the given full extents.
    #[must_use]
    pub fn centered(size: &Vector3) -> Self {
        let half = size * 0.5;
        Self {
            min: Point3::from(-half),
            max: Point3::from(half),
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut aabb = Self {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            for i in 0..3 {
                aabb.min[i] = aabb.min[i].min(p[i]);
                aabb.max[i] = aabb.max[i].max(p[i]);
            }
        }
        Some(aabb)
    }

    /// Returns `true` if the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns the point inside the box nearest to `p`.
    #[must_use]
    pub fn clamp(&self, p: &Point3) -> Point3 {
        Point3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Full extents along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(p(1.0, -1.0, 2.0), p(-1.0, 1.0, 0.0));
        assert_eq!(aabb.min, p(-1.0, -1.0, 0.0));
        assert_eq!(aabb.max, p(1.0, 1.0, 2.0));
    }

    #[test]
    fn clamp_snaps_outside_points() {
        let aabb = Aabb::centered(&Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(aabb.clamp(&p(5.0, 0.5, -3.0)), p(1.0, 0.5, -1.0));
        assert!(aabb.contains(&p(1.0, -1.0, 0.0)));
        assert!(!aabb.contains(&p(1.0001, 0.0, 0.0)));
    }

    #[test]
    fn from_points_spans_all() {
        let aabb = Aabb::from_points(&[p(0.0, 0.0, 0.0), p(3.0, -2.0, 1.0), p(-1.0, 4.0, 0.5)])
            .unwrap_or_else(|| Aabb::centered(&Vector3::zeros()));
        assert_eq!(aabb.min, p(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, p(3.0, 4.0, 1.0));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
