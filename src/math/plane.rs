use crate::error::{Result, SectionError};

use super::{Point3, Vector3, TOLERANCE};

/// An infinite plane `n · x + d = 0` with unit normal `n`.
///
/// The offset `d` is signed: a point `p` lies on the normal side when
/// [`distance_to`](Self::distance_to) is positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuttingPlane {
    normal: Vector3,
    offset: f64,
}

impl CuttingPlane {
    /// Creates a plane from a normal and an offset.
    ///
    /// The normal is normalized and the offset scaled accordingly, so
    /// `(2, 0, 0)` with offset `-2` describes the plane `x = 1`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn new(normal: Vector3, offset: f64) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE || !len.is_finite() {
            return Err(SectionError::ZeroNormal.into());
        }
        Ok(Self {
            normal: normal / len,
            offset: offset / len,
        })
    }

    /// Creates the plane through `origin` perpendicular to `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn through_point(origin: &Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE || !len.is_finite() {
            return Err(SectionError::ZeroNormal.into());
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            offset: -normal.dot(&origin.coords),
        })
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed offset `d`.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Signed distance from a point to the plane.
    /// Positive = on the normal side, negative = opposite.
    #[must_use]
    pub fn distance_to(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) + self.offset
    }

    /// Moves the plane along its normal by `delta`.
    #[must_use]
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            normal: self.normal,
            offset: self.offset - delta,
        }
    }

    /// Intersects the segment `start + α (end - start)` with the plane.
    #[must_use]
    pub fn cross_segment(&self, start: &Point3, end: &Point3) -> EdgeCrossing {
        let dir = end - start;
        let denom = self.normal.dot(&dir);
        let numer = -self.distance_to(start);

        if denom.abs() < TOLERANCE {
            return EdgeCrossing::Parallel;
        }
        let alpha = numer / denom;
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return EdgeCrossing::Miss;
        }
        let point = start + dir * alpha;
        if point.coords.iter().all(|c| c.is_finite()) {
            EdgeCrossing::Point { point, alpha }
        } else {
            EdgeCrossing::Miss
        }
    }
}

/// Result of crossing a boundary edge with a cutting plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCrossing {
    /// The edge crosses the plane at `point`, a fraction `alpha` along it.
    Point { point: Point3, alpha: f64 },
    /// The edge is parallel to (or lies in) the plane.
    Parallel,
    /// The edge's supporting line crosses the plane outside the segment.
    Miss,
}
