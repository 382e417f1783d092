use crate::boundary::{Boundary, BoundaryShape};
use crate::math::{Point3, Vector3};

/// Computes the translations needed to draw the overflow images of a sphere
/// that pokes through a periodic face of the cell.
///
/// The result always starts with the zero shift (the particle itself) and
/// holds `2^k` vectors when the sphere crosses a face on `k` periodic axes:
/// for each crossed axis every shift found so far is duplicated and the copy
/// displaced by one cell length, so a particle in a corner also gets its
/// diagonal images.
///
/// Rectangular cells are centered on the origin and tested against
/// `±L/2`. Truncated-octahedron cells are tested against `[0, L)` on each
/// axis. Any other shape yields an empty list.
pub struct OverflowShifts {
    position: Point3,
    radius: f64,
}

impl OverflowShifts {
    /// Creates a new `OverflowShifts` query for a sphere.
    #[must_use]
    pub fn new(position: Point3, radius: f64) -> Self {
        Self { position, radius }
    }

    /// Executes the query against the cell.
    #[must_use]
    pub fn execute(&self, boundary: &Boundary) -> Vec<Vector3> {
        let shape = boundary.shape();
        if shape == BoundaryShape::Other {
            return Vec::new();
        }

        let mut shifts = vec![Vector3::zeros()];
        for axis in 0..3 {
            if !boundary.is_periodic(axis) {
                continue;
            }
            let length = boundary.dimensions()[axis];
            let lo = self.position[axis] - self.radius;
            let hi = self.position[axis] + self.radius;
            let (crosses_low, crosses_high) = if shape == BoundaryShape::TruncatedOctahedron {
                (lo < 0.0, hi >= length)
            } else {
                (lo < -0.5 * length, hi > 0.5 * length)
            };
            let displacement = if crosses_low {
                length
            } else if crosses_high {
                -length
            } else {
                continue;
            };

            let existing = shifts.len();
            for i in 0..existing {
                let mut shifted = shifts[i];
                shifted[axis] += displacement;
                shifts.push(shifted);
            }
        }
        shifts
    }
}

/// Computes the origins of the periodic image shells drawn around the cell.
///
/// Shell `n` covers every integer combination in `[-n, n]` of the cell's
/// translation vectors except the all-zero one, giving `(2n+1)^p - 1`
/// origins for `p` translation vectors.
pub struct ImageOrigins {
    shells: u32,
}

impl ImageOrigins {
    /// Creates a new `ImageOrigins` query.
    #[must_use]
    pub fn new(shells: u32) -> Self {
        Self { shells }
    }

    /// Executes the query against the cell.
    #[must_use]
    pub fn execute(&self, boundary: &Boundary) -> Vec<Vector3> {
        let translations = boundary.translations();
        if self.shells == 0 || translations.is_empty() {
            return Vec::new();
        }
        let n = i64::from(self.shells);
        let mut coeffs = vec![-n; translations.len()];
        let mut origins = Vec::new();
        loop {
            if coeffs.iter().any(|&c| c != 0) {
                #[allow(clippy::cast_precision_loss)]
                let origin = coeffs
                    .iter()
                    .zip(translations)
                    .fold(Vector3::zeros(), |acc, (&c, t)| acc + t * c as f64);
                origins.push(origin);
            }
            // Advance the odometer.
            let mut digit = 0;
            loop {
                if digit == coeffs.len() {
                    return origins;
                }
                if coeffs[digit] < n {
                    coeffs[digit] += 1;
                    break;
                }
                coeffs[digit] = -n;
                digit += 1;
            }
        }
    }
}
