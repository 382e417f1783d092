mod polytope;

pub use polytope::{Polytope, PolytopeId};

use crate::math::{Aabb, Point3, Vector3, TOLERANCE};

/// Shape classes the overflow calculator knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryShape {
    /// Rectangular box, origin at its center.
    Rectangular,
    /// Truncated octahedron, tiling space on a body-centered lattice.
    TruncatedOctahedron,
    /// Any other convex cell.
    Other,
}

/// Geometry of the simulation cell as needed for drawing.
#[derive(Debug, Clone)]
pub struct Boundary {
    shape: BoundaryShape,
    dimensions: Vector3,
    periodic: [bool; 3],
    polytope: Polytope,
    translations: Vec<Vector3>,
}

impl Boundary {
    /// Rectangular box of the given edge lengths with per-axis periodicity.
    #[must_use]
    pub fn rectangular(dimensions: Vector3, periodic: [bool; 3]) -> Self {
        let translations = rectangular_translations(&dimensions, periodic);
        Self {
            shape: BoundaryShape::Rectangular,
            dimensions,
            periodic,
            polytope: Polytope::cuboid(&dimensions),
            translations,
        }
    }

    /// Fully periodic cube of edge `length`.
    #[must_use]
    pub fn periodic_cube(length: f64) -> Self {
        Self::rectangular(Vector3::repeat(length), [true; 3])
    }

    /// Fully periodic truncated octahedron inscribed in the cube `[0, L]^3`.
    ///
    /// Unlike rectangular cells this shape is not centered on the origin;
    /// particles live in `[0, L)` on each axis.
    #[must_use]
    pub fn truncated_octahedron(length: f64) -> Self {
        let h = length * 0.5;
        Self {
            shape: BoundaryShape::TruncatedOctahedron,
            dimensions: Vector3::repeat(length),
            periodic: [true; 3],
            polytope: Polytope::truncated_octahedron(length).translated(&Vector3::repeat(h)),
            translations: vec![
                Vector3::new(-h, h, h),
                Vector3::new(h, -h, h),
                Vector3::new(h, h, -h),
            ],
        }
    }

    /// Arbitrary convex cell with explicit periodic translation vectors.
    #[must_use]
    pub fn custom(polytope: Polytope, translations: Vec<Vector3>) -> Self {
        let dimensions = polytope.bounds().map_or_else(Vector3::zeros, |b| b.size());
        Self {
            shape: BoundaryShape::Other,
            dimensions,
            periodic: [false; 3],
            polytope,
            translations,
        }
    }

    /// Returns the shape class.
    #[must_use]
    pub fn shape(&self) -> BoundaryShape {
        self.shape
    }

    /// Edge lengths of the cell's bounding box.
    #[must_use]
    pub fn dimensions(&self) -> &Vector3 {
        &self.dimensions
    }

    /// Whether axis `axis` wraps around.
    #[must_use]
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic.get(axis).copied().unwrap_or(false)
    }

    /// The cell outline.
    #[must_use]
    pub fn polytope(&self) -> &Polytope {
        &self.polytope
    }

    /// Lattice vectors that map the cell onto its periodic neighbours.
    #[must_use]
    pub fn translations(&self) -> &[Vector3] {
        &self.translations
    }

    /// Extent of the cell, in the same frame as the particles and the
    /// outline.
    #[must_use]
    pub fn extent(&self) -> Aabb {
        match self.shape {
            BoundaryShape::Rectangular => Aabb::centered(&self.dimensions),
            BoundaryShape::TruncatedOctahedron => {
                Aabb::new(Point3::origin(), Point3::from(self.dimensions))
            }
            BoundaryShape::Other => self
                .polytope
                .bounds()
                .unwrap_or_else(|| Aabb::centered(&self.dimensions)),
        }
    }

    /// Resizes the cell. The outline is rebuilt and gets a new identity.
    pub fn set_dimensions(&mut self, dimensions: Vector3) {
        match self.shape {
            BoundaryShape::Rectangular => {
                *self = Self::rectangular(dimensions, self.periodic);
            }
            BoundaryShape::TruncatedOctahedron => {
                *self = Self::truncated_octahedron(dimensions.x);
            }
            BoundaryShape::Other => {
                let scale = dimensions.zip_map(&self.dimensions, |new, old| {
                    if old.abs() < TOLERANCE {
                        1.0
                    } else {
                        new / old
                    }
                });
                let vertices = self
                    .polytope
                    .vertices()
                    .iter()
                    .map(|v| Point3::from(v.coords.component_mul(&scale)))
                    .collect();
                let edges = (0..self.polytope.edge_count())
                    .filter_map(|i| self.polytope.edge_indices(i))
                    .collect();
                self.polytope = Polytope::new(vertices, edges);
                for t in &mut self.translations {
                    *t = t.component_mul(&scale);
                }
                self.dimensions = dimensions;
            }
        }
    }
}

fn rectangular_translations(dimensions: &Vector3, periodic: [bool; 3]) -> Vec<Vector3> {
    (0..3)
        .filter(|&axis| periodic[axis])
        .map(|axis| {
            let mut t = Vector3::zeros();
            t[axis] = dimensions[axis];
            t
        })
        .collect()
}
