use std::sync::atomic::{AtomicU64, Ordering};

use crate::math::{Aabb, Point3, Vector3, TOLERANCE};

/// Identity of one polytope construction.
///
/// Every constructed polytope gets a fresh ID, so comparing IDs is a cheap
/// way to notice that the cell shape was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolytopeId(u64);

impl PolytopeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A convex cell shape described by its vertices and edges.
#[derive(Debug, Clone)]
pub struct Polytope {
    id: PolytopeId,
    vertices: Vec<Point3>,
    edges: Vec<[usize; 2]>,
}

impl Polytope {
    /// Creates a polytope from vertices and edges given as vertex index pairs.
    ///
    /// Edges referring to missing vertices are kept but skipped on iteration.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, edges: Vec<[usize; 2]>) -> Self {
        Self {
            id: PolytopeId::next(),
            vertices,
            edges,
        }
    }

    /// Axis-aligned box centered on the origin.
    #[must_use]
    pub fn cuboid(size: &Vector3) -> Self {
        let h = size * 0.5;
        let vertices = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        // Corners differing in exactly one bit share an edge.
        let mut edges = Vec::with_capacity(12);
        for i in 0..8_usize {
            for bit in [1, 2, 4] {
                if i & bit == 0 {
                    edges.push([i, i | bit]);
                }
            }
        }
        Self::new(vertices, edges)
    }

    /// Truncated octahedron inscribed in a cube of side `length` centered on
    /// the origin: its square faces touch the cube faces.
    ///
    /// Vertices are all permutations of `(0, ±L/4, ±L/2)`.
    #[must_use]
    pub fn truncated_octahedron(length: f64) -> Self {
        let q = length * 0.25;
        let h = length * 0.5;
        let mut vertices = Vec::with_capacity(24);
        for zero_axis in 0..3 {
            for (a, b) in [(q, h), (h, q)] {
                for (sa, sb) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                    let mut c = [0.0; 3];
                    c[(zero_axis + 1) % 3] = sa * a;
                    c[(zero_axis + 2) % 3] = sb * b;
                    vertices.push(Point3::new(c[0], c[1], c[2]));
                }
            }
        }

        let edge_length = q * std::f64::consts::SQRT_2;
        let tol = edge_length * 1e-6 + TOLERANCE;
        let mut edges = Vec::with_capacity(36);
        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                if ((vertices[i] - vertices[j]).norm() - edge_length).abs() < tol {
                    edges.push([i, j]);
                }
            }
        }
        Self::new(vertices, edges)
    }

    /// Copy of this polytope moved by `offset`. The copy gets a new identity.
    #[must_use]
    pub fn translated(&self, offset: &Vector3) -> Self {
        Self::new(
            self.vertices.iter().map(|v| v + offset).collect(),
            self.edges.clone(),
        )
    }

    /// Returns this construction's identity.
    #[must_use]
    pub fn id(&self) -> PolytopeId {
        self.id
    }

    /// Returns the vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Endpoints of edge `index`, or `None` if the index or its vertices are
    /// out of range.
    #[must_use]
    pub fn edge(&self, index: usize) -> Option<(Point3, Point3)> {
        let [a, b] = *self.edges.get(index)?;
        Some((*self.vertices.get(a)?, *self.vertices.get(b)?))
    }

    /// Vertex indices of edge `index`.
    #[must_use]
    pub fn edge_indices(&self, index: usize) -> Option<[usize; 2]> {
        self.edges.get(index).copied()
    }

    /// Iterates over edge endpoints, skipping malformed edges.
    pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        (0..self.edges.len()).filter_map(|i| self.edge(i))
    }

    /// Bounding box of the vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}
