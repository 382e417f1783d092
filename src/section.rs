use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use crate::boundary::Polytope;
use crate::error::{Result, SectionError};
use crate::figure::{Color, Figure, FigureUpdate};
use crate::math::polygon::{fan_triangles, order_polygon};
use crate::math::{CuttingPlane, EdgeCrossing, Point3};
use crate::render::RenderBackend;
use crate::slots::FigureSlots;

/// Two crossings closer than this are the same point, e.g. a plane passing
/// exactly through a vertex shared by several edges.
const COINCIDENT: f64 = 1e-8;

slotmap::new_key_type! {
    /// Handle to a cutting plane.
    pub struct PlaneId;
}

/// Intersects a cutting plane with the edges of a cell polytope.
///
/// Returns the cross-section polygon with its points ordered around the
/// centroid, counter-clockwise when viewed from the tip of the plane normal.
/// An empty result means the plane misses the cell or only touches it in
/// fewer than three distinct points.
#[must_use]
pub fn intersect(plane: &CuttingPlane, polytope: &Polytope) -> Vec<Point3> {
    let mut points: Vec<Point3> = Vec::new();
    for (start, end) in polytope.edges() {
        let EdgeCrossing::Point { point, .. } = plane.cross_segment(&start, &end) else {
            continue;
        };
        if !point.coords.iter().all(|c| c.is_finite()) {
            warn!(?start, ?end, "discarding non-finite edge crossing");
            continue;
        }
        if points.iter().any(|q| (q - point).norm() < COINCIDENT) {
            continue;
        }
        points.push(point);
    }

    if points.len() < 3 {
        return Vec::new();
    }
    order_polygon(&points, plane.normal())
}

/// Splits an ordered convex polygon into a fan of triangles from its first
/// point.
#[must_use]
pub fn triangulate(points: &[Point3]) -> Vec<[Point3; 3]> {
    fan_triangles(points)
}

/// A cutting plane and the triangle figures drawing its cross-section.
#[derive(Debug)]
pub struct PlaneSection {
    plane: CuttingPlane,
    triangles: FigureSlots,
    color: Option<Color>,
}

impl PlaneSection {
    /// Creates a section with no figures yet.
    #[must_use]
    pub fn new(plane: CuttingPlane) -> Self {
        Self {
            plane,
            triangles: FigureSlots::new(),
            color: None,
        }
    }

    /// The plane being drawn.
    #[must_use]
    pub fn plane(&self) -> &CuttingPlane {
        &self.plane
    }

    /// Moves the plane. Takes effect on the next [`update`](Self::update).
    pub fn set_plane(&mut self, plane: CuttingPlane) {
        self.plane = plane;
    }

    /// Triangle figures currently held, in fan order.
    #[must_use]
    pub fn triangles(&self) -> &FigureSlots {
        &self.triangles
    }

    /// Recomputes the cross-section and brings the triangle figures in line.
    ///
    /// Only the difference in triangle count is created or released;
    /// surviving triangles get their vertices overwritten. A plane that
    /// misses the cell releases every triangle.
    ///
    /// Returns the number of triangles drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn update(
        &mut self,
        polytope: &Polytope,
        color: Color,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize> {
        let polygon = intersect(&self.plane, polytope);
        if polygon.is_empty() {
            let released = self.triangles.release_all(backend)?;
            if released > 0 {
                debug!(released, "cutting plane left the cell");
            }
            return Ok(0);
        }

        let triangles = triangulate(&polygon);
        let kept = self.triangles.len().min(triangles.len());
        let recolor = self.color != Some(color);
        let delta = self
            .triangles
            .resize(triangles.len(), backend, |i| Figure::triangle(triangles[i], color))?;

        for (i, &id) in self.triangles.handles()[..kept].iter().enumerate() {
            backend.update_figure(
                id,
                FigureUpdate::Triangle {
                    vertices: triangles[i],
                },
            )?;
            if recolor {
                backend.update_figure(id, FigureUpdate::Color(color))?;
            }
        }
        self.color = Some(color);
        trace!(triangles = triangles.len(), ?delta, "plane section updated");
        Ok(triangles.len())
    }

    /// Releases every triangle figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        self.triangles.release_all(backend)
    }
}

/// The set of cutting planes drawn through the cell.
#[derive(Debug, Default)]
pub struct CuttingPlanes {
    sections: SlotMap<PlaneId, PlaneSection>,
}

impl CuttingPlanes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of planes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if there are no planes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The section drawn for a plane.
    #[must_use]
    pub fn section(&self, id: PlaneId) -> Option<&PlaneSection> {
        self.sections.get(id)
    }

    /// Adds a plane. Its figures appear on the next update.
    pub fn add_plane(&mut self, plane: CuttingPlane) -> PlaneId {
        self.sections.insert(PlaneSection::new(plane))
    }

    /// Moves an existing plane.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::UnknownPlane`] if the plane was never added or
    /// was removed.
    pub fn set_plane(&mut self, id: PlaneId, plane: CuttingPlane) -> Result<()> {
        self.sections
            .get_mut(id)
            .ok_or(SectionError::UnknownPlane)?
            .set_plane(plane);
        Ok(())
    }

    /// Removes a plane and releases its figures.
    ///
    /// # Errors
    ///
    /// Returns [`SectionError::UnknownPlane`] if the plane was never added or
    /// was already removed, or an error if the back end rejects a release.
    pub fn remove_plane(&mut self, id: PlaneId, backend: &mut dyn RenderBackend) -> Result<()> {
        let mut section = self.sections.remove(id).ok_or(SectionError::UnknownPlane)?;
        section.release(backend)?;
        Ok(())
    }

    /// Updates every plane against the current cell. Returns the total
    /// number of triangles drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn update_all(
        &mut self,
        polytope: &Polytope,
        color: Color,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize> {
        let mut total = 0;
        for section in self.sections.values_mut() {
            total += section.update(polytope, color, backend)?;
        }
        Ok(total)
    }

    /// Releases the figures of every plane, keeping the planes.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_all(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut released = 0;
        for section in self.sections.values_mut() {
            released += section.release(backend)?;
        }
        Ok(released)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::SceneError;
    use crate::figure::{FigureKind, FigureShape};
    use crate::math::polygon::{has_consistent_winding, polygon_area};
    use crate::math::Vector3;
    use crate::render::FigureStore;

    fn cube() -> Polytope {
        Polytope::cuboid(&Vector3::repeat(10.0))
    }

    fn plane(normal: Vector3, offset: f64) -> CuttingPlane {
        CuttingPlane::new(normal, offset).unwrap()
    }

    #[test]
    fn plane_outside_cell_misses() {
        let points = intersect(&plane(Vector3::x(), -20.0), &cube());
        assert!(points.is_empty());
    }

    #[test]
    fn mid_plane_gives_ordered_square() {
        let plane = plane(Vector3::z(), 0.0);
        let points = intersect(&plane, &cube());
        assert_eq!(points.len(), 4);
        for p in &points {
            assert_relative_eq!(p.z, 0.0);
            assert_relative_eq!(p.x.abs(), 5.0);
            assert_relative_eq!(p.y.abs(), 5.0);
        }
        assert!(has_consistent_winding(&points, plane.normal()));
        assert_relative_eq!(polygon_area(&points, plane.normal()), 100.0, epsilon = 1e-9);
        assert_eq!(triangulate(&points).len(), 2);
    }

    #[test]
    fn diagonal_plane_gives_hexagon() {
        let plane = plane(Vector3::new(1.0, 1.0, 1.0), 0.0);
        let points = intersect(&plane, &cube());
        assert_eq!(points.len(), 6);
        assert!(has_consistent_winding(&points, plane.normal()));
        assert_eq!(triangulate(&points).len(), 4);
    }

    #[test]
    fn plane_touching_a_corner_misses() {
        // x + y + z = 15 meets the cube only at (5, 5, 5), reached by three
        // edges.
        let plane = plane(Vector3::new(1.0, 1.0, 1.0), -15.0);
        assert!(intersect(&plane, &cube()).is_empty());
    }

    #[test]
    fn plane_on_a_face_gives_that_face() {
        let plane = plane(Vector3::x(), -5.0);
        let points = intersect(&plane, &cube());
        assert_eq!(points.len(), 4);
        for p in &points {
            assert_relative_eq!(p.x, 5.0);
        }
    }

    #[test]
    fn section_resizes_by_delta_only() {
        let mut store = FigureStore::new();
        let polytope = cube();
        let mut section = PlaneSection::new(plane(Vector3::z(), 0.0));

        assert_eq!(section.update(&polytope, Color::YELLOW, &mut store).unwrap(), 2);
        let first = section.triangles().handles().to_vec();

        section.set_plane(plane(Vector3::new(1.0, 1.0, 1.0), 0.0));
        assert_eq!(section.update(&polytope, Color::YELLOW, &mut store).unwrap(), 4);
        assert_eq!(&section.triangles().handles()[..2], first.as_slice());
        assert_eq!(store.created(), 4);
        assert_eq!(store.destroyed(), 0);

        section.set_plane(plane(Vector3::z(), -1.0));
        assert_eq!(section.update(&polytope, Color::YELLOW, &mut store).unwrap(), 2);
        assert_eq!(store.destroyed(), 2);
        let FigureShape::Triangle { vertices } = store.figure(first[0]).unwrap().shape else {
            panic!("expected a triangle");
        };
        for v in vertices {
            assert_relative_eq!(v.z, 1.0);
        }
    }

    #[test]
    fn leaving_the_cell_releases_everything() {
        let mut store = FigureStore::new();
        let polytope = cube();
        let mut section = PlaneSection::new(plane(Vector3::z(), 0.0));
        section.update(&polytope, Color::YELLOW, &mut store).unwrap();

        section.set_plane(plane(Vector3::z(), 6.0));
        assert_eq!(section.update(&polytope, Color::YELLOW, &mut store).unwrap(), 0);
        assert!(section.triangles().is_empty());
        assert_eq!(store.count(FigureKind::Triangle), 0);
    }

    #[test]
    fn color_change_reaches_kept_triangles() {
        let mut store = FigureStore::new();
        let polytope = cube();
        let mut section = PlaneSection::new(plane(Vector3::z(), 0.0));
        section.update(&polytope, Color::YELLOW, &mut store).unwrap();
        section.update(&polytope, Color::RED, &mut store).unwrap();
        for &id in section.triangles().handles() {
            assert_eq!(store.figure(id).unwrap().color, Color::RED);
        }
    }

    #[test]
    fn unknown_plane_is_an_error() {
        let mut store = FigureStore::new();
        let mut planes = CuttingPlanes::new();
        let id = planes.add_plane(plane(Vector3::z(), 0.0));
        assert_eq!(planes.update_all(&cube(), Color::YELLOW, &mut store).unwrap(), 2);

        planes.remove_plane(id, &mut store).unwrap();
        assert!(store.is_empty());
        assert!(planes.is_empty());

        let err = planes.remove_plane(id, &mut store).unwrap_err();
        assert!(matches!(err, SceneError::Section(SectionError::UnknownPlane)));
        let err = planes.set_plane(id, plane(Vector3::x(), 0.0)).unwrap_err();
        assert!(matches!(err, SceneError::Section(SectionError::UnknownPlane)));
    }
}
