use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::boundary::{Boundary, PolytopeId};
use crate::config::SceneConfig;
use crate::error::{LineError, Result};
use crate::figure::{Figure, FigureId, FigureUpdate};
use crate::math::Point3;
use crate::render::RenderBackend;
use crate::slots::FigureSlots;

slotmap::new_key_type! {
    /// Handle to a user line segment.
    pub struct LineId;
}

fn clamp_to_display(config: &SceneConfig, p: Point3) -> Point3 {
    config.display_bounds.map_or(p, |bounds| bounds.clamp(&p))
}

/// Line figures tracing the edges of the cell.
///
/// The figures are rebuilt only when the cell's polytope is replaced. While
/// the polytope stays the same, edges that moved (e.g. a box being
/// compressed) just have their endpoints overwritten.
#[derive(Debug, Default)]
pub struct BoundaryFrame {
    polytope: Option<PolytopeId>,
    lines: FigureSlots,
    shown: bool,
}

impl BoundaryFrame {
    /// Creates a frame with no figures yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge figures, one per polytope edge.
    #[must_use]
    pub fn lines(&self) -> &FigureSlots {
        &self.lines
    }

    /// Brings the edge figures in line with the cell.
    ///
    /// Endpoints are clamped into the display bounds, if any. Returns the
    /// number of edge figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn update(
        &mut self,
        boundary: &Boundary,
        config: &SceneConfig,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize> {
        let polytope = boundary.polytope();
        if self.polytope != Some(polytope.id()) {
            let released = self.lines.release_all(backend)?;
            debug!(released, edges = polytope.edge_count(), "rebuilding cell frame");
            self.polytope = Some(polytope.id());
        }

        let edges: Vec<(Point3, Point3)> = polytope
            .edges()
            .map(|(a, b)| (clamp_to_display(config, a), clamp_to_display(config, b)))
            .collect();
        let show = config.show_boundary;
        let kept = self.lines.len().min(edges.len());
        self.lines.resize(edges.len(), backend, |i| {
            let (start, end) = edges[i];
            let mut figure = Figure::line(start, end, config.boundary_color);
            figure.drawable = show;
            figure
        })?;

        for (i, &id) in self.lines.handles()[..kept].iter().enumerate() {
            let (start, end) = edges[i];
            backend.update_figure(id, FigureUpdate::Line { start, end })?;
            if show != self.shown {
                backend.set_drawable(id, show)?;
            }
        }
        self.shown = show;
        Ok(edges.len())
    }

    /// Releases every edge figure. The next update rebuilds them.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        self.polytope = None;
        self.lines.release_all(backend)
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Point3,
    end: Point3,
    figure: Option<FigureId>,
    dirty: bool,
}

/// Free-standing line segments drawn alongside the particles.
///
/// Segments get their figure on the first update after they are added.
#[derive(Debug, Default)]
pub struct LineSet {
    segments: SlotMap<LineId, Segment>,
}

impl LineSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Figure drawing a segment, once it has been created.
    #[must_use]
    pub fn figure(&self, id: LineId) -> Option<FigureId> {
        self.segments.get(id).and_then(|s| s.figure)
    }

    /// Adds a segment.
    pub fn add_line(&mut self, start: Point3, end: Point3) -> LineId {
        self.segments.insert(Segment {
            start,
            end,
            figure: None,
            dirty: true,
        })
    }

    /// Moves a segment's endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::UnknownLine`] if the segment does not exist.
    pub fn set_line(&mut self, id: LineId, start: Point3, end: Point3) -> Result<()> {
        let segment = self.segments.get_mut(id).ok_or(LineError::UnknownLine)?;
        segment.start = start;
        segment.end = end;
        segment.dirty = true;
        Ok(())
    }

    /// Removes a segment and releases its figure.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::UnknownLine`] if the segment does not exist, or an
    /// error if the back end rejects the release.
    pub fn remove_line(&mut self, id: LineId, backend: &mut dyn RenderBackend) -> Result<()> {
        let segment = self.segments.remove(id).ok_or(LineError::UnknownLine)?;
        if let Some(figure) = segment.figure {
            backend.destroy_figure(figure)?;
        }
        Ok(())
    }

    /// Creates missing figures and pushes moved endpoints. Returns the number
    /// of figures touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn update_all(&mut self, config: &SceneConfig, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut touched = 0;
        for segment in self.segments.values_mut().filter(|s| s.dirty) {
            match segment.figure {
                Some(figure) => backend.update_figure(
                    figure,
                    FigureUpdate::Line {
                        start: segment.start,
                        end: segment.end,
                    },
                )?,
                None => {
                    segment.figure = Some(backend.create_figure(Figure::line(
                        segment.start,
                        segment.end,
                        config.line_color,
                    ))?);
                }
            }
            segment.dirty = false;
            touched += 1;
        }
        if touched > 0 {
            trace!(touched, "line segments updated");
        }
        Ok(touched)
    }

    /// Releases every segment figure, keeping the segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_all(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut released = 0;
        for segment in self.segments.values_mut() {
            if let Some(figure) = segment.figure.take() {
                segment.dirty = true;
                backend.destroy_figure(figure)?;
                released += 1;
            }
        }
        Ok(released)
    }
}
