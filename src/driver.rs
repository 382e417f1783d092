use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::boundary::Boundary;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::figure::{Figure, FigureUpdate};
use crate::frame::{BoundaryFrame, LineSet};
use crate::links::PendingLinkQueue;
use crate::overflow::{ImageOrigins, OverflowShifts};
use crate::particle::{ParticleEvent, ParticleId, ParticleSource};
use crate::registry::{FigureRegistry, ParticleFilter, SyncReport};
use crate::render::RenderBackend;
use crate::section::CuttingPlanes;
use crate::slots::FigureSlots;

/// What one call to [`SceneDriver::draw_frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Particles added since the previous frame.
    pub added: usize,
    /// Particles removed since the previous frame.
    pub removed: usize,
    /// Pending links that became figures.
    pub links_created: usize,
    /// Result of the registry walk.
    pub sync: SyncReport,
    /// Overflow image balls drawn.
    pub overflow_images: usize,
    /// Cross-section triangles drawn.
    pub plane_triangles: usize,
    /// Cell edge figures.
    pub boundary_edges: usize,
    /// Periodic image shell origins published.
    pub image_origins: usize,
}

/// Keeps a rendering back end in step with a particle system, one frame at a
/// time.
///
/// Every frame the driver applies the membership changes reported by the
/// source, retries queued links, pushes particle positions into their ball
/// figures, draws overflow images across periodic faces, cuts the cell with
/// the configured planes, traces the cell edges and finally asks the back end
/// to refresh.
#[derive(Default)]
pub struct SceneDriver {
    config: SceneConfig,
    filter: Option<Box<ParticleFilter>>,
    registry: FigureRegistry,
    links: PendingLinkQueue,
    overflow: SecondaryMap<ParticleId, FigureSlots>,
    planes: CuttingPlanes,
    frame: BoundaryFrame,
    lines: LineSet,
}

impl std::fmt::Debug for SceneDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDriver")
            .field("config", &self.config)
            .field("filtered", &self.filter.is_some())
            .field("registry", &self.registry)
            .field("links", &self.links)
            .field("planes", &self.planes)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl SceneDriver {
    /// Creates a driver with the given display settings.
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Display settings; changes apply from the next frame.
    pub fn config_mut(&mut self) -> &mut SceneConfig {
        &mut self.config
    }

    /// Installs or clears the per-particle display filter.
    pub fn set_filter(&mut self, filter: Option<Box<ParticleFilter>>) {
        self.filter = filter;
    }

    #[must_use]
    pub fn registry(&self) -> &FigureRegistry {
        &self.registry
    }

    #[must_use]
    pub fn links(&self) -> &PendingLinkQueue {
        &self.links
    }

    /// Link queue together with the registry it resolves endpoints against.
    pub fn links_mut(&mut self) -> (&mut PendingLinkQueue, &FigureRegistry) {
        (&mut self.links, &self.registry)
    }

    #[must_use]
    pub fn planes(&self) -> &CuttingPlanes {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut CuttingPlanes {
        &mut self.planes
    }

    #[must_use]
    pub fn lines(&self) -> &LineSet {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut LineSet {
        &mut self.lines
    }

    #[must_use]
    pub fn boundary_frame(&self) -> &BoundaryFrame {
        &self.frame
    }

    /// Overflow image figures currently drawn for a particle.
    #[must_use]
    pub fn overflow_images(&self, id: ParticleId) -> Option<&FigureSlots> {
        self.overflow.get(id)
    }

    /// Draws one frame.
    ///
    /// An error abandons the rest of the frame; state already applied stays
    /// applied, and the next frame picks up from there.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn draw_frame<S>(
        &mut self,
        source: &mut S,
        boundary: &Boundary,
        backend: &mut dyn RenderBackend,
    ) -> Result<FrameReport>
    where
        S: ParticleSource + ?Sized,
    {
        let mut report = FrameReport::default();

        for event in source.drain_events() {
            match event {
                ParticleEvent::Added(particle) => {
                    let drawable = self.is_drawable(&particle);
                    if self
                        .registry
                        .on_particle_added(&particle, drawable, &self.config, backend)?
                        .is_some()
                    {
                        report.added += 1;
                    }
                }
                ParticleEvent::Removed(id) => {
                    if let Some(mut images) = self.overflow.remove(id) {
                        images.release_all(backend)?;
                    }
                    self.links.release_links_of(id, backend)?;
                    if self.registry.on_particle_removed(id, backend)? {
                        report.removed += 1;
                    }
                }
            }
        }

        report.links_created = self.links.flush(&self.registry, backend)?.len();
        report.sync = self
            .registry
            .sync(source, self.filter.as_deref(), &self.config, backend)?;
        report.overflow_images = self.update_overflow(source, boundary, backend)?;

        let polytope = boundary.polytope();
        report.plane_triangles = self
            .planes
            .update_all(polytope, self.config.plane_color, backend)?;
        report.boundary_edges = self.frame.update(boundary, &self.config, backend)?;
        self.lines.update_all(&self.config, backend)?;

        let origins = ImageOrigins::new(self.config.image_shells).execute(boundary);
        report.image_origins = origins.len();
        backend.set_image_origins(&origins);
        backend.set_bounding_box(boundary.extent());
        backend.refresh();

        trace!(?report, "frame drawn");
        Ok(report)
    }

    /// Releases every figure the driver owns. Planes, lines and the display
    /// settings are kept; the next frame redraws from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_all(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut released = self.release_overflow(backend)?;
        let links: Vec<ParticleId> = self.registry.iter().map(|(id, _)| id).collect();
        for id in links {
            released += self.links.release_links_of(id, backend)?;
        }
        released += self.registry.release_all(backend)?;
        released += self.planes.release_all(backend)?;
        released += self.frame.release(backend)?;
        released += self.lines.release_all(backend)?;
        debug!(released, "scene released");
        Ok(released)
    }

    fn is_drawable(&self, particle: &crate::particle::Particle) -> bool {
        self.filter.as_ref().map_or(true, |f| f(particle)) && self.config.in_bounds(&particle.position)
    }

    fn update_overflow<S>(
        &mut self,
        source: &S,
        boundary: &Boundary,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize>
    where
        S: ParticleSource + ?Sized,
    {
        if !self.config.draw_overflow {
            self.release_overflow(backend)?;
            return Ok(0);
        }

        let mut drawn = 0;
        let mut listed: SecondaryMap<ParticleId, ()> = SecondaryMap::new();
        for index in 0..source.particle_count() {
            let Some(particle) = source.particle(index) else {
                break;
            };
            if self.registry.current_figure(particle.id).is_none() {
                continue;
            }
            listed.insert(particle.id, ());
            let diameter = particle.diameter.unwrap_or(self.config.default_diameter);
            let shifts = if self.is_drawable(&particle) {
                OverflowShifts::new(particle.position, 0.5 * diameter).execute(boundary)
            } else {
                Vec::new()
            };
            let images = shifts.get(1..).unwrap_or_default();

            if images.is_empty() {
                if let Some(mut slots) = self.overflow.remove(particle.id) {
                    slots.release_all(backend)?;
                }
                continue;
            }
            if !self.overflow.contains_key(particle.id) {
                self.overflow.insert(particle.id, FigureSlots::new());
            }
            let Some(slots) = self.overflow.get_mut(particle.id) else {
                continue;
            };

            let kept = slots.len().min(images.len());
            slots.resize(images.len(), backend, |i| {
                Figure::ball(particle.position + images[i], diameter, particle.color)
            })?;
            for (i, &id) in slots.handles()[..kept].iter().enumerate() {
                backend.update_figure(
                    id,
                    FigureUpdate::Ball {
                        center: particle.position + images[i],
                        diameter,
                        color: particle.color,
                    },
                )?;
            }
            drawn += images.len();
        }

        // Images must not outlive their particle's presence in the list, even
        // before its removal event arrives.
        let unlisted: Vec<ParticleId> = self
            .overflow
            .keys()
            .filter(|&id| !listed.contains_key(id))
            .collect();
        for id in unlisted {
            if let Some(mut slots) = self.overflow.remove(id) {
                let released = slots.release_all(backend)?;
                debug!(particle = ?id, released, "released images of unlisted particle");
            }
        }
        Ok(drawn)
    }

    fn release_overflow(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut released = 0;
        let ids: Vec<ParticleId> = self.overflow.keys().collect();
        for id in ids {
            if let Some(mut slots) = self.overflow.remove(id) {
                released += slots.release_all(backend)?;
            }
        }
        Ok(released)
    }
}
