use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::config::SceneConfig;
use crate::error::Result;
use crate::figure::{Figure, FigureId, FigureUpdate};
use crate::particle::{Particle, ParticleId, ParticleSource};
use crate::render::RenderBackend;

/// Per-particle display predicate. Particles it rejects are hidden.
pub type ParticleFilter = dyn Fn(&Particle) -> bool + Send + Sync;

/// Outcome of one [`FigureRegistry::sync`] walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Particles read from the source.
    pub walked: usize,
    /// Ball figures created for particles seen for the first time.
    pub created: usize,
    /// Figures left drawable.
    pub visible: usize,
    /// Figures hidden by the filter or the display bounds.
    pub hidden: usize,
    /// Figures hidden because their particle was not in the list.
    pub stale: usize,
    /// The list shrank while it was being walked.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    figure: FigureId,
    seen: u64,
}

/// One-to-one association between live particles and their ball figures.
///
/// The table is keyed by the particle's stable ID rather than its index, so
/// it survives the list compacting itself. The association is cleared before
/// the figure is released: a figure is never reachable from the registry
/// after its release, and releasing through the registry twice is a no-op.
#[derive(Debug, Default)]
pub struct FigureRegistry {
    entries: SecondaryMap<ParticleId, Entry>,
    pass: u64,
}

impl FigureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered figures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no figures are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Figure currently drawn for a particle.
    #[must_use]
    pub fn current_figure(&self, id: ParticleId) -> Option<FigureId> {
        self.entries.get(id).map(|e| e.figure)
    }

    /// Iterates over `(particle, figure)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, FigureId)> + '_ {
        self.entries.iter().map(|(id, e)| (id, e.figure))
    }

    /// Creates the figure for a newly observed particle.
    ///
    /// Returns `None` for kinds that are not drawn as balls. If the particle
    /// already has a figure that figure is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end fails to create the figure.
    pub fn on_particle_added(
        &mut self,
        particle: &Particle,
        drawable: bool,
        config: &SceneConfig,
        backend: &mut dyn RenderBackend,
    ) -> Result<Option<FigureId>> {
        if let Some(entry) = self.entries.get(particle.id) {
            return Ok(Some(entry.figure));
        }
        if !particle.kind.is_renderable() {
            return Ok(None);
        }
        let diameter = particle.diameter.unwrap_or(config.default_diameter);
        let mut figure = Figure::ball(particle.position, diameter, particle.color);
        figure.drawable = drawable;
        let id = backend.create_figure(figure)?;
        // A particle removed concurrently may already be gone from the ID
        // space; slotmap refuses the insert and the figure must not leak.
        if self
            .entries
            .insert(
                particle.id,
                Entry {
                    figure: id,
                    seen: self.pass,
                },
            )
            .is_none()
            && !self.entries.contains_key(particle.id)
        {
            debug!(particle = ?particle.id, "particle vanished before its figure was registered");
            backend.destroy_figure(id)?;
            return Ok(None);
        }
        trace!(particle = ?particle.id, figure = ?id, "ball figure created");
        Ok(Some(id))
    }

    /// Releases the figure of a removed particle.
    ///
    /// Returns `false` if the particle had no figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end reports the figure as already
    /// released, which means something else released a figure it did not own.
    pub fn on_particle_removed(
        &mut self,
        id: ParticleId,
        backend: &mut dyn RenderBackend,
    ) -> Result<bool> {
        let Some(entry) = self.entries.remove(id) else {
            return Ok(false);
        };
        backend.destroy_figure(entry.figure)?;
        trace!(particle = ?id, figure = ?entry.figure, "ball figure released");
        Ok(true)
    }

    /// Pushes the current state of every listed particle into its figure.
    ///
    /// The list is walked by index with bounds-checked reads. If it shrinks
    /// under the walk, the rest of this frame's walk is abandoned: a frame may
    /// show one particle fewer than exist, never a figure without a particle.
    /// Particles seen for the first time get a figure here. Particles rejected
    /// by `filter` or outside the display bounds are hidden, not released.
    /// After a complete walk, figures whose particle was not listed are hidden
    /// until their removal is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a figure operation.
    pub fn sync<S>(
        &mut self,
        source: &S,
        filter: Option<&ParticleFilter>,
        config: &SceneConfig,
        backend: &mut dyn RenderBackend,
    ) -> Result<SyncReport>
    where
        S: ParticleSource + ?Sized,
    {
        self.pass += 1;
        let mut report = SyncReport::default();
        let count = source.particle_count();

        for index in 0..count {
            let Some(particle) = source.particle(index) else {
                debug!(index, count, "particle list shrank during sync, ending walk");
                report.truncated = true;
                break;
            };
            report.walked += 1;
            let drawable =
                filter.map_or(true, |f| f(&particle)) && config.in_bounds(&particle.position);

            let figure = if let Some(entry) = self.entries.get_mut(particle.id) {
                entry.seen = self.pass;
                entry.figure
            } else {
                match self.on_particle_added(&particle, drawable, config, backend)? {
                    Some(figure) => {
                        report.created += 1;
                        figure
                    }
                    None => continue,
                }
            };

            backend.set_drawable(figure, drawable)?;
            if drawable {
                report.visible += 1;
                backend.update_figure(
                    figure,
                    FigureUpdate::Ball {
                        center: particle.position,
                        diameter: particle.diameter.unwrap_or(config.default_diameter),
                        color: particle.color,
                    },
                )?;
            } else {
                report.hidden += 1;
            }
        }

        if !report.truncated {
            for entry in self.entries.values() {
                if entry.seen != self.pass {
                    backend.set_drawable(entry.figure, false)?;
                    report.stale += 1;
                }
            }
        }
        trace!(?report, "registry sync");
        Ok(report)
    }

    /// Releases every figure, e.g. when the display switches to another
    /// particle system.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_all(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        let ids: Vec<ParticleId> = self.entries.keys().collect();
        let mut released = 0;
        for id in ids {
            if self.on_particle_removed(id, backend)? {
                released += 1;
            }
        }
        Ok(released)
    }
}
