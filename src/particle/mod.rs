mod set;
mod shared;

pub use set::{ParticleData, ParticleSet};
pub use shared::SharedParticles;

use crate::figure::Color;
use crate::math::Point3;

slotmap::new_key_type! {
    /// Stable identity of a particle, independent of its index in the list.
    pub struct ParticleId;
}

/// Broad shape class of a particle's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticleKind {
    /// A plain sphere.
    #[default]
    Sphere,
    /// A sphere carrying an orientation.
    Oriented,
    /// A wall or other extended object.
    Wall,
    /// Anything else.
    Other,
}

impl ParticleKind {
    /// Returns `true` for kinds drawn as a ball figure.
    #[must_use]
    pub fn is_renderable(self) -> bool {
        matches!(self, Self::Sphere | Self::Oriented)
    }
}

/// Read-only snapshot of one particle, as seen by the render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Stable identity.
    pub id: ParticleId,
    /// Shape class.
    pub kind: ParticleKind,
    /// Current position.
    pub position: Point3,
    /// Diameter, or `None` when the particle's type does not define one.
    pub diameter: Option<f64>,
    /// Display color.
    pub color: Color,
}

/// Membership change of the particle list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleEvent {
    /// A particle joined; carries its state at insertion time.
    Added(Particle),
    /// A particle left.
    Removed(ParticleId),
}

/// An enumerable, indexable list of live particles.
///
/// Indices are not stable: removing a particle may move another one into its
/// slot. Readers must treat a `None` from [`particle`](Self::particle) at an
/// index below a previously observed count as "the list shrank", not as an
/// error.
pub trait ParticleSource {
    /// Number of live particles right now.
    fn particle_count(&self) -> usize;

    /// Snapshot of the particle at `index`, or `None` if out of range.
    fn particle(&self, index: usize) -> Option<Particle>;

    /// Takes the membership changes recorded since the last call.
    fn drain_events(&mut self) -> Vec<ParticleEvent> {
        Vec::new()
    }
}

impl ParticleSource for [Particle] {
    fn particle_count(&self) -> usize {
        self.len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        self.get(index).copied()
    }
}

impl ParticleSource for Vec<Particle> {
    fn particle_count(&self) -> usize {
        self.len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        self.get(index).copied()
    }
}
