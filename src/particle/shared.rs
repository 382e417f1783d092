use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Particle, ParticleEvent, ParticleSet, ParticleSource};

/// A [`ParticleSet`] shared between a simulation thread and the render pass.
///
/// Each read through [`ParticleSource`] holds the lock only for that single
/// read. The simulation may insert or remove particles between two reads of
/// the same frame, so the render pass sees a list that can shrink mid-walk.
#[derive(Debug, Clone, Default)]
pub struct SharedParticles {
    inner: Arc<RwLock<ParticleSet>>,
}

impl SharedParticles {
    /// Wraps an existing set.
    #[must_use]
    pub fn new(set: ParticleSet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    /// Locks the set for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, ParticleSet> {
        self.inner.read()
    }

    /// Locks the set for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, ParticleSet> {
        self.inner.write()
    }
}

impl ParticleSource for SharedParticles {
    fn particle_count(&self) -> usize {
        self.inner.read().len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        self.inner.read().particle(index)
    }

    fn drain_events(&mut self) -> Vec<ParticleEvent> {
        self.inner.write().take_events()
    }
}
