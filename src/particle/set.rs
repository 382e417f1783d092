use slotmap::SlotMap;

use crate::figure::Color;
use crate::math::Point3;

use super::{Particle, ParticleEvent, ParticleId, ParticleKind, ParticleSource};

/// State of a particle stored in a [`ParticleSet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleData {
    pub kind: ParticleKind,
    pub position: Point3,
    pub diameter: Option<f64>,
    pub color: Color,
}

impl ParticleData {
    /// A sphere of the given diameter.
    #[must_use]
    pub fn sphere(position: Point3, diameter: f64) -> Self {
        Self {
            kind: ParticleKind::Sphere,
            position,
            diameter: Some(diameter),
            color: Color::RED,
        }
    }

    /// Returns the data with a different kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ParticleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the data with a different color.
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    data: ParticleData,
    index: usize,
}

/// Producer-side particle list.
///
/// Particles are addressed by a stable [`ParticleId`] and also by a dense
/// index. Removal swaps the last particle into the freed index, the same way
/// simulation leaf lists compact themselves. Every insertion and removal is
/// recorded as a [`ParticleEvent`] until drained.
#[derive(Debug, Default)]
pub struct ParticleSet {
    slots: SlotMap<ParticleId, Slot>,
    order: Vec<ParticleId>,
    events: Vec<ParticleEvent>,
}

impl ParticleSet {
    /// Creates a new, empty particle set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the set holds no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds a particle at the end of the list and returns its ID.
    pub fn insert(&mut self, data: ParticleData) -> ParticleId {
        let index = self.order.len();
        let id = self.slots.insert(Slot { data, index });
        self.order.push(id);
        self.events.push(ParticleEvent::Added(snapshot(id, &data)));
        id
    }

    /// Removes a particle, returning its last state.
    pub fn remove(&mut self, id: ParticleId) -> Option<ParticleData> {
        let slot = self.slots.remove(id)?;
        self.order.swap_remove(slot.index);
        if let Some(&moved) = self.order.get(slot.index) {
            if let Some(moved_slot) = self.slots.get_mut(moved) {
                moved_slot.index = slot.index;
            }
        }
        self.events.push(ParticleEvent::Removed(id));
        Some(slot.data)
    }

    /// Returns a snapshot of the particle, if live.
    #[must_use]
    pub fn get(&self, id: ParticleId) -> Option<Particle> {
        self.slots.get(id).map(|slot| snapshot(id, &slot.data))
    }

    /// Returns the current index of the particle, if live.
    #[must_use]
    pub fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.slots.get(id).map(|slot| slot.index)
    }

    /// Returns a mutable reference to the particle's state, if live.
    pub fn data_mut(&mut self, id: ParticleId) -> Option<&mut ParticleData> {
        self.slots.get_mut(id).map(|slot| &mut slot.data)
    }

    /// Moves a particle. Returns `false` if it is not live.
    pub fn set_position(&mut self, id: ParticleId, position: Point3) -> bool {
        match self.data_mut(id) {
            Some(data) => {
                data.position = position;
                true
            }
            None => false,
        }
    }

    /// Iterates over particle IDs in index order.
    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.order.iter().copied()
    }

    /// Takes the membership changes recorded since the last call.
    pub fn take_events(&mut self) -> Vec<ParticleEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ParticleSource for ParticleSet {
    fn particle_count(&self) -> usize {
        self.len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        let id = *self.order.get(index)?;
        self.get(id)
    }

    fn drain_events(&mut self) -> Vec<ParticleEvent> {
        self.take_events()
    }
}

fn snapshot(id: ParticleId, data: &ParticleData) -> Particle {
    Particle {
        id,
        kind: data.kind,
        position: data.position,
        diameter: data.diameter,
        color: data.color,
    }
}
