use crate::error::Result;
use crate::figure::{Figure, FigureId};
use crate::render::RenderBackend;

/// Change applied by [`FigureSlots::resize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotDelta {
    /// Figures created to fill new slots.
    pub created: usize,
    /// Figures released from dropped slots.
    pub destroyed: usize,
}

/// An ordered set of reusable figure handles, indexed by slot.
///
/// Resizing only creates or releases the difference at the end, so figures
/// in surviving slots keep their handles from frame to frame and the caller
/// just overwrites their geometry.
#[derive(Debug, Default)]
pub struct FigureSlots {
    handles: Vec<FigureId>,
}

impl FigureSlots {
    /// Creates an empty slot set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Handle in slot `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<FigureId> {
        self.handles.get(index).copied()
    }

    /// Handles in slot order.
    #[must_use]
    pub fn handles(&self) -> &[FigureId] {
        &self.handles
    }

    /// Grows or shrinks to exactly `len` slots.
    ///
    /// New slots are filled with `make(slot_index)`. A slot is forgotten
    /// before its figure is released, so a failing release never leaves a
    /// dangling handle behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a creation or release.
    pub fn resize(
        &mut self,
        len: usize,
        backend: &mut dyn RenderBackend,
        mut make: impl FnMut(usize) -> Figure,
    ) -> Result<SlotDelta> {
        let mut delta = SlotDelta {
            created: 0,
            destroyed: self.truncate(len, backend)?,
        };
        while self.handles.len() < len {
            let id = backend.create_figure(make(self.handles.len()))?;
            self.handles.push(id);
            delta.created += 1;
        }
        Ok(delta)
    }

    /// Releases every figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_all(&mut self, backend: &mut dyn RenderBackend) -> Result<usize> {
        self.truncate(0, backend)
    }

    fn truncate(&mut self, len: usize, backend: &mut dyn RenderBackend) -> Result<usize> {
        let mut destroyed = 0;
        while self.handles.len() > len {
            if let Some(id) = self.handles.pop() {
                backend.destroy_figure(id)?;
                destroyed += 1;
            }
        }
        Ok(destroyed)
    }
}
