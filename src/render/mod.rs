mod store;

pub use store::FigureStore;

use crate::error::Result;
use crate::figure::{Figure, FigureId, FigureUpdate};
use crate::math::{Aabb, Vector3};

/// The rendering side of the engine.
///
/// A back end owns every figure it hands out. Handles are never reused for a
/// different figure, so a back end can always tell a stale handle from a live
/// one and report double release as an error.
pub trait RenderBackend {
    /// Adds a figure and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the figure is a bond whose endpoint figures do not
    /// exist.
    fn create_figure(&mut self, figure: Figure) -> Result<FigureId>;

    /// Applies a per-frame change to a figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the update does not match
    /// the figure's kind.
    fn update_figure(&mut self, id: FigureId, update: FigureUpdate) -> Result<()>;

    /// Shows or hides a figure without releasing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    fn set_drawable(&mut self, id: FigureId, drawable: bool) -> Result<()>;

    /// Returns `true` if the handle refers to a live figure.
    fn contains_figure(&self, id: FigureId) -> bool;

    /// Releases a figure.
    ///
    /// # Errors
    ///
    /// Returns an error if the figure was already released.
    fn destroy_figure(&mut self, id: FigureId) -> Result<()>;

    /// Replaces the translations at which the whole scene is repeated as
    /// periodic image shells. An empty slice disables shells.
    fn set_image_origins(&mut self, origins: &[Vector3]);

    /// Sets the extent the camera should frame.
    fn set_bounding_box(&mut self, aabb: Aabb);

    /// Signals that a frame's worth of changes is complete.
    fn refresh(&mut self);
}
