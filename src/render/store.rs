use slotmap::{Key, SlotMap};

use crate::error::{FigureError, Result};
use crate::figure::{Figure, FigureId, FigureKind, FigureShape, FigureUpdate};
use crate::math::{Aabb, Vector3};

use super::RenderBackend;

/// In-memory back end that owns figures in a generational arena.
///
/// Handles are generational indices: once a figure is released its handle
/// never resolves again, even after the slot is reused.
#[derive(Debug, Default)]
pub struct FigureStore {
    figures: SlotMap<FigureId, Figure>,
    image_origins: Vec<Vector3>,
    bounding_box: Option<Aabb>,
    created: usize,
    destroyed: usize,
    refreshes: usize,
}

impl FigureStore {
    /// Creates a new, empty figure store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the figure behind a handle, if it is still live.
    #[must_use]
    pub fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.figures.get(id)
    }

    /// Returns `true` if the handle refers to a live figure.
    #[must_use]
    pub fn contains(&self, id: FigureId) -> bool {
        self.figures.contains_key(id)
    }

    /// Number of live figures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// Returns `true` if no figures are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Number of live figures of one kind.
    #[must_use]
    pub fn count(&self, kind: FigureKind) -> usize {
        self.figures.values().filter(|f| f.kind() == kind).count()
    }

    /// Iterates over live figures.
    pub fn iter(&self) -> impl Iterator<Item = (FigureId, &Figure)> {
        self.figures.iter()
    }

    /// Whether a figure would actually be drawn this frame.
    ///
    /// A bond is only drawn while both of its endpoint balls are live and
    /// drawable, so filtering a particle also hides its bonds.
    #[must_use]
    pub fn is_visible(&self, id: FigureId) -> bool {
        let Some(figure) = self.figures.get(id) else {
            return false;
        };
        if !figure.drawable {
            return false;
        }
        match figure.shape {
            FigureShape::Bond { a, b } => self.is_visible(a) && self.is_visible(b),
            _ => true,
        }
    }

    /// Total figures created over the store's lifetime.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created
    }

    /// Total figures released over the store's lifetime.
    #[must_use]
    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    /// Number of completed frames.
    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Image-shell translations last published.
    #[must_use]
    pub fn image_origins(&self) -> &[Vector3] {
        &self.image_origins
    }

    /// Bounding box last published.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounding_box
    }

    fn figure_mut(&mut self, id: FigureId) -> Result<&mut Figure> {
        self.figures
            .get_mut(id)
            .ok_or_else(|| FigureError::Unknown(id).into())
    }
}

impl RenderBackend for FigureStore {
    fn create_figure(&mut self, figure: Figure) -> Result<FigureId> {
        if let FigureShape::Bond { a, b } = figure.shape {
            for end in [a, b] {
                match self.figures.get(end) {
                    Some(f) if f.kind() == FigureKind::Ball => {}
                    _ => return Err(FigureError::MissingEndpoint(end).into()),
                }
            }
        }
        self.created += 1;
        Ok(self.figures.insert(figure))
    }

    fn update_figure(&mut self, id: FigureId, update: FigureUpdate) -> Result<()> {
        let figure = self.figure_mut(id)?;
        let kind = figure.kind();
        match (update, &mut figure.shape) {
            (FigureUpdate::Color(color), _) => figure.color = color,
            (
                FigureUpdate::Ball {
                    center: c,
                    diameter: d,
                    color,
                },
                FigureShape::Ball { center, diameter },
            ) => {
                *center = c;
                *diameter = d;
                figure.color = color;
            }
            (FigureUpdate::Line { start: s, end: e }, FigureShape::Line { start, end }) => {
                *start = s;
                *end = e;
            }
            (FigureUpdate::Triangle { vertices: v }, FigureShape::Triangle { vertices }) => {
                *vertices = v;
            }
            (update, _) => {
                return Err(FigureError::KindMismatch {
                    figure: kind,
                    update: update.target_kind().unwrap_or(kind),
                }
                .into())
            }
        }
        Ok(())
    }

    fn set_drawable(&mut self, id: FigureId, drawable: bool) -> Result<()> {
        self.figure_mut(id)?.drawable = drawable;
        Ok(())
    }

    fn contains_figure(&self, id: FigureId) -> bool {
        self.contains(id)
    }

    fn destroy_figure(&mut self, id: FigureId) -> Result<()> {
        if self.figures.remove(id).is_some() {
            self.destroyed += 1;
            return Ok(());
        }
        // Every non-null handle was issued by this store, so a miss means it
        // was released before.
        if id.is_null() {
            Err(FigureError::Unknown(id).into())
        } else {
            Err(FigureError::AlreadyReleased(id).into())
        }
    }

    fn set_image_origins(&mut self, origins: &[Vector3]) {
        self.image_origins.clear();
        self.image_origins.extend_from_slice(origins);
    }

    fn set_bounding_box(&mut self, aabb: Aabb) {
        self.bounding_box = Some(aabb);
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use crate::figure::Color;
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn ball(store: &mut FigureStore) -> FigureId {
        store
            .create_figure(Figure::ball(p(0.0, 0.0, 0.0), 1.0, Color::WHITE))
            .unwrap()
    }

    #[test]
    fn create_and_destroy() {
        let mut store = FigureStore::new();
        let id = ball(&mut store);
        assert!(store.contains(id));
        assert_eq!(store.count(FigureKind::Ball), 1);

        store.destroy_figure(id).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.created(), 1);
        assert_eq!(store.destroyed(), 1);
    }

    #[test]
    fn double_destroy_is_rejected() {
        let mut store = FigureStore::new();
        let id = ball(&mut store);
        store.destroy_figure(id).unwrap();

        let err = store.destroy_figure(id).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Figure(FigureError::AlreadyReleased(stale)) if stale == id
        ));
        assert_eq!(store.destroyed(), 1);
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut store = FigureStore::new();
        let old = ball(&mut store);
        store.destroy_figure(old).unwrap();
        let new = ball(&mut store);

        assert!(!store.contains(old));
        assert!(store.update_figure(old, FigureUpdate::Color(Color::RED)).is_err());
        assert!(store.contains(new));
    }

    #[test]
    fn null_handle_is_unknown() {
        let mut store = FigureStore::new();
        let err = store.destroy_figure(FigureId::null()).unwrap_err();
        assert!(matches!(err, SceneError::Figure(FigureError::Unknown(_))));
    }

    #[test]
    fn bond_requires_live_ball_endpoints() {
        let mut store = FigureStore::new();
        let a = ball(&mut store);
        let b = ball(&mut store);
        store.destroy_figure(b).unwrap();

        let err = store.create_figure(Figure::bond(a, b, Color::WHITE)).unwrap_err();
        assert!(matches!(err, SceneError::Figure(FigureError::MissingEndpoint(id)) if id == b));
    }

    #[test]
    fn update_kind_mismatch() {
        let mut store = FigureStore::new();
        let id = ball(&mut store);
        let err = store
            .update_figure(id, FigureUpdate::Line { start: p(0.0, 0.0, 0.0), end: p(1.0, 0.0, 0.0) })
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::Figure(FigureError::KindMismatch {
                figure: FigureKind::Ball,
                update: FigureKind::Line
            })
        ));
    }

    #[test]
    fn ball_update_moves_and_recolors() {
        let mut store = FigureStore::new();
        let id = ball(&mut store);
        store
            .update_figure(
                id,
                FigureUpdate::Ball { center: p(1.0, 2.0, 3.0), diameter: 2.5, color: Color::RED },
            )
            .unwrap();
        let f = store.figure(id).unwrap();
        assert_eq!(f.shape, FigureShape::Ball { center: p(1.0, 2.0, 3.0), diameter: 2.5 });
        assert_eq!(f.color, Color::RED);
    }

    #[test]
    fn hidden_endpoint_hides_bond() {
        let mut store = FigureStore::new();
        let a = ball(&mut store);
        let b = ball(&mut store);
        let bond = store.create_figure(Figure::bond(a, b, Color::WHITE)).unwrap();
        assert!(store.is_visible(bond));

        store.set_drawable(b, false).unwrap();
        assert!(!store.is_visible(bond));
        assert!(store.figure(bond).unwrap().drawable);

        store.set_drawable(b, true).unwrap();
        store.destroy_figure(a).unwrap();
        assert!(!store.is_visible(bond));
    }
}
