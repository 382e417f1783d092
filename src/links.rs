use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, trace};

use crate::error::{FigureError, LinkError, Result};
use crate::figure::{Color, Figure, FigureId};
use crate::particle::ParticleId;
use crate::registry::FigureRegistry;
use crate::render::RenderBackend;

slotmap::new_key_type! {
    /// Handle to a link request waiting for its endpoint figures.
    pub struct PendingLinkId;
}

/// How a link is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkKind {
    /// Default bond appearance.
    #[default]
    Plain,
    /// Bond drawn in a fixed color.
    Colored(Color),
}

impl LinkKind {
    fn color(self) -> Color {
        match self {
            Self::Plain => Color::default(),
            Self::Colored(color) => color,
        }
    }
}

/// A requested link between two particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingLink {
    pub a: ParticleId,
    pub b: ParticleId,
    pub kind: LinkKind,
}

impl PendingLink {
    /// Creates a link request.
    #[must_use]
    pub fn new(a: ParticleId, b: ParticleId, kind: LinkKind) -> Self {
        Self { a, b, kind }
    }

    /// Endpoint order does not matter for identity.
    fn key(self) -> Self {
        if self.b < self.a {
            Self {
                a: self.b,
                b: self.a,
                kind: self.kind,
            }
        } else {
            self
        }
    }

    fn involves(&self, id: ParticleId) -> bool {
        self.a == id || self.b == id
    }
}

/// Outcome of [`PendingLinkQueue::request_link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRequest {
    /// Both endpoints were drawn; the link figure exists.
    Created(FigureId),
    /// At least one endpoint has no figure yet; retried on every flush.
    Queued(PendingLinkId),
}

/// Link (bond) figures, including requests made before their endpoints
/// were ever drawn.
///
/// A request stays queued until both endpoint particles have figures or the
/// caller cancels it; nothing is dropped silently. At most one figure exists
/// per particle pair and link kind.
#[derive(Debug, Default)]
pub struct PendingLinkQueue {
    pending: SlotMap<PendingLinkId, PendingLink>,
    order: Vec<PendingLinkId>,
    queued: HashMap<PendingLink, PendingLinkId>,
    links: HashMap<PendingLink, FigureId>,
    owners: SecondaryMap<FigureId, PendingLink>,
}

impl PendingLinkQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests still waiting.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of live link figures.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The waiting request behind a handle.
    #[must_use]
    pub fn pending(&self, id: PendingLinkId) -> Option<&PendingLink> {
        self.pending.get(id)
    }

    /// Figure of an existing link, if any.
    #[must_use]
    pub fn link_figure(&self, a: ParticleId, b: ParticleId, kind: LinkKind) -> Option<FigureId> {
        self.links.get(&PendingLink::new(a, b, kind).key()).copied()
    }

    /// Requests a link figure between two particles.
    ///
    /// If both particles already have figures the link is created at once.
    /// Otherwise the request is queued; asking again for a queued or existing
    /// link returns the same handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects the link figure.
    pub fn request_link(
        &mut self,
        a: ParticleId,
        b: ParticleId,
        kind: LinkKind,
        registry: &FigureRegistry,
        backend: &mut dyn RenderBackend,
    ) -> Result<LinkRequest> {
        let link = PendingLink::new(a, b, kind).key();
        if let Some(&figure) = self.links.get(&link) {
            return Ok(LinkRequest::Created(figure));
        }
        if let Some(&id) = self.queued.get(&link) {
            return Ok(LinkRequest::Queued(id));
        }
        if let Some(figure) = self.materialize(link, registry, backend)? {
            return Ok(LinkRequest::Created(figure));
        }
        debug!(?a, ?b, "link endpoint not drawn yet, queueing");
        let id = self.pending.insert(link);
        self.order.push(id);
        self.queued.insert(link, id);
        Ok(LinkRequest::Queued(id))
    }

    /// Retries every queued request once, in request order.
    ///
    /// Returns the requests that became figures this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a link figure. Requests not
    /// yet attempted stay queued.
    pub fn flush(
        &mut self,
        registry: &FigureRegistry,
        backend: &mut dyn RenderBackend,
    ) -> Result<Vec<(PendingLinkId, FigureId)>> {
        let mut created = Vec::new();
        if self.order.is_empty() {
            return Ok(created);
        }
        let order = std::mem::take(&mut self.order);
        let mut rest = order.iter().copied();
        let mut failure = None;

        for id in rest.by_ref() {
            let Some(&link) = self.pending.get(id) else {
                continue;
            };
            match self.materialize(link, registry, backend) {
                Ok(Some(figure)) => {
                    self.pending.remove(id);
                    self.queued.remove(&link);
                    created.push((id, figure));
                }
                Ok(None) => self.order.push(id),
                Err(err) => {
                    self.order.push(id);
                    failure = Some(err);
                    break;
                }
            }
        }
        self.order.extend(rest);
        if let Some(err) = failure {
            return Err(err);
        }
        if !created.is_empty() {
            trace!(created = created.len(), waiting = self.pending.len(), "flushed pending links");
        }
        Ok(created)
    }

    /// Withdraws a queued request. Returns `false` if it was not queued.
    pub fn cancel(&mut self, id: PendingLinkId) -> bool {
        let Some(link) = self.pending.remove(id) else {
            return false;
        };
        self.queued.remove(&link);
        self.order.retain(|&queued| queued != id);
        true
    }

    /// Releases a link figure returned by this queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the link was already released, or if the handle
    /// belongs to a figure that is not a link.
    pub fn release_link(&mut self, figure: FigureId, backend: &mut dyn RenderBackend) -> Result<()> {
        let Some(link) = self.owners.remove(figure) else {
            return Err(if backend.contains_figure(figure) {
                LinkError::NotALink(figure).into()
            } else {
                FigureError::AlreadyReleased(figure).into()
            });
        };
        self.links.remove(&link);
        backend.destroy_figure(figure)
    }

    /// Releases every link figure attached to a particle.
    ///
    /// Queued requests involving the particle are left for the caller to
    /// cancel.
    ///
    /// # Errors
    ///
    /// Returns an error if the back end rejects a release.
    pub fn release_links_of(
        &mut self,
        particle: ParticleId,
        backend: &mut dyn RenderBackend,
    ) -> Result<usize> {
        let figures: Vec<FigureId> = self
            .links
            .iter()
            .filter(|(link, _)| link.involves(particle))
            .map(|(_, &figure)| figure)
            .collect();
        for &figure in &figures {
            self.release_link(figure, backend)?;
        }
        Ok(figures.len())
    }

    fn materialize(
        &mut self,
        link: PendingLink,
        registry: &FigureRegistry,
        backend: &mut dyn RenderBackend,
    ) -> Result<Option<FigureId>> {
        let (Some(fa), Some(fb)) = (registry.current_figure(link.a), registry.current_figure(link.b))
        else {
            return Ok(None);
        };
        let figure = backend.create_figure(Figure::bond(fa, fb, link.kind.color()))?;
        self.links.insert(link, figure);
        self.owners.insert(figure, link);
        Ok(Some(figure))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::error::SceneError;
    use crate::figure::{FigureKind, FigureShape};
    use crate::math::Point3;
    use crate::particle::{ParticleData, ParticleSet};
    use crate::render::FigureStore;

    struct Fixture {
        set: ParticleSet,
        ids: Vec<ParticleId>,
        store: FigureStore,
        registry: FigureRegistry,
        queue: PendingLinkQueue,
    }

    impl Fixture {
        fn new(n: u32) -> Self {
            let mut set = ParticleSet::new();
            let ids = (0..n)
                .map(|i| set.insert(ParticleData::sphere(Point3::new(f64::from(i), 0.0, 0.0), 1.0)))
                .collect();
            Self {
                set,
                ids,
                store: FigureStore::new(),
                registry: FigureRegistry::new(),
                queue: PendingLinkQueue::new(),
            }
        }

        fn draw(&mut self, index: usize) {
            let particle = self.set.get(self.ids[index]).unwrap();
            self.registry
                .on_particle_added(&particle, true, &SceneConfig::default(), &mut self.store)
                .unwrap();
        }

        fn request(&mut self, a: usize, b: usize, kind: LinkKind) -> LinkRequest {
            self.queue
                .request_link(self.ids[a], self.ids[b], kind, &self.registry, &mut self.store)
                .unwrap()
        }

        fn flush(&mut self) -> Vec<(PendingLinkId, FigureId)> {
            self.queue.flush(&self.registry, &mut self.store).unwrap()
        }
    }

    #[test]
    fn immediate_when_both_drawn() {
        let mut fx = Fixture::new(2);
        fx.draw(0);
        fx.draw(1);
        let LinkRequest::Created(figure) = fx.request(0, 1, LinkKind::Plain) else {
            panic!("expected an immediate link");
        };
        let shape = fx.store.figure(figure).unwrap().shape;
        let a = fx.registry.current_figure(fx.ids[0]).unwrap();
        let b = fx.registry.current_figure(fx.ids[1]).unwrap();
        assert_eq!(shape, FigureShape::Bond { a, b });
        assert_eq!(fx.queue.pending_len(), 0);
    }

    #[test]
    fn queued_until_endpoints_exist_then_flushed_once() {
        let mut fx = Fixture::new(2);
        let LinkRequest::Queued(pending) = fx.request(0, 1, LinkKind::Plain) else {
            panic!("expected the request to be queued");
        };
        assert_eq!(fx.store.count(FigureKind::Bond), 0);
        assert!(fx.flush().is_empty());
        assert_eq!(fx.queue.pending_len(), 1);

        fx.draw(0);
        assert!(fx.flush().is_empty());
        fx.draw(1);

        let created = fx.flush();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, pending);
        assert_eq!(fx.queue.pending_len(), 0);
        assert!(fx.flush().is_empty());
        assert_eq!(fx.store.count(FigureKind::Bond), 1);
    }

    #[test]
    fn duplicate_requests_share_handles() {
        let mut fx = Fixture::new(2);
        let first = fx.request(0, 1, LinkKind::Plain);
        let reversed = fx.request(1, 0, LinkKind::Plain);
        assert_eq!(first, reversed);
        assert_eq!(fx.queue.pending_len(), 1);

        let colored = fx.request(0, 1, LinkKind::Colored(Color::RED));
        assert_ne!(first, colored);
        assert_eq!(fx.queue.pending_len(), 2);

        fx.draw(0);
        fx.draw(1);
        assert_eq!(fx.flush().len(), 2);
        let figure = fx.queue.link_figure(fx.ids[1], fx.ids[0], LinkKind::Plain).unwrap();
        assert_eq!(fx.request(0, 1, LinkKind::Plain), LinkRequest::Created(figure));
        assert_eq!(fx.store.count(FigureKind::Bond), 2);
    }

    #[test]
    fn cancel_removes_request() {
        let mut fx = Fixture::new(2);
        let LinkRequest::Queued(pending) = fx.request(0, 1, LinkKind::Plain) else {
            panic!("expected the request to be queued");
        };
        assert!(fx.queue.cancel(pending));
        assert!(!fx.queue.cancel(pending));
        fx.draw(0);
        fx.draw(1);
        assert!(fx.flush().is_empty());
        assert_eq!(fx.store.count(FigureKind::Bond), 0);
    }

    #[test]
    fn released_link_cannot_be_released_again() {
        let mut fx = Fixture::new(2);
        fx.draw(0);
        fx.draw(1);
        let LinkRequest::Created(figure) = fx.request(0, 1, LinkKind::Plain) else {
            panic!("expected an immediate link");
        };
        fx.queue.release_link(figure, &mut fx.store).unwrap();
        assert_eq!(fx.queue.link_count(), 0);

        let err = fx.queue.release_link(figure, &mut fx.store).unwrap_err();
        assert!(matches!(err, SceneError::Figure(FigureError::AlreadyReleased(_))));
    }

    #[test]
    fn releasing_a_ball_as_link_is_rejected() {
        let mut fx = Fixture::new(1);
        fx.draw(0);
        let ball = fx.registry.current_figure(fx.ids[0]).unwrap();
        let err = fx.queue.release_link(ball, &mut fx.store).unwrap_err();
        assert!(matches!(err, SceneError::Link(LinkError::NotALink(_))));
        assert!(fx.store.contains(ball));
    }

    #[test]
    fn endpoint_released_behind_registry_is_fatal() {
        let mut fx = Fixture::new(2);
        fx.draw(0);
        fx.draw(1);
        let ball = fx.registry.current_figure(fx.ids[1]).unwrap();
        fx.store.destroy_figure(ball).unwrap();

        let err = fx
            .queue
            .request_link(fx.ids[0], fx.ids[1], LinkKind::Plain, &fx.registry, &mut fx.store)
            .unwrap_err();
        assert!(matches!(err, SceneError::Figure(FigureError::MissingEndpoint(id)) if id == ball));
    }

    #[test]
    fn release_links_of_particle() {
        let mut fx = Fixture::new(3);
        for i in 0..3 {
            fx.draw(i);
        }
        fx.request(0, 1, LinkKind::Plain);
        fx.request(1, 2, LinkKind::Plain);
        fx.request(0, 2, LinkKind::Plain);

        let released = fx.queue.release_links_of(fx.ids[1], &mut fx.store).unwrap();
        assert_eq!(released, 2);
        assert_eq!(fx.queue.link_count(), 1);
        assert_eq!(fx.store.count(FigureKind::Bond), 1);
    }
}
