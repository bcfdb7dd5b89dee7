//! Session state for the shape collection
//!
//! The catalog is the single writer of the stored collection. Every mutation
//! replaces the in-memory snapshot, writes the whole collection back through
//! the repository, and notifies subscribers with the new snapshot.

use std::fmt;
use std::sync::Arc;

use crate::shape::{clamp_name, ShapeDraft, ShapeId, ShapeRecord};
use crate::storage::{KeyValueStore, ShapeRepository};

/// Immutable view of the collection handed to renderers
pub type Snapshot = Arc<[ShapeRecord]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Snapshot)>;

pub struct Catalog<S> {
    repo: ShapeRepository<S>,
    shapes: Snapshot,
    expanded: Option<ShapeId>,
    last_issued: ShapeId,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> Catalog<S> {
    /// Load the stored collection into a new session
    pub fn load(store: S) -> Self {
        let repo = ShapeRepository::new(store);
        let shapes = repo.get_shapes();
        let last_issued = shapes.iter().map(|s| s.id).max().unwrap_or(0);
        log::info!("loaded {} shapes", shapes.len());

        Self {
            repo,
            shapes: shapes.into(),
            expanded: None,
            last_issued,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn shapes(&self) -> &[ShapeRecord] {
        &self.shapes
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.shapes)
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeRecord> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn repository(&self) -> &ShapeRepository<S> {
        &self.repo
    }

    /// Create a record from a validated draft.
    ///
    /// `now_ms` is the creation timestamp; the assigned id is bumped past
    /// every id this session has seen so ids stay strictly increasing and
    /// are never reused after a delete. Once `ShapeId::MAX` has been issued
    /// the lowest id not currently stored is used instead.
    pub fn create(&mut self, draft: ShapeDraft, now_ms: u64) -> ShapeRecord {
        let id = match self.last_issued.checked_add(1) {
            Some(next) => {
                let id = now_ms.max(next);
                self.last_issued = id;
                id
            }
            None => {
                let id = self.lowest_unused_id();
                log::warn!("shape ids exhausted, reusing free id {id}");
                id
            }
        };

        let record = ShapeRecord::new(id, clamp_name(&draft.name), draft.kind);
        let mut shapes = self.shapes.to_vec();
        shapes.push(record.clone());
        self.commit(shapes);

        log::debug!("created shape {} ({})", record.id, record.kind);
        record
    }

    fn lowest_unused_id(&self) -> ShapeId {
        let mut ids: Vec<ShapeId> = self.shapes.iter().map(|shape| shape.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.iter()
            .zip(0..)
            .find(|(id, expected)| **id != *expected)
            .map_or(ids.len() as ShapeId, |(_, expected)| expected)
    }

    /// Remove the record with `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: ShapeId) {
        if self.get(id).is_none() {
            log::debug!("remove: no shape with id {id}");
            return;
        }

        let shapes: Vec<ShapeRecord> = self
            .shapes
            .iter()
            .filter(|shape| shape.id != id)
            .cloned()
            .collect();
        if self.expanded == Some(id) {
            self.expanded = None;
        }
        self.commit(shapes);
        log::debug!("removed shape {id}");
    }

    /// Row currently expanded in the collapsed table layout
    pub fn expanded(&self) -> Option<ShapeId> {
        self.expanded
    }

    /// Expand `id`, or collapse it when it is already the expanded row
    pub fn toggle_expanded(&mut self, id: ShapeId) {
        self.expanded = if self.expanded == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    /// Register a callback invoked with every new snapshot
    pub fn subscribe(&mut self, callback: impl FnMut(&Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub, _)| *sub != id);
    }

    fn commit(&mut self, shapes: Vec<ShapeRecord>) {
        self.repo.save_shapes(&shapes);
        self.shapes = shapes.into();
        for (_, callback) in &mut self.subscribers {
            callback(&self.shapes);
        }
    }
}

impl<S> fmt::Debug for Catalog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("shapes", &self.shapes)
            .field("expanded", &self.expanded)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
