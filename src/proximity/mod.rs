//! Spatial indexes answering nearest-neighbor queries over proximity
//! entries.
//!
//! Entries are owned by the [`crate::metric::DistanceMetric`] in a
//! generational arena; an index only stores [`ProxHandle`]s and reads
//! coordinates back through an [`IndexView`]. Any implementation of
//! [`ProximityIndex`] can back a metric.

use std::cmp::Ordering;

use crate::arena::Arena;
use crate::space::DistanceFn;
use crate::types::{Coords, ProxHandle, VertexId};

mod linear;
mod navigable;

pub use linear::LinearIndex;
pub use navigable::{NavigableIndex, NavigableParams};

/// A registered point and the vertex that owns it.
///
/// The coordinates are copied at registration. [`crate::graph::Graph`]
/// refuses to rebind the point of a registered vertex; moving one goes
/// through [`crate::roadmap::Roadmap::move_configuration`], or through
/// `remove_point`, rebinding, and `add_point` on the metric. Writing a
/// registered point directly with
/// [`crate::space::PointSpace::write_point`] is not seen by the index.
#[derive(Clone, Debug)]
pub struct ProxEntry {
    /// Owning vertex. Updated when the vertex is renumbered.
    pub vertex: VertexId,
    /// Coordinates of the vertex when it was registered.
    pub coords: Coords,
}

/// Read access to the entry arena and distance function while an index
/// operation runs.
#[derive(Clone, Copy)]
pub struct IndexView<'a> {
    entries: &'a Arena<ProxEntry>,
    distance: &'a DistanceFn,
}

impl<'a> IndexView<'a> {
    /// Bundles the entry storage with the distance function.
    pub fn new(entries: &'a Arena<ProxEntry>, distance: &'a DistanceFn) -> Self {
        Self { entries, distance }
    }

    /// Looks up an entry.
    pub fn entry(&self, handle: ProxHandle) -> Option<&'a ProxEntry> {
        self.entries.get(handle.0)
    }

    /// Distance from `query` to the entry behind `handle`.
    pub fn distance_to(&self, handle: ProxHandle, query: &[f64]) -> Option<f64> {
        let entry = self.entry(handle)?;
        Some((self.distance)(query, &entry.coords))
    }

    /// Distance between two entries.
    pub fn distance_between(&self, a: ProxHandle, b: ProxHandle) -> Option<f64> {
        let a = self.entry(a)?;
        let b = self.entry(b)?;
        Some((self.distance)(&a.coords, &b.coords))
    }
}

/// One query result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Entry that matched.
    pub handle: ProxHandle,
    /// Distance from the query point.
    pub distance: f64,
}

/// Max-heap ordering on distance, ties broken by slot for determinism.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Scored(pub(crate) Neighbor);

impl Scored {
    fn key(&self) -> (f64, u32, u32) {
        let h = self.0.handle.0;
        (self.0.distance, h.index(), h.generation())
    }
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        let (da, ia, ga) = self.key();
        let (db, ib, gb) = other.key();
        da.total_cmp(&db).then(ia.cmp(&ib)).then(ga.cmp(&gb))
    }
}

/// Sorts results by ascending distance.
pub(crate) fn sort_neighbors(results: &mut [Neighbor]) {
    results.sort_by(|a, b| Scored(*a).cmp(&Scored(*b)));
}

/// Nearest-neighbor structure over proximity entries.
///
/// The entry behind a handle is live in the view for the whole duration of
/// `insert` and `remove`.
pub trait ProximityIndex: Send {
    /// Short name used in logs and the CLI.
    fn name(&self) -> &'static str;

    /// Adds one entry.
    fn insert(&mut self, view: IndexView<'_>, handle: ProxHandle);

    /// Adds many entries. Implementations with a structure-wide build step
    /// pay it once here.
    fn insert_batch(&mut self, view: IndexView<'_>, handles: &[ProxHandle]) {
        for &handle in handles {
            self.insert(view, handle);
        }
    }

    /// Drops one entry. Unknown handles are ignored.
    fn remove(&mut self, view: IndexView<'_>, handle: ProxHandle);

    /// Up to `k` entries closest to `query`, ascending by distance.
    fn k_nearest(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor>;

    /// Closest entry to `query`.
    fn nearest(&self, view: IndexView<'_>, query: &[f64]) -> Option<Neighbor> {
        self.k_nearest(view, query, 1).into_iter().next()
    }

    /// Every entry within `radius` of `query` (inclusive), ascending by
    /// distance.
    fn within_radius(&self, view: IndexView<'_>, query: &[f64], radius: f64) -> Vec<Neighbor>;

    /// Forgets every entry. The index stays usable.
    fn clear(&mut self);

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Returns `true` when nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I: ProximityIndex + ?Sized> ProximityIndex for Box<I> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn insert(&mut self, view: IndexView<'_>, handle: ProxHandle) {
        (**self).insert(view, handle)
    }

    fn insert_batch(&mut self, view: IndexView<'_>, handles: &[ProxHandle]) {
        (**self).insert_batch(view, handles)
    }

    fn remove(&mut self, view: IndexView<'_>, handle: ProxHandle) {
        (**self).remove(view, handle)
    }

    fn k_nearest(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor> {
        (**self).k_nearest(view, query, k)
    }

    fn nearest(&self, view: IndexView<'_>, query: &[f64]) -> Option<Neighbor> {
        (**self).nearest(view, query)
    }

    fn within_radius(&self, view: IndexView<'_>, query: &[f64], radius: f64) -> Vec<Neighbor> {
        (**self).within_radius(view, query, radius)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
