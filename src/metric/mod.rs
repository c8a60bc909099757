//! Distance metric: the proximity index kept in lockstep with graph
//! vertices.
//!
//! [`DistanceMetric::add_point`] and [`DistanceMetric::remove_point`] are
//! the only ways an entry enters or leaves the index. Each vertex holds at
//! most one [`ProxHandle`] back into the metric's entry arena, and every
//! entry records its owning [`VertexId`]. When the graph renumbers a
//! vertex, [`DistanceMetric::relocate`] keeps that back-reference current.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::arena::Arena;
use crate::error::{Result, SenderoError};
use crate::model::Node;
use crate::proximity::{IndexView, NavigableIndex, Neighbor, ProxEntry, ProximityIndex};
use crate::space::{distance_fn, DistanceFn, PointSpace};
use crate::types::{Coords, ProxHandle, VertexId};


/// Default cap on `k` for [`DistanceMetric::multi_query`].
pub const DEFAULT_MAX_QUERY_WIDTH: usize = 2000;

/// A query hit resolved to its vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    /// Vertex owning the matched point.
    pub vertex: VertexId,
    /// Distance from the query point.
    pub distance: f64,
}

/// Result of [`DistanceMetric::radius_and_closest_query`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadiusResult {
    /// Every vertex within the radius, nearest first.
    pub within: Vec<Nearest>,
    /// Globally closest vertex, set only when `within` is empty and the
    /// index is not.
    pub closest: Option<Nearest>,
}

impl RadiusResult {
    /// `within`, or the fallback alone when nothing was in range.
    pub fn vertices(&self) -> Vec<VertexId> {
        if self.within.is_empty() {
            self.closest.iter().map(|n| n.vertex).collect()
        } else {
            self.within.iter().map(|n| n.vertex).collect()
        }
    }
}

/// Result of [`DistanceMetric::radius_and_k_closest`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProximityReport {
    /// Every vertex within the radius, nearest first.
    pub within: Vec<Nearest>,
    /// The `k` closest vertices regardless of radius, nearest first.
    pub closest: Vec<Nearest>,
}

/// Proximity index plus the entry arena it indexes.
pub struct DistanceMetric<I = NavigableIndex> {
    index: I,
    entries: Arena<ProxEntry>,
    distance: DistanceFn,
    space: Option<Arc<dyn PointSpace>>,
    max_query_width: usize,
}

impl<I: ProximityIndex> DistanceMetric<I> {
    /// Creates a metric over `index` measuring with `distance`. Points are
    /// read through a space linked later with [`DistanceMetric::link_space`].
    pub fn new(index: I, distance: DistanceFn) -> Self {
        Self {
            index,
            entries: Arena::new(),
            distance,
            space: None,
            max_query_width: DEFAULT_MAX_QUERY_WIDTH,
        }
    }

    /// Creates a metric reading points from `space` and measuring with the
    /// space's own distance.
    pub fn with_space(index: I, space: Arc<dyn PointSpace>) -> Self {
        let distance = distance_fn(&space);
        let mut metric = Self::new(index, distance);
        metric.space = Some(space);
        metric
    }

    /// Overrides the largest `k` accepted by [`DistanceMetric::multi_query`].
    pub fn with_max_query_width(mut self, width: usize) -> Self {
        self.max_query_width = width;
        self
    }

    /// Largest `k` accepted by [`DistanceMetric::multi_query`].
    pub fn max_query_width(&self) -> usize {
        self.max_query_width
    }

    /// Binds the space points are read from. Refused (returns `false`) when
    /// entries exist. The space's distance replaces the current one.
    pub fn link_space(&mut self, space: Arc<dyn PointSpace>) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.distance = distance_fn(&space);
        self.space = Some(space);
        true
    }

    /// Replaces the distance function. Refused when entries exist.
    pub fn set_distance(&mut self, distance: DistanceFn) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.distance = distance;
        true
    }

    /// The injected distance function.
    pub fn distance_function(&self) -> &DistanceFn {
        &self.distance
    }

    /// The underlying index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Alias of [`DistanceMetric::len`].
    pub fn point_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no point is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry.
    pub fn entry(&self, handle: ProxHandle) -> Option<&ProxEntry> {
        self.entries.get(handle.0)
    }

    /// Returns `true` when `node` holds a live entry of this metric.
    pub fn is_registered<N>(&self, node: &Node<N>) -> bool {
        node.prox.is_some_and(|h| self.entries.contains(h.0))
    }

    fn view(&self) -> IndexView<'_> {
        IndexView::new(&self.entries, &self.distance)
    }

    fn resolve(&self, n: Neighbor) -> Option<Nearest> {
        let entry = self.entries.get(n.handle.0)?;
        Some(Nearest {
            vertex: entry.vertex,
            distance: n.distance,
        })
    }

    fn coords_of<N>(&self, node: &Node<N>) -> Result<Coords> {
        let space = self.space.as_ref().ok_or(SenderoError::SpaceNotLinked)?;
        let point = node.point.ok_or_else(|| {
            SenderoError::InvalidArgument(format!("vertex {} has no point", node.node_id))
        })?;
        space.read_point(point).ok_or(SenderoError::NotFound("point"))
    }

    /// Drops the entry behind `handle`, if it is still live.
    fn release(&mut self, handle: ProxHandle) -> bool {
        if !self.entries.contains(handle.0) {
            return false;
        }
        let view = IndexView::new(&self.entries, &self.distance);
        self.index.remove(view, handle);
        self.entries.remove(handle.0).is_some()
    }

    /// Registers `node`'s point and returns the new point count.
    ///
    /// An entry `node` already holds is released first, so re-adding never
    /// leaks or double counts.
    pub fn add_point<N>(&mut self, node: &mut Node<N>) -> Result<usize> {
        let coords = self.coords_of(&*node)?;
        if let Some(stale) = node.prox.take() {
            self.release(stale);
        }
        let handle = ProxHandle(self.entries.insert(ProxEntry {
            vertex: node.node_id,
            coords,
        }));
        let view = IndexView::new(&self.entries, &self.distance);
        self.index.insert(view, handle);
        node.prox = Some(handle);
        trace!(vertex = %node.node_id, entry = %handle, "metric.add_point");
        Ok(self.entries.len())
    }

    /// Registers many vertices at once and returns the new point count.
    ///
    /// Every node is validated before anything changes, and the index
    /// receives the whole batch in one call. The count accumulates: it is
    /// the number of live entries, not the batch size.
    pub fn add_points<'a, N: 'a>(
        &mut self,
        nodes: impl IntoIterator<Item = &'a mut Node<N>>,
    ) -> Result<usize> {
        let nodes: Vec<&'a mut Node<N>> = nodes.into_iter().collect();
        let coords = nodes
            .iter()
            .map(|node| self.coords_of(&**node))
            .collect::<Result<Vec<_>>>()?;

        let mut handles = Vec::with_capacity(nodes.len());
        for (node, coords) in nodes.into_iter().zip(coords) {
            if let Some(stale) = node.prox.take() {
                self.release(stale);
            }
            let handle = ProxHandle(self.entries.insert(ProxEntry {
                vertex: node.node_id,
                coords,
            }));
            node.prox = Some(handle);
            handles.push(handle);
        }
        let view = IndexView::new(&self.entries, &self.distance);
        self.index.insert_batch(view, &handles);
        debug!(
            batch = handles.len(),
            points = self.entries.len(),
            index = self.index.name(),
            "metric.add_points"
        );
        Ok(self.entries.len())
    }

    /// Unregisters `node`. Returns `false` if it held no live entry. The
    /// back-reference is cleared either way.
    pub fn remove_point<N>(&mut self, node: &mut Node<N>) -> bool {
        let Some(handle) = node.prox.take() else {
            return false;
        };
        let removed = self.release(handle);
        trace!(vertex = %node.node_id, removed, "metric.remove_point");
        removed
    }

    /// Points the entry behind `handle` at `vertex` after the graph moved
    /// its owner. Returns `false` for a stale handle.
    pub fn relocate(&mut self, handle: ProxHandle, vertex: VertexId) -> bool {
        match self.entries.get_mut(handle.0) {
            Some(entry) => {
                entry.vertex = vertex;
                true
            }
            None => false,
        }
    }

    /// Closest registered vertex to `query`.
    pub fn single_query(&self, query: &[f64]) -> Result<Nearest> {
        if self.entries.is_empty() {
            return Err(SenderoError::EmptyIndex);
        }
        self.index
            .nearest(self.view(), query)
            .and_then(|n| self.resolve(n))
            .ok_or(SenderoError::Corruption("index lost a live entry"))
    }

    /// Up to `k` closest vertices, nearest first.
    pub fn multi_query(&self, query: &[f64], k: usize) -> Result<Vec<VertexId>> {
        Ok(self
            .multi_query_with_distances(query, k)?
            .into_iter()
            .map(|n| n.vertex)
            .collect())
    }

    /// Like [`DistanceMetric::multi_query`], keeping the distances.
    ///
    /// `k == 0` returns nothing without consulting the index. `k` above
    /// [`DistanceMetric::max_query_width`] is rejected.
    pub fn multi_query_with_distances(&self, query: &[f64], k: usize) -> Result<Vec<Nearest>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if k > self.max_query_width {
            return Err(SenderoError::QueryWidthExceeded {
                requested: k,
                max: self.max_query_width,
            });
        }
        Ok(self
            .index
            .k_nearest(self.view(), query, k)
            .into_iter()
            .filter_map(|n| self.resolve(n))
            .collect())
    }

    /// Every vertex within `radius` of `query` (inclusive), nearest first.
    /// The result is never truncated.
    pub fn radius_query(&self, query: &[f64], radius: f64) -> Result<Vec<Nearest>> {
        check_radius(radius)?;
        Ok(self
            .index
            .within_radius(self.view(), query, radius)
            .into_iter()
            .filter_map(|n| self.resolve(n))
            .collect())
    }

    /// [`DistanceMetric::radius_query`], falling back to the closest vertex
    /// when nothing lies within `radius`.
    pub fn radius_and_closest_query(&self, query: &[f64], radius: f64) -> Result<RadiusResult> {
        let within = self.radius_query(query, radius)?;
        let closest = if within.is_empty() && !self.entries.is_empty() {
            Some(self.single_query(query)?)
        } else {
            None
        };
        Ok(RadiusResult { within, closest })
    }

    /// Fills `out` with the vertices within `radius`, or with the single
    /// closest vertex when none are. Returns how many were written.
    pub fn radius_or_closest_into(
        &self,
        query: &[f64],
        radius: f64,
        out: &mut Vec<Nearest>,
    ) -> Result<usize> {
        out.clear();
        let result = self.radius_and_closest_query(query, radius)?;
        out.extend(result.within);
        out.extend(result.closest);
        Ok(out.len())
    }

    /// Radius hits and the `k` closest vertices in one call.
    pub fn radius_and_k_closest(
        &self,
        query: &[f64],
        radius: f64,
        k: usize,
    ) -> Result<ProximityReport> {
        Ok(ProximityReport {
            within: self.radius_query(query, radius)?,
            closest: self.multi_query_with_distances(query, k)?,
        })
    }

    /// Forgets every entry. Handles held by vertices go stale; the index is
    /// reused as is.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.index.clear();
        debug!(points = dropped, "metric.clear");
    }
}

fn check_radius(radius: f64) -> Result<()> {
    if radius.is_nan() || radius < 0.0 {
        return Err(SenderoError::InvalidArgument(format!(
            "radius must be a non-negative number, got {radius}"
        )));
    }
    Ok(())
}
