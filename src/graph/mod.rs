//! Roadmap graph storage.
//!
//! Vertices and edges live in slot vectors whose index is the element's id.
//! Parallel property maps (weight, distance, predecessor, color, component)
//! are indexed by the same ids.
//!
//! Vertex ids stay dense: removing a vertex moves the last vertex into the
//! freed slot and reports that [`Relocation`]. Inside a bulk pass
//! ([`Graph::begin_bulk`]) removals leave holes instead, and
//! [`Graph::end_bulk`] compacts them. Edge ids are never renumbered
//! implicitly; call [`Graph::update_edge_ids`] after removals when dense
//! edge ids matter.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{Result, SenderoError};
use crate::model::{GraphDirection, Link, Node};
use crate::space::PointSpace;
use crate::types::{EdgeId, PointId, VertexId};

mod components;
mod props;
#[cfg(test)]
mod tests;

pub use props::Color;
use props::VertexProps;

/// Edge weight used when none is given. Never zero, so no edge is free.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1e-4;

/// A vertex that changed id because of a removal or compaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Relocation {
    /// Id before the move.
    pub from: VertexId,
    /// Id after the move.
    pub to: VertexId,
}

/// Result of removing a vertex.
#[derive(Debug)]
pub struct RemovedVertex<N> {
    /// The detached vertex. Its point has already been released.
    pub node: Node<N>,
    /// Vertex that took over the removed id, if any.
    pub relocated: Option<Relocation>,
}

/// Roadmap graph with typed vertex payload `N` and edge payload `E`.
pub struct Graph<N = (), E = ()> {
    direction: GraphDirection,
    vertices: Vec<Option<Node<N>>>,
    incident: Vec<SmallVec<[EdgeId; 8]>>,
    edges: Vec<Option<Link<E>>>,
    weights: Vec<f64>,
    props: VertexProps,
    vertex_count: usize,
    edge_count: usize,
    component_count: usize,
    bulk: bool,
    default_weight: f64,
    space: Option<Arc<dyn PointSpace>>,
    search_generation: u64,
}

impl<N: Default, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new(GraphDirection::Undirected)
    }
}

impl<N, E> Graph<N, E> {
    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns `true` when the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Direction fixed at construction.
    pub fn direction(&self) -> GraphDirection {
        self.direction
    }

    /// Weight given to edges added without an explicit weight.
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Point space bound to this graph.
    pub fn space(&self) -> Option<&Arc<dyn PointSpace>> {
        self.space.as_ref()
    }

    /// Binds the point space. Refused (returns `false`) when the graph is
    /// populated and already bound to a space.
    pub fn link_space(&mut self, space: Arc<dyn PointSpace>) -> bool {
        if self.vertex_count == 0 || self.space.is_none() {
            self.space = Some(space);
            true
        } else {
            warn!(
                vertices = self.vertex_count,
                "graph.link_space.refused_populated"
            );
            false
        }
    }

    /// Returns `true` while a bulk pass is active.
    pub fn is_bulk(&self) -> bool {
        self.bulk
    }

    /// Starts a bulk pass. Vertex removals leave holes until
    /// [`Graph::end_bulk`].
    pub fn begin_bulk(&mut self) {
        self.bulk = true;
    }

    /// Hands out the next search generation. Never repeats for this graph,
    /// including across [`Graph::clear`].
    pub(crate) fn next_search_generation(&mut self) -> u64 {
        self.search_generation += 1;
        self.search_generation
    }

    /// Returns `true` if `v` names a live vertex.
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        matches!(self.vertices.get(v.index()), Some(Some(_)))
    }

    /// Borrows a vertex.
    pub fn vertex(&self, v: VertexId) -> Option<&Node<N>> {
        self.vertices.get(v.index())?.as_ref()
    }

    /// Mutably borrows a vertex.
    pub fn vertex_mut(&mut self, v: VertexId) -> Option<&mut Node<N>> {
        self.vertices.get_mut(v.index())?.as_mut()
    }

    /// Iterates over live vertex ids in ascending order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId(i as u32))
    }

    /// Iterates over live vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Node<N>> + '_ {
        self.vertices.iter().flatten()
    }

    /// Iterates mutably over live vertices in id order.
    pub fn vertices_mut(&mut self) -> impl Iterator<Item = &mut Node<N>> + '_ {
        self.vertices.iter_mut().flatten()
    }

    /// One past the highest vertex slot in use. Equals
    /// [`Graph::vertex_count`] outside bulk mode.
    pub fn vertex_bound(&self) -> usize {
        self.vertices.len()
    }

    /// Edges touching `v`.
    pub fn incident_edges(&self, v: VertexId) -> &[EdgeId] {
        self.incident.get(v.index()).map_or(&[], |list| list.as_slice())
    }

    /// Reachable neighbors of `v` with the connecting edge. Directed graphs
    /// only follow outgoing edges.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = (VertexId, EdgeId)> + '_ {
        let directed = self.direction == GraphDirection::Directed;
        self.incident_edges(v).iter().filter_map(move |&e| {
            let link = self.edge(e)?;
            if directed {
                (link.source == v).then_some((link.target, e))
            } else {
                link.opposite(v).map(|u| (u, e))
            }
        })
    }

    /// Number of neighbors reported by [`Graph::neighbors`].
    pub fn degree(&self, v: VertexId) -> usize {
        self.neighbors(v).count()
    }

    /// Binds `point` to `v`, returning the point it replaces. The caller
    /// becomes responsible for the returned point.
    ///
    /// Refused while `v` holds a proximity handle: the index keeps its own
    /// copy of the coordinates, so unregister the vertex first and register
    /// it again afterwards.
    pub fn set_point(&mut self, v: VertexId, point: PointId) -> Result<Option<PointId>> {
        let node = self.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
        check_unregistered(node)?;
        Ok(node.point.replace(point))
    }

    /// Allocates a point holding `coords` from the linked space and binds it
    /// to `v`. A point previously bound to `v` is freed. Refused for
    /// registered vertices, like [`Graph::set_point`].
    pub fn alloc_point(&mut self, v: VertexId, coords: &[f64]) -> Result<PointId> {
        let space = self.space.clone().ok_or(SenderoError::SpaceNotLinked)?;
        let node = self.vertex(v).ok_or(SenderoError::NotFound("vertex"))?;
        check_unregistered(node)?;
        let point = space.alloc_with(coords)?;
        if let Some(previous) = self.set_point(v, point)? {
            space.free_point(previous);
        }
        Ok(point)
    }

    /// Coordinates of the point bound to `v`.
    pub fn coords(&self, v: VertexId) -> Option<crate::types::Coords> {
        let point = self.vertex(v)?.point?;
        self.space.as_ref()?.read_point(point)
    }

    /// Returns `true` if `e` names a live edge.
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        matches!(self.edges.get(e.index()), Some(Some(_)))
    }

    /// Borrows an edge.
    pub fn edge(&self, e: EdgeId) -> Option<&Link<E>> {
        self.edges.get(e.index())?.as_ref()
    }

    /// Mutably borrows an edge.
    pub fn edge_mut(&mut self, e: EdgeId) -> Option<&mut Link<E>> {
        self.edges.get_mut(e.index())?.as_mut()
    }

    /// Iterates over live edge ids in ascending order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EdgeId(i as u32))
    }

    /// Iterates over live edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Link<E>> + '_ {
        self.edges.iter().flatten()
    }

    /// Id of an edge from `from` to `to` (either orientation when
    /// undirected).
    pub fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        let directed = self.direction == GraphDirection::Directed;
        self.incident_edges(from).iter().copied().find(|&e| {
            self.edge(e).is_some_and(|link| {
                (link.source == from && link.target == to)
                    || (!directed && link.source == to && link.target == from)
            })
        })
    }

    /// Returns `true` if an edge connects `from` to `to`.
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// Borrows the edge connecting `from` to `to`.
    pub fn edge_between(&self, from: VertexId, to: VertexId) -> Option<&Link<E>> {
        self.find_edge(from, to).and_then(|e| self.edge(e))
    }

    /// Weight of `e`.
    pub fn get_weight(&self, e: EdgeId) -> Option<f64> {
        self.contains_edge(e).then(|| self.weights[e.index()])
    }

    /// Sets the weight of `e`.
    pub fn set_weight(&mut self, e: EdgeId, weight: f64) -> Result<()> {
        check_weight(weight)?;
        if !self.contains_edge(e) {
            return Err(SenderoError::NotFound("edge"));
        }
        self.weights[e.index()] = weight;
        Ok(())
    }

    /// Removes edge `e`. Absent edges are a no-op.
    pub fn remove_edge(&mut self, e: EdgeId) -> Option<Link<E>> {
        let link = self.edges.get_mut(e.index())?.take()?;
        self.detach_incident(link.source, e);
        if link.target != link.source {
            self.detach_incident(link.target, e);
        }
        self.edge_count -= 1;
        trace!(edge = %e, "graph.remove_edge");
        Some(link)
    }

    /// Removes the edge connecting `from` to `to`, if any.
    pub fn remove_edge_between(&mut self, from: VertexId, to: VertexId) -> Option<Link<E>> {
        let e = self.find_edge(from, to)?;
        self.remove_edge(e)
    }

    fn detach_incident(&mut self, v: VertexId, e: EdgeId) {
        if let Some(list) = self.incident.get_mut(v.index()) {
            if let Some(pos) = list.iter().position(|&x| x == e) {
                list.swap_remove(pos);
            }
        }
    }

    /// Renumbers live edges densely in their current order. Edge ids held
    /// by callers are invalidated.
    pub fn update_edge_ids(&mut self) {
        if self.edges.len() == self.edge_count {
            return;
        }
        let mut remap: Vec<Option<EdgeId>> = vec![None; self.edges.len()];
        let mut next = 0usize;
        for old in 0..self.edges.len() {
            let Some(mut link) = self.edges[old].take() else {
                continue;
            };
            let new_id = EdgeId(next as u32);
            link.edge_id = new_id;
            self.weights[next] = self.weights[old];
            self.edges[next] = Some(link);
            remap[old] = Some(new_id);
            next += 1;
        }
        self.edges.truncate(next);
        self.weights.truncate(next);
        for list in &mut self.incident {
            for e in list.iter_mut() {
                if let Some(new_id) = remap[e.index()] {
                    *e = new_id;
                }
            }
        }
        debug!(edges = next, "graph.update_edge_ids");
    }

    /// Removes every edge touching `v` and returns how many were removed.
    /// The vertex itself stays.
    pub fn clear_vertex(&mut self, v: VertexId) -> Result<usize> {
        if !self.contains_vertex(v) {
            return Err(SenderoError::NotFound("vertex"));
        }
        let touching: SmallVec<[EdgeId; 8]> = self.incident[v.index()].clone();
        let mut removed = 0;
        for e in touching {
            if self.remove_edge(e).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Distance map entry for `v`.
    pub fn distance(&self, v: VertexId) -> Option<f64> {
        self.contains_vertex(v).then(|| self.props.distance[v.index()])
    }

    /// Sets the distance map entry for `v`.
    pub fn set_distance(&mut self, v: VertexId, value: f64) -> Result<()> {
        self.require_vertex(v)?;
        self.props.distance[v.index()] = value;
        Ok(())
    }

    /// Predecessor map entry for `v`.
    pub fn predecessor(&self, v: VertexId) -> Option<VertexId> {
        if !self.contains_vertex(v) {
            return None;
        }
        self.props.predecessor[v.index()]
    }

    /// Sets the predecessor map entry for `v`.
    pub fn set_predecessor(&mut self, v: VertexId, pred: Option<VertexId>) -> Result<()> {
        self.require_vertex(v)?;
        self.props.predecessor[v.index()] = pred;
        Ok(())
    }

    /// Color map entry for `v`.
    pub fn color(&self, v: VertexId) -> Option<Color> {
        self.contains_vertex(v).then(|| self.props.color[v.index()])
    }

    /// Sets the color map entry for `v`.
    pub fn set_color(&mut self, v: VertexId, color: Color) -> Result<()> {
        self.require_vertex(v)?;
        self.props.color[v.index()] = color;
        Ok(())
    }

    /// Component label from the last [`Graph::update_components`] call.
    /// `None` for vertices added since.
    pub fn component(&self, v: VertexId) -> Option<u32> {
        if !self.contains_vertex(v) {
            return None;
        }
        self.props.component[v.index()]
    }

    /// Returns `true` when both vertices carry the same, assigned label.
    pub fn same_component(&self, a: VertexId, b: VertexId) -> bool {
        match (self.component(a), self.component(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Number of components found by the last recomputation.
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    fn require_vertex(&self, v: VertexId) -> Result<()> {
        if self.contains_vertex(v) {
            Ok(())
        } else {
            Err(SenderoError::NotFound("vertex"))
        }
    }

    fn release_point(&self, node: &mut Node<N>) {
        if let Some(point) = node.point.take() {
            if let Some(space) = &self.space {
                space.free_point(point);
            }
        }
    }

    /// Removes `v`, which must have no incident edges (see
    /// [`Graph::clear_and_remove_vertex`]). Its point goes back to the
    /// linked space.
    ///
    /// Outside bulk mode the last vertex moves into `v`'s id; ids held for
    /// that vertex must be updated from [`RemovedVertex::relocated`].
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<RemovedVertex<N>> {
        self.require_vertex(v)?;
        if !self.incident[v.index()].is_empty() {
            return Err(SenderoError::InvalidArgument(format!(
                "vertex {v} still has {} incident edges",
                self.incident[v.index()].len()
            )));
        }
        let slot = v.index();
        let mut node = if self.bulk {
            self.vertices[slot]
                .take()
                .ok_or(SenderoError::NotFound("vertex"))?
        } else {
            let node = self
                .vertices
                .swap_remove(slot)
                .ok_or(SenderoError::Corruption("hole in dense vertex storage"))?;
            self.incident.swap_remove(slot);
            self.props.swap_remove(slot);
            node
        };
        self.release_point(&mut node);
        self.vertex_count -= 1;

        let mut relocated = None;
        if !self.bulk && slot < self.vertices.len() {
            let from = VertexId(self.vertices.len() as u32);
            self.renumber_vertex(from, v);
            relocated = Some(Relocation { from, to: v });
        }
        trace!(vertex = %v, moved = ?relocated, "graph.remove_vertex");
        Ok(RemovedVertex { node, relocated })
    }

    /// Removes every edge touching `v`, then removes `v`. Ids of those
    /// edges become invalid.
    pub fn clear_and_remove_vertex(&mut self, v: VertexId) -> Result<RemovedVertex<N>> {
        self.clear_vertex(v)?;
        self.remove_vertex(v)
    }

    /// Points the vertex now stored in slot `to` (previously `from`) and
    /// its edges at its new id.
    fn renumber_vertex(&mut self, from: VertexId, to: VertexId) {
        if let Some(node) = self.vertices[to.index()].as_mut() {
            node.node_id = to;
        }
        let touching: SmallVec<[EdgeId; 8]> = self.incident[to.index()].clone();
        for e in touching {
            if let Some(link) = self.edges[e.index()].as_mut() {
                if link.source == from {
                    link.source = to;
                }
                if link.target == from {
                    link.target = to;
                }
            }
        }
    }

    /// Ends a bulk pass, compacting vertex ids in order. Returns every
    /// vertex whose id changed.
    pub fn end_bulk(&mut self) -> Vec<Relocation> {
        self.bulk = false;
        if self.vertices.len() == self.vertex_count {
            return Vec::new();
        }
        let mut relocations = Vec::new();
        let mut next = 0usize;
        for old in 0..self.vertices.len() {
            if self.vertices[old].is_none() {
                continue;
            }
            if old != next {
                self.vertices.swap(old, next);
                self.incident.swap(old, next);
                self.props.move_slot(old, next);
                let (from, to) = (VertexId(old as u32), VertexId(next as u32));
                self.renumber_vertex(from, to);
                relocations.push(Relocation { from, to });
            }
            next += 1;
        }
        self.vertices.truncate(next);
        self.incident.truncate(next);
        self.props.truncate(next);
        debug!(
            vertices = next,
            moved = relocations.len(),
            "graph.compact_vertices"
        );
        relocations
    }
}

impl<N: Default, E> Graph<N, E> {
    /// Creates an empty graph.
    pub fn new(direction: GraphDirection) -> Self {
        Self {
            direction,
            vertices: Vec::new(),
            incident: Vec::new(),
            edges: Vec::new(),
            weights: Vec::new(),
            props: VertexProps::default(),
            vertex_count: 0,
            edge_count: 0,
            component_count: 0,
            bulk: false,
            default_weight: DEFAULT_EDGE_WEIGHT,
            space: None,
            search_generation: 0,
        }
    }

    /// Creates an empty undirected graph.
    pub fn undirected() -> Self {
        Self::new(GraphDirection::Undirected)
    }

    /// Creates an empty directed graph.
    pub fn directed() -> Self {
        Self::new(GraphDirection::Directed)
    }

    /// Creates an empty graph bound to `space`.
    pub fn with_space(direction: GraphDirection, space: Arc<dyn PointSpace>) -> Self {
        let mut graph = Self::new(direction);
        graph.space = Some(space);
        graph
    }

    /// Overrides the weight given to edges added without one.
    pub fn with_default_weight(mut self, weight: f64) -> Result<Self> {
        check_weight(weight)?;
        self.default_weight = weight;
        Ok(self)
    }

    /// Adds a vertex with no point and a white color mark.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Some(Node::new(id, self.direction)));
        self.incident.push(SmallVec::new());
        self.props.push_default();
        self.vertex_count += 1;
        trace!(vertex = %id, "graph.add_vertex");
        id
    }

    /// Removes every vertex and edge, releasing all points.
    pub fn clear(&mut self) {
        let removed = self.vertex_count;
        let mut drained = std::mem::take(&mut self.vertices);
        for node in drained.iter_mut().flatten() {
            self.release_point(node);
        }
        drop(drained);
        self.incident.clear();
        self.edges.clear();
        self.weights.clear();
        self.props.clear();
        self.vertex_count = 0;
        self.edge_count = 0;
        self.component_count = 0;
        self.bulk = false;
        debug!(vertices = removed, "graph.clear");
    }
}

impl<N, E: Default> Graph<N, E> {
    /// Adds an edge with the default weight and payload.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> Result<EdgeId> {
        let weight = self.default_weight;
        self.add_edge_with(from, to, weight, E::default())
    }

    /// Adds an edge with an explicit weight and the default payload.
    pub fn add_edge_weighted(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: f64,
    ) -> Result<EdgeId> {
        self.add_edge_with(from, to, weight, E::default())
    }
}

impl<N, E> Graph<N, E> {
    /// Adds an edge carrying `payload`.
    pub fn add_edge_with(
        &mut self,
        from: VertexId,
        to: VertexId,
        weight: f64,
        payload: E,
    ) -> Result<EdgeId> {
        check_weight(weight)?;
        self.require_vertex(from)?;
        self.require_vertex(to)?;
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Link {
            edge_id: id,
            source: from,
            target: to,
            payload,
        }));
        self.weights.push(weight);
        self.incident[from.index()].push(id);
        if to != from {
            self.incident[to.index()].push(id);
        }
        self.edge_count += 1;
        trace!(edge = %id, from = %from, to = %to, weight, "graph.add_edge");
        Ok(id)
    }
}

fn check_unregistered<N>(node: &Node<N>) -> Result<()> {
    if node.prox.is_some() {
        return Err(SenderoError::InvalidArgument(format!(
            "vertex {} is registered with a proximity index; remove its point from the index first",
            node.node_id
        )));
    }
    Ok(())
}

fn check_weight(weight: f64) -> Result<()> {
    if weight.is_nan() || weight < 0.0 {
        return Err(SenderoError::InvalidArgument(format!(
            "edge weight must be a non-negative number, got {weight}"
        )));
    }
    Ok(())
}
