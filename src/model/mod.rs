//! Vertex and edge records stored by [`crate::graph::Graph`].
//!
//! Planner-specific data rides along as a payload type chosen once per
//! graph instance (`Graph<N, E>`), so typed access never needs a cast.

use serde::{Deserialize, Serialize};

use crate::codec::{TokenReader, TokenWriter};
use crate::error::Result;
use crate::graph::Graph;
use crate::types::{EdgeId, PointId, ProxHandle, VertexId};

mod segment;

pub use segment::PathSegment;

/// Whether a graph's edges are ordered pairs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphDirection {
    /// `a -> b` does not imply `b -> a`.
    Directed,
    /// Every edge connects both ways.
    #[default]
    Undirected,
}

/// Generation of the graph search a caller is running.
///
/// Each search calls [`SearchContext::begin`]; per-vertex search state whose
/// tag differs from the current generation is treated as uninitialized, so
/// starting a search never has to sweep every vertex. Generations are drawn
/// from the graph, so separate contexts on one graph never share one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchContext {
    generation: u64,
}

impl SearchContext {
    /// Creates a context that has not started a search yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new search on `graph` and returns its generation.
    pub fn begin<N, E>(&mut self, graph: &mut Graph<N, E>) -> u64 {
        self.generation = graph.next_search_generation();
        self.generation
    }
}

/// Extra per-vertex data serialized after the vertex's point.
pub trait NodePayload: Default {
    /// Writes payload fields after the point encoding.
    fn encode(&self, _out: &mut TokenWriter<'_>) -> Result<()> {
        Ok(())
    }

    /// Reads the fields written by [`NodePayload::encode`].
    fn decode(&mut self, _input: &mut TokenReader<'_>) -> Result<()> {
        Ok(())
    }
}

/// Extra per-edge data serialized between the endpoints and the weight.
pub trait EdgePayload: Default {
    /// Writes payload fields before the trailing weight.
    fn encode(&self, _out: &mut TokenWriter<'_>) -> Result<()> {
        Ok(())
    }

    /// Reads the fields written by [`EdgePayload::encode`].
    fn decode(&mut self, _input: &mut TokenReader<'_>) -> Result<()> {
        Ok(())
    }
}

impl NodePayload for () {}
impl EdgePayload for () {}

/// A roadmap vertex.
#[derive(Clone, Debug)]
pub struct Node<N> {
    pub(crate) node_id: VertexId,
    pub(crate) point: Option<PointId>,
    pub(crate) prox: Option<ProxHandle>,
    pub(crate) search_id: u64,
    cached_heuristic: (u64, f64),
    direction: GraphDirection,
    /// Planner-specific payload.
    pub payload: N,
}

impl<N: Default> Node<N> {
    pub(crate) fn new(node_id: VertexId, direction: GraphDirection) -> Self {
        Self {
            node_id,
            point: None,
            prox: None,
            search_id: 0,
            cached_heuristic: (0, 0.0),
            direction,
            payload: N::default(),
        }
    }
}

impl<N> Node<N> {
    /// Current dense id of this vertex.
    pub fn node_id(&self) -> VertexId {
        self.node_id
    }

    /// Point bound to this vertex, if any.
    pub fn point(&self) -> Option<PointId> {
        self.point
    }

    /// Proximity entry registered for this vertex, if any.
    pub fn prox_handle(&self) -> Option<ProxHandle> {
        self.prox
    }

    /// Direction of the graph this vertex was created in.
    pub fn direction(&self) -> GraphDirection {
        self.direction
    }

    /// Generation of the last search that touched this vertex.
    pub fn search_id(&self) -> u64 {
        self.search_id
    }

    /// Returns `true` when the vertex was touched by the current search.
    pub fn is_current(&self, ctx: &SearchContext) -> bool {
        self.search_id == ctx.generation()
    }

    /// Heuristic cached during the current search.
    pub fn cached_heuristic(&self, ctx: &SearchContext) -> Option<f64> {
        (self.cached_heuristic.0 == ctx.generation() && ctx.generation() != 0)
            .then_some(self.cached_heuristic.1)
    }

    /// Caches `value` as this vertex's heuristic for the current search.
    pub fn cache_heuristic(&mut self, ctx: &SearchContext, value: f64) {
        self.cached_heuristic = (ctx.generation(), value);
    }

    /// Tags the vertex with the current generation. Returns `true` if it
    /// carried stale state from an earlier search.
    pub(crate) fn touch(&mut self, ctx: &SearchContext) -> bool {
        let stale = self.search_id != ctx.generation();
        self.search_id = ctx.generation();
        stale
    }
}

/// A roadmap edge. Its weight lives in the graph's weight map.
#[derive(Clone, Debug)]
pub struct Link<E> {
    pub(crate) edge_id: EdgeId,
    pub(crate) source: VertexId,
    pub(crate) target: VertexId,
    /// Planner-specific payload, such as a [`PathSegment`].
    pub payload: E,
}

impl<E> Link<E> {
    /// Current id of this edge.
    pub fn edge_id(&self) -> EdgeId {
        self.edge_id
    }

    /// Source endpoint.
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// Target endpoint.
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// The endpoint opposite `v`, or `None` if `v` is not an endpoint.
    pub fn opposite(&self, v: VertexId) -> Option<VertexId> {
        if self.source == v {
            Some(self.target)
        } else if self.target == v {
            Some(self.source)
        } else {
            None
        }
    }
}
