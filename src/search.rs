//! Shortest paths over a roadmap.
//!
//! Searches write into the graph's distance, predecessor, and color maps.
//! Instead of resetting those maps for every vertex up front, each vertex is
//! reset lazily the first time a search generation reaches it (see
//! [`SearchContext`]). Heuristic values are cached per generation on the
//! vertex.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use crate::error::{Result, SenderoError};
use crate::graph::{Color, Graph};
use crate::model::SearchContext;
use crate::space::PointSpace;
use crate::types::{EdgeId, VertexId};

/// Limits for a single search.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Expansions before the search gives up.
    pub max_expansions: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_expansions: 1_000_000,
        }
    }
}

/// A path found by [`astar`] or [`dijkstra`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPath {
    /// Vertices from start to goal, inclusive.
    pub vertices: Vec<VertexId>,
    /// Sum of edge weights along the path.
    pub cost: f64,
}

#[derive(Clone, Copy, Debug)]
struct Frontier {
    f_score: f64,
    vertex: VertexId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap pops the lowest f-score first.
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Resets `v`'s search state if an earlier generation left it behind.
fn prepare<N, E>(graph: &mut Graph<N, E>, ctx: &SearchContext, v: VertexId) -> Result<()> {
    let node = graph.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
    if node.touch(ctx) {
        graph.set_distance(v, f64::INFINITY)?;
        graph.set_predecessor(v, None)?;
        graph.set_color(v, Color::White)?;
    }
    Ok(())
}

fn heuristic_of<N, E, H>(
    graph: &mut Graph<N, E>,
    ctx: &SearchContext,
    v: VertexId,
    heuristic: &mut H,
) -> f64
where
    H: FnMut(&Graph<N, E>, VertexId) -> f64,
{
    if let Some(cached) = graph.vertex(v).and_then(|n| n.cached_heuristic(ctx)) {
        return cached;
    }
    let value = heuristic(graph, v);
    if let Some(node) = graph.vertex_mut(v) {
        node.cache_heuristic(ctx, value);
    }
    value
}

/// A* from `start` to `goal`.
///
/// `heuristic` must not overestimate the remaining cost for the result to
/// be optimal. Returns `Ok(None)` when `goal` is unreachable or the
/// expansion limit is hit.
pub fn astar<N, E, H>(
    graph: &mut Graph<N, E>,
    ctx: &mut SearchContext,
    start: VertexId,
    goal: VertexId,
    config: &SearchConfig,
    mut heuristic: H,
) -> Result<Option<SearchPath>>
where
    H: FnMut(&Graph<N, E>, VertexId) -> f64,
{
    if !graph.contains_vertex(goal) {
        return Err(SenderoError::NotFound("vertex"));
    }
    let generation = ctx.begin(graph);
    let ctx = &*ctx;
    prepare(graph, ctx, start)?;
    graph.set_distance(start, 0.0)?;
    graph.set_color(start, Color::Gray)?;

    let mut open = BinaryHeap::new();
    open.push(Frontier {
        f_score: heuristic_of(graph, ctx, start, &mut heuristic),
        vertex: start,
    });

    let mut expansions = 0usize;
    while let Some(Frontier { vertex: v, .. }) = open.pop() {
        if graph.color(v) == Some(Color::Black) {
            continue;
        }
        if v == goal {
            let path = reconstruct(graph, start, goal)?;
            debug!(
                generation,
                expansions,
                hops = path.vertices.len(),
                cost = path.cost,
                "search.astar.found"
            );
            return Ok(Some(path));
        }
        graph.set_color(v, Color::Black)?;
        expansions += 1;
        if expansions > config.max_expansions {
            debug!(generation, expansions, "search.astar.limit");
            return Ok(None);
        }

        let g_v = graph.distance(v).unwrap_or(f64::INFINITY);
        let next: SmallVec<[(VertexId, EdgeId); 8]> = graph.neighbors(v).collect();
        for (u, e) in next {
            prepare(graph, ctx, u)?;
            if graph.color(u) == Some(Color::Black) {
                continue;
            }
            let weight = graph.get_weight(e).unwrap_or(f64::INFINITY);
            let tentative = g_v + weight;
            if tentative < graph.distance(u).unwrap_or(f64::INFINITY) {
                graph.set_distance(u, tentative)?;
                graph.set_predecessor(u, Some(v))?;
                graph.set_color(u, Color::Gray)?;
                let h = heuristic_of(graph, ctx, u, &mut heuristic);
                open.push(Frontier {
                    f_score: tentative + h,
                    vertex: u,
                });
            }
        }
    }
    debug!(generation, expansions, "search.astar.unreachable");
    Ok(None)
}

/// Dijkstra from `start` to `goal`: A* with a zero heuristic.
pub fn dijkstra<N, E>(
    graph: &mut Graph<N, E>,
    ctx: &mut SearchContext,
    start: VertexId,
    goal: VertexId,
    config: &SearchConfig,
) -> Result<Option<SearchPath>> {
    astar(graph, ctx, start, goal, config, |_, _| 0.0)
}

/// Heuristic measuring the space distance from a vertex's point to the
/// goal's point. Vertices without a point score 0.
pub fn space_heuristic<N, E>(
    graph: &Graph<N, E>,
    goal: VertexId,
) -> Result<impl FnMut(&Graph<N, E>, VertexId) -> f64> {
    let space: Arc<dyn PointSpace> = graph
        .space()
        .cloned()
        .ok_or(SenderoError::SpaceNotLinked)?;
    let target = graph.coords(goal).ok_or(SenderoError::NotFound("point"))?;
    Ok(move |g: &Graph<N, E>, v: VertexId| {
        g.coords(v)
            .map_or(0.0, |coords| space.distance(&coords, &target))
    })
}

fn reconstruct<N, E>(graph: &Graph<N, E>, start: VertexId, goal: VertexId) -> Result<SearchPath> {
    let cost = graph.distance(goal).unwrap_or(f64::INFINITY);
    let mut vertices = vec![goal];
    let mut current = goal;
    while current != start {
        current = graph
            .predecessor(current)
            .ok_or(SenderoError::Corruption("broken predecessor chain"))?;
        vertices.push(current);
        if vertices.len() > graph.vertex_count() {
            return Err(SenderoError::Corruption("predecessor cycle"));
        }
    }
    vertices.reverse();
    Ok(SearchPath { vertices, cost })
}
