//! Graph and proximity index kept in lockstep.
//!
//! [`Roadmap`] owns a [`Graph`], a [`DistanceMetric`], and a handle to the
//! [`PointSpace`] both read from. Every configuration added or removed
//! through it updates the graph and the index together, and vertex
//! renumbering is forwarded to the index so entry back-references stay
//! correct.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::codec::{self, LoadReport};
use crate::error::{Result, SenderoError};
use crate::graph::{Graph, Relocation, RemovedVertex};
use crate::metric::{DistanceMetric, Nearest, RadiusResult};
use crate::metrics::{default_metrics, RoadmapMetrics};
use crate::model::{EdgePayload, Link, NodePayload, SearchContext};
use crate::options::RoadmapOptions;
use crate::proximity::ProximityIndex;
use crate::search::{astar, dijkstra, space_heuristic, SearchConfig, SearchPath};
use crate::space::PointSpace;
use crate::types::{EdgeId, VertexId};

/// A roadmap of sampled configurations with a synchronized proximity index.
pub struct Roadmap<N = (), E = (), I = Box<dyn ProximityIndex>> {
    graph: Graph<N, E>,
    metric: DistanceMetric<I>,
    space: Arc<dyn PointSpace>,
    metrics: Arc<dyn RoadmapMetrics>,
}

impl<N: NodePayload, E: EdgePayload> Roadmap<N, E, Box<dyn ProximityIndex>> {
    /// Creates an empty roadmap using the index selected in `options`.
    pub fn new(space: Arc<dyn PointSpace>, options: &RoadmapOptions) -> Result<Self> {
        let index = options.index.build();
        Self::with_index(space, index, options)
    }
}

impl<N: NodePayload, E: EdgePayload, I: ProximityIndex> Roadmap<N, E, I> {
    /// Creates an empty roadmap over a caller-supplied index.
    pub fn with_index(
        space: Arc<dyn PointSpace>,
        index: I,
        options: &RoadmapOptions,
    ) -> Result<Self> {
        options.validate()?;
        let graph = Graph::with_space(options.direction, Arc::clone(&space))
            .with_default_weight(options.default_edge_weight)?;
        let metric = DistanceMetric::with_space(index, Arc::clone(&space))
            .with_max_query_width(options.max_query_width);
        debug!(
            dimension = space.dimension(),
            index = metric.index().name(),
            max_query_width = options.max_query_width,
            "roadmap.new"
        );
        Ok(Self {
            graph,
            metric,
            space,
            metrics: options.metrics.clone().unwrap_or_else(default_metrics),
        })
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph<N, E> {
        &self.graph
    }

    /// The distance metric and its index.
    pub fn metric(&self) -> &DistanceMetric<I> {
        &self.metric
    }

    /// The point space configurations live in.
    pub fn space(&self) -> &Arc<dyn PointSpace> {
        &self.space
    }

    /// Number of configurations.
    pub fn vertex_count(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Number of connections.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` when the roadmap holds no configuration.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Payload of vertex `v`.
    pub fn payload_mut(&mut self, v: VertexId) -> Option<&mut N> {
        self.graph.vertex_mut(v).map(|node| &mut node.payload)
    }

    /// Payload of edge `e`.
    pub fn edge_payload_mut(&mut self, e: EdgeId) -> Option<&mut E> {
        self.graph.edge_mut(e).map(|link| &mut link.payload)
    }

    /// Adds a configuration and registers it with the index.
    pub fn add_configuration(&mut self, coords: &[f64]) -> Result<VertexId> {
        let v = self.graph.add_vertex();
        let registered = self.graph.alloc_point(v, coords).and_then(|_| {
            let node = self.graph.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
            self.metric.add_point(node)
        });
        if let Err(err) = registered {
            self.graph.remove_vertex(v)?;
            return Err(err);
        }
        self.metrics.vertex_added();
        self.metrics.points_indexed(1);
        Ok(v)
    }

    /// Adds many configurations and registers them with the index in one
    /// batch. Nothing is added if any configuration is rejected.
    pub fn add_configurations<'c>(
        &mut self,
        configurations: impl IntoIterator<Item = &'c [f64]>,
    ) -> Result<Vec<VertexId>> {
        let mut added = Vec::new();
        for coords in configurations {
            let v = self.graph.add_vertex();
            added.push(v);
            if let Err(err) = self.graph.alloc_point(v, coords) {
                self.rollback_tail(&added)?;
                return Err(err);
            }
        }
        let Some(&first) = added.first() else {
            return Ok(added);
        };
        let indexed = self
            .metric
            .add_points(self.graph.vertices_mut().filter(|n| n.node_id() >= first));
        if let Err(err) = indexed {
            self.rollback_tail(&added)?;
            return Err(err);
        }
        for _ in &added {
            self.metrics.vertex_added();
        }
        self.metrics.points_indexed(added.len());
        Ok(added)
    }

    /// Removes freshly appended, unindexed vertices, newest first.
    fn rollback_tail(&mut self, added: &[VertexId]) -> Result<()> {
        for &v in added.iter().rev() {
            self.graph.clear_and_remove_vertex(v)?;
        }
        Ok(())
    }

    /// Moves configuration `v` to `coords` and re-registers it so queries
    /// see the new position. Edge weights are left as they are. On error
    /// `v` keeps its old position and stays indexed.
    pub fn move_configuration(&mut self, v: VertexId, coords: &[f64]) -> Result<()> {
        let node = self.graph.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
        self.metric.remove_point(node);
        let moved = self.graph.alloc_point(v, coords);
        let node = self.graph.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
        self.metric.add_point(node)?;
        moved?;
        trace!(vertex = %v, "roadmap.move_configuration");
        Ok(())
    }

    /// Connects two configurations with an edge weighted by their distance.
    pub fn connect(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId> {
        let weight = self.distance_between(a, b)?;
        self.connect_with(a, b, weight, E::default())
    }

    /// Connects two configurations with an explicit weight and payload.
    pub fn connect_with(
        &mut self,
        a: VertexId,
        b: VertexId,
        weight: f64,
        payload: E,
    ) -> Result<EdgeId> {
        let e = self.graph.add_edge_with(a, b, weight, payload)?;
        self.metrics.edge_added();
        Ok(e)
    }

    /// Distance between the points of two vertices.
    pub fn distance_between(&self, a: VertexId, b: VertexId) -> Result<f64> {
        let pa = self.graph.coords(a).ok_or(SenderoError::NotFound("point"))?;
        let pb = self.graph.coords(b).ok_or(SenderoError::NotFound("point"))?;
        Ok(self.space.distance(&pa, &pb))
    }

    /// Removes an edge. Absent edges are a no-op.
    pub fn remove_edge(&mut self, e: EdgeId) -> Option<Link<E>> {
        let link = self.graph.remove_edge(e)?;
        self.metrics.edge_removed();
        Some(link)
    }

    /// Removes a configuration with all its edges, unregistering it from
    /// the index first.
    ///
    /// Outside bulk mode the last vertex takes over `v`'s id; the index is
    /// updated accordingly and the move is reported in the result.
    pub fn remove_configuration(&mut self, v: VertexId) -> Result<RemovedVertex<N>> {
        let node = self.graph.vertex_mut(v).ok_or(SenderoError::NotFound("vertex"))?;
        self.metric.remove_point(node);
        let edges = self.graph.clear_vertex(v)?;
        let removed = self.graph.remove_vertex(v)?;
        if let Some(moved) = removed.relocated {
            self.apply_relocations(&[moved]);
        }
        for _ in 0..edges {
            self.metrics.edge_removed();
        }
        self.metrics.vertex_removed();
        Ok(removed)
    }

    fn apply_relocations(&mut self, moved: &[Relocation]) {
        for r in moved {
            let handle = self.graph.vertex(r.to).and_then(|n| n.prox_handle());
            let updated = handle.is_some_and(|h| self.metric.relocate(h, r.to));
            if !updated {
                warn!(from = %r.from, to = %r.to, "roadmap.relocate.unindexed");
            }
        }
    }

    /// Starts a bulk pass: removals leave id holes until
    /// [`Roadmap::end_bulk`].
    pub fn begin_bulk(&mut self) {
        self.graph.begin_bulk();
    }

    /// Ends a bulk pass, compacting ids and updating the index.
    pub fn end_bulk(&mut self) -> Vec<Relocation> {
        let moved = self.graph.end_bulk();
        self.apply_relocations(&moved);
        moved
    }

    /// Removes every configuration and resets the index.
    pub fn clear(&mut self) {
        let removed = self.graph.vertex_count();
        self.graph.clear();
        self.metric.clear();
        debug!(vertices = removed, "roadmap.clear");
    }

    /// Recomputes connected components and returns their count.
    pub fn update_components(&mut self) -> usize {
        self.graph.update_components()
    }

    /// Closest configuration to `query`.
    pub fn nearest(&self, query: &[f64]) -> Result<Nearest> {
        self.metrics.query("single");
        self.metric.single_query(query)
    }

    /// Up to `k` closest configurations, nearest first.
    pub fn k_nearest(&self, query: &[f64], k: usize) -> Result<Vec<Nearest>> {
        self.metrics.query("multi");
        self.metric.multi_query_with_distances(query, k)
    }

    /// Every configuration within `radius` of `query`.
    pub fn within(&self, query: &[f64], radius: f64) -> Result<Vec<Nearest>> {
        self.metrics.query("radius");
        self.metric.radius_query(query, radius)
    }

    /// Configurations within `radius`, or the closest one when none are.
    pub fn within_or_closest(&self, query: &[f64], radius: f64) -> Result<RadiusResult> {
        self.metrics.query("radius");
        self.metric.radius_and_closest_query(query, radius)
    }

    /// Cheapest path between two configurations, guided by the space
    /// distance to `goal`.
    pub fn shortest_path(
        &mut self,
        ctx: &mut SearchContext,
        start: VertexId,
        goal: VertexId,
    ) -> Result<Option<SearchPath>> {
        let heuristic = space_heuristic(&self.graph, goal)?;
        astar(&mut self.graph, ctx, start, goal, &SearchConfig::default(), heuristic)
    }

    /// Cheapest path between two configurations without a heuristic.
    pub fn shortest_path_uninformed(
        &mut self,
        ctx: &mut SearchContext,
        start: VertexId,
        goal: VertexId,
    ) -> Result<Option<SearchPath>> {
        dijkstra(&mut self.graph, ctx, start, goal, &SearchConfig::default())
    }

    /// Writes the roadmap in the text format of [`crate::codec`].
    pub fn save(&self, out: &mut dyn Write) -> Result<()> {
        codec::serialize(&self.graph, out)
    }

    /// Appends a saved roadmap, shifting its ids past the existing
    /// vertices, and registers the loaded vertices with the index in one
    /// batch.
    ///
    /// On failure every vertex read so far is removed again, leaving the
    /// roadmap as it was.
    pub fn load(&mut self, input: &mut dyn BufRead) -> Result<LoadReport> {
        let offset = self.graph.vertex_count();
        let report = match codec::deserialize(&mut self.graph, input) {
            Ok(report) => report,
            Err(err) => {
                self.truncate_to(offset)?;
                return Err(err);
            }
        };
        let first = report.first;
        let indexed = self
            .metric
            .add_points(self.graph.vertices_mut().filter(|n| n.node_id() >= first));
        if let Err(err) = indexed {
            self.truncate_to(offset)?;
            return Err(err);
        }
        for _ in 0..report.vertices {
            self.metrics.vertex_added();
        }
        for _ in 0..report.edges {
            self.metrics.edge_added();
        }
        self.metrics.points_indexed(report.vertices);
        Ok(report)
    }

    fn truncate_to(&mut self, len: usize) -> Result<()> {
        while self.graph.vertex_count() > len {
            let last = VertexId((self.graph.vertex_count() - 1) as u32);
            if let Some(node) = self.graph.vertex_mut(last) {
                self.metric.remove_point(node);
            }
            self.graph.clear_and_remove_vertex(last)?;
        }
        self.graph.update_components();
        Ok(())
    }

    /// Saves the roadmap to `path`.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.save(&mut out)?;
        out.flush()?;
        info!(
            path = %path.display(),
            vertices = self.vertex_count(),
            edges = self.edge_count(),
            "roadmap.saved"
        );
        Ok(())
    }

    /// Loads and appends the roadmap stored at `path`.
    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let mut input = BufReader::new(File::open(path)?);
        let report = self.load(&mut input)?;
        info!(
            path = %path.display(),
            vertices = report.vertices,
            edges = report.edges,
            offset = report.offset,
            "roadmap.loaded"
        );
        Ok(report)
    }
}
