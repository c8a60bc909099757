use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Trait for tracking roadmap lifecycle events and proximity queries.
///
/// A [`crate::roadmap::Roadmap`] reports every vertex, edge, and index
/// change through this trait, so implementations can feed dashboards or
/// assert on planner behavior in tests.
pub trait RoadmapMetrics: Send + Sync {
    /// Records a new vertex.
    fn vertex_added(&self);

    /// Records a removed vertex.
    fn vertex_removed(&self);

    /// Records a new edge.
    fn edge_added(&self);

    /// Records a removed edge.
    fn edge_removed(&self);

    /// Records `count` points registered with the proximity index.
    fn points_indexed(&self, count: usize);

    /// Records a proximity query.
    ///
    /// # Parameters
    /// * `kind` - One of `"single"`, `"multi"`, or `"radius"`.
    fn query(&self, kind: &'static str);
}

/// A no-op implementation of [`RoadmapMetrics`] that discards everything.
#[derive(Default)]
pub struct NoopMetrics;

impl RoadmapMetrics for NoopMetrics {
    fn vertex_added(&self) {}
    fn vertex_removed(&self) {}
    fn edge_added(&self) {}
    fn edge_removed(&self) {}
    fn points_indexed(&self, _count: usize) {}
    fn query(&self, _kind: &'static str) {}
}

/// A thread-safe counter-based implementation of [`RoadmapMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Vertices added.
    pub vertices_added: AtomicU64,
    /// Vertices removed.
    pub vertices_removed: AtomicU64,
    /// Edges added.
    pub edges_added: AtomicU64,
    /// Edges removed.
    pub edges_removed: AtomicU64,
    /// Points registered with the proximity index.
    pub points_indexed: AtomicU64,
    /// Nearest-point queries.
    pub single_queries: AtomicU64,
    /// k-nearest queries.
    pub multi_queries: AtomicU64,
    /// Radius queries.
    pub radius_queries: AtomicU64,
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Vertices added.
    pub vertices_added: u64,
    /// Vertices removed.
    pub vertices_removed: u64,
    /// Edges added.
    pub edges_added: u64,
    /// Edges removed.
    pub edges_removed: u64,
    /// Points registered with the proximity index.
    pub points_indexed: u64,
    /// Nearest-point queries.
    pub single_queries: u64,
    /// k-nearest queries.
    pub multi_queries: u64,
    /// Radius queries.
    pub radius_queries: u64,
}

impl CounterMetrics {
    /// Reads every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            vertices_added: self.vertices_added.load(Ordering::Relaxed),
            vertices_removed: self.vertices_removed.load(Ordering::Relaxed),
            edges_added: self.edges_added.load(Ordering::Relaxed),
            edges_removed: self.edges_removed.load(Ordering::Relaxed),
            points_indexed: self.points_indexed.load(Ordering::Relaxed),
            single_queries: self.single_queries.load(Ordering::Relaxed),
            multi_queries: self.multi_queries.load(Ordering::Relaxed),
            radius_queries: self.radius_queries.load(Ordering::Relaxed),
        }
    }
}

impl RoadmapMetrics for CounterMetrics {
    fn vertex_added(&self) {
        self.vertices_added.fetch_add(1, Ordering::Relaxed);
    }

    fn vertex_removed(&self) {
        self.vertices_removed.fetch_add(1, Ordering::Relaxed);
    }

    fn edge_added(&self) {
        self.edges_added.fetch_add(1, Ordering::Relaxed);
    }

    fn edge_removed(&self) {
        self.edges_removed.fetch_add(1, Ordering::Relaxed);
    }

    fn points_indexed(&self, count: usize) {
        self.points_indexed.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn query(&self, kind: &'static str) {
        match kind {
            "single" => {
                self.single_queries.fetch_add(1, Ordering::Relaxed);
            }
            "multi" => {
                self.multi_queries.fetch_add(1, Ordering::Relaxed);
            }
            "radius" => {
                self.radius_queries.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn RoadmapMetrics> {
    Arc::new(NoopMetrics)
}
