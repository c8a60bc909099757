#![forbid(unsafe_code)]

//! Operations behind the `sendero` command-line tool.
//!
//! Each operation opens roadmap files, does its work through
//! [`crate::roadmap::Roadmap`], and returns a serializable report the binary
//! prints as text or JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::error::SenderoError;
use crate::options::RoadmapOptions;
use crate::roadmap::Roadmap;
use crate::space::EuclideanSpace;
use crate::types::VertexId;

/// Errors surfaced by CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// Roadmap operation error.
    #[error(transparent)]
    Roadmap(#[from] SenderoError),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Settings shared by every command.
#[derive(Clone, Debug)]
pub struct OpenConfig {
    /// Coordinates per configuration.
    pub dimension: usize,
    /// Roadmap options.
    pub options: RoadmapOptions,
}

impl OpenConfig {
    fn open_empty(&self) -> Result<Roadmap, CliError> {
        if self.dimension == 0 {
            return Err("dimension must be at least 1".into());
        }
        let space = Arc::new(EuclideanSpace::new(self.dimension));
        Ok(Roadmap::new(space, &self.options)?)
    }

    fn open(&self, path: &Path) -> Result<Roadmap, CliError> {
        let mut map = self.open_empty()?;
        map.load_from_path(path)?;
        Ok(map)
    }
}

/// Summary of one roadmap file.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    /// File inspected.
    pub path: String,
    /// Coordinates per configuration.
    pub dimension: usize,
    /// Vertex count.
    pub vertices: usize,
    /// Edge count.
    pub edges: usize,
    /// Connected components.
    pub components: usize,
    /// Largest vertex degree.
    pub max_degree: usize,
    /// Mean vertex degree.
    pub mean_degree: f64,
    /// Sum of edge weights.
    pub total_weight: f64,
    /// Lowest corner of the bounding box.
    pub bounds_min: Vec<f64>,
    /// Highest corner of the bounding box.
    pub bounds_max: Vec<f64>,
}

/// Reads `path` and summarizes it.
pub fn stats(path: &Path, cfg: &OpenConfig) -> Result<StatsReport, CliError> {
    let mut map = cfg.open(path)?;
    let components = map.update_components();
    let graph = map.graph();

    let mut max_degree = 0;
    let mut degree_sum = 0;
    let mut bounds_min = vec![f64::INFINITY; cfg.dimension];
    let mut bounds_max = vec![f64::NEG_INFINITY; cfg.dimension];
    for v in graph.vertex_ids() {
        let degree = graph.incident_edges(v).len();
        max_degree = max_degree.max(degree);
        degree_sum += degree;
        if let Some(coords) = graph.coords(v) {
            for (axis, value) in coords.iter().enumerate() {
                bounds_min[axis] = bounds_min[axis].min(*value);
                bounds_max[axis] = bounds_max[axis].max(*value);
            }
        }
    }
    let total_weight = graph
        .edge_ids()
        .filter_map(|e| graph.get_weight(e))
        .sum::<f64>();
    let vertices = graph.vertex_count();
    let mean_degree = if vertices == 0 {
        0.0
    } else {
        degree_sum as f64 / vertices as f64
    };
    if vertices == 0 {
        bounds_min.clear();
        bounds_max.clear();
    }

    Ok(StatsReport {
        path: path.display().to_string(),
        dimension: cfg.dimension,
        vertices,
        edges: graph.edge_count(),
        components,
        max_degree,
        mean_degree,
        total_weight,
        bounds_min,
        bounds_max,
    })
}

/// Result of merging several roadmap files.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    /// File written.
    pub output: String,
    /// Per-input id offsets, in input order.
    pub offsets: Vec<usize>,
    /// Vertex count of the merged roadmap.
    pub vertices: usize,
    /// Edge count of the merged roadmap.
    pub edges: usize,
    /// Connected components of the merged roadmap.
    pub components: usize,
}

/// Loads `inputs` one after another into a single roadmap and saves it.
pub fn merge(inputs: &[PathBuf], output: &Path, cfg: &OpenConfig) -> Result<MergeReport, CliError> {
    if inputs.is_empty() {
        return Err("merge needs at least one input".into());
    }
    let mut map = cfg.open_empty()?;
    let mut offsets = Vec::with_capacity(inputs.len());
    for input in inputs {
        let report = map.load_from_path(input)?;
        offsets.push(report.offset);
    }
    let components = map.update_components();
    map.save_to_path(output)?;
    Ok(MergeReport {
        output: output.display().to_string(),
        offsets,
        vertices: map.vertex_count(),
        edges: map.edge_count(),
        components,
    })
}

/// What a `nearest` query asks for.
#[derive(Clone, Debug)]
pub enum NearestQuery {
    /// The `k` closest configurations.
    K(usize),
    /// Every configuration within a radius, or the closest one.
    Radius(f64),
}

/// One hit of a `nearest` query.
#[derive(Debug, Serialize)]
pub struct Hit {
    /// Vertex id in the loaded roadmap.
    pub vertex: u32,
    /// Distance from the query point.
    pub distance: f64,
    /// Coordinates of the vertex.
    pub coords: Vec<f64>,
}

/// Result of a `nearest` query.
#[derive(Debug, Serialize)]
pub struct NearestReport {
    /// The query point.
    pub query: Vec<f64>,
    /// Hits, nearest first.
    pub hits: Vec<Hit>,
    /// Set when a radius query found nothing in range and fell back to the
    /// closest configuration.
    pub fallback: bool,
}

/// Answers a proximity query against the roadmap stored at `path`.
pub fn nearest(
    path: &Path,
    query: &[f64],
    what: &NearestQuery,
    cfg: &OpenConfig,
) -> Result<NearestReport, CliError> {
    if query.len() != cfg.dimension {
        return Err(format!(
            "query has {} coordinates, roadmap dimension is {}",
            query.len(),
            cfg.dimension
        )
        .into());
    }
    let map = cfg.open(path)?;
    let (found, fallback) = match what {
        NearestQuery::K(k) => (map.k_nearest(query, *k)?, false),
        NearestQuery::Radius(r) => {
            let result = map.within_or_closest(query, *r)?;
            let fallback = result.closest.is_some();
            let mut found = result.within;
            found.extend(result.closest);
            (found, fallback)
        }
    };
    let hits = found
        .into_iter()
        .map(|n| Hit {
            vertex: n.vertex.0,
            distance: n.distance,
            coords: map
                .graph()
                .coords(n.vertex)
                .map(|c| c.to_vec())
                .unwrap_or_default(),
        })
        .collect();
    Ok(NearestReport {
        query: query.to_vec(),
        hits,
        fallback,
    })
}

/// Parameters for [`generate`].
#[derive(Clone, Debug)]
pub struct GenerateConfig {
    /// File to write.
    pub output: PathBuf,
    /// Number of configurations to sample.
    pub samples: usize,
    /// Neighbors each new configuration tries to connect to.
    pub neighbors: usize,
    /// Optional connection radius.
    pub radius: Option<f64>,
    /// Random seed.
    pub seed: u64,
}

/// Result of [`generate`].
#[derive(Debug, Serialize)]
pub struct GenerateReport {
    /// File written.
    pub output: String,
    /// Vertex count.
    pub vertices: usize,
    /// Edge count.
    pub edges: usize,
    /// Connected components.
    pub components: usize,
    /// Seed used.
    pub seed: u64,
}

/// Samples a random roadmap in the unit cube, connecting every sample to
/// its nearest earlier samples, and saves it.
pub fn generate(gen: &GenerateConfig, cfg: &OpenConfig) -> Result<GenerateReport, CliError> {
    let mut map = cfg.open_empty()?;
    let mut rng = ChaCha8Rng::seed_from_u64(gen.seed);
    let mut sample = vec![0.0; cfg.dimension];
    for _ in 0..gen.samples {
        for value in sample.iter_mut() {
            *value = rng.gen_range(0.0..1.0);
        }
        let k = gen.neighbors.min(map.vertex_count());
        let candidates = map.k_nearest(&sample, k)?;
        let v = map.add_configuration(&sample)?;
        for candidate in candidates {
            if gen.radius.is_some_and(|r| candidate.distance > r) {
                continue;
            }
            connect(&mut map, v, candidate.vertex)?;
        }
    }
    let components = map.update_components();
    map.save_to_path(&gen.output)?;
    info!(
        samples = gen.samples,
        edges = map.edge_count(),
        components,
        "cli.generate.done"
    );
    Ok(GenerateReport {
        output: gen.output.display().to_string(),
        vertices: map.vertex_count(),
        edges: map.edge_count(),
        components,
        seed: gen.seed,
    })
}

fn connect(map: &mut Roadmap, a: VertexId, b: VertexId) -> Result<(), CliError> {
    if !map.graph().has_edge(a, b) {
        map.connect(a, b)?;
    }
    Ok(())
}
