use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SenderoError};
use crate::graph::DEFAULT_EDGE_WEIGHT;
use crate::metric::DEFAULT_MAX_QUERY_WIDTH;
use crate::metrics::RoadmapMetrics;
use crate::model::GraphDirection;
use crate::proximity::{LinearIndex, NavigableIndex, NavigableParams, ProximityIndex};

/// Which proximity index backs a roadmap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exact scan over every entry.
    Linear,
    /// Approximate navigable neighbor graph.
    #[default]
    Navigable,
}

/// Proximity index selection and tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Index implementation.
    pub kind: IndexKind,
    /// Links per entry for [`IndexKind::Navigable`].
    pub degree: usize,
    /// Beam width for [`IndexKind::Navigable`].
    pub search_width: usize,
    /// Size below which [`IndexKind::Navigable`] scans exhaustively.
    pub exhaustive_below: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        let params = NavigableParams::default();
        Self {
            kind: IndexKind::default(),
            degree: params.degree,
            search_width: params.search_width,
            exhaustive_below: params.exhaustive_below,
        }
    }
}

impl IndexOptions {
    /// Parameters for a [`NavigableIndex`].
    pub fn navigable_params(&self) -> NavigableParams {
        NavigableParams {
            degree: self.degree,
            search_width: self.search_width,
            exhaustive_below: self.exhaustive_below,
            max_links: self.degree.saturating_mul(2),
            ..NavigableParams::default()
        }
    }

    /// Builds the configured index.
    pub fn build(&self) -> Box<dyn ProximityIndex> {
        match self.kind {
            IndexKind::Linear => Box::new(LinearIndex::new()),
            IndexKind::Navigable => Box::new(NavigableIndex::new(self.navigable_params())),
        }
    }
}

/// Configuration options supplied when creating a [`crate::roadmap::Roadmap`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapOptions {
    /// Largest `k` accepted by k-nearest queries.
    pub max_query_width: usize,
    /// Weight of edges added without one.
    pub default_edge_weight: f64,
    /// Whether edges are one-way.
    pub direction: GraphDirection,
    /// Proximity index settings.
    pub index: IndexOptions,
    /// Optional metrics collection implementation.
    #[serde(skip)]
    pub metrics: Option<Arc<dyn RoadmapMetrics>>,
}

impl std::fmt::Debug for RoadmapOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadmapOptions")
            .field("max_query_width", &self.max_query_width)
            .field("default_edge_weight", &self.default_edge_weight)
            .field("direction", &self.direction)
            .field("index", &self.index)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Default for RoadmapOptions {
    fn default() -> Self {
        Self {
            max_query_width: DEFAULT_MAX_QUERY_WIDTH,
            default_edge_weight: DEFAULT_EDGE_WEIGHT,
            direction: GraphDirection::Undirected,
            index: IndexOptions::default(),
            metrics: None,
        }
    }
}

impl RoadmapOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            SenderoError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.default_edge_weight.is_nan() || self.default_edge_weight < 0.0 {
            return Err(SenderoError::Config(format!(
                "default_edge_weight must be non-negative, got {}",
                self.default_edge_weight
            )));
        }
        if self.max_query_width == 0 {
            return Err(SenderoError::Config("max_query_width must be positive".into()));
        }
        if self.index.degree == 0 {
            return Err(SenderoError::Config("index.degree must be positive".into()));
        }
        Ok(())
    }

    /// Sets the largest `k` accepted by k-nearest queries.
    pub fn max_query_width(mut self, width: usize) -> Self {
        self.max_query_width = width;
        self
    }

    /// Sets the weight of edges added without one.
    pub fn default_edge_weight(mut self, weight: f64) -> Self {
        self.default_edge_weight = weight;
        self
    }

    /// Sets the edge direction.
    pub fn direction(mut self, direction: GraphDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the proximity index options.
    pub fn index(mut self, index: IndexOptions) -> Self {
        self.index = index;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn RoadmapMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
