//! Roadmap graphs for sampling-based motion planning.
//!
//! A [`Roadmap`] stores sampled configurations as graph vertices and keeps a
//! proximity index over the same points, so a planner can ask for the
//! nearest configurations and connect them. The pieces are usable on their
//! own: [`graph::Graph`] for storage and property maps, [`metric`] and
//! [`proximity`] for nearest-neighbor queries, [`codec`] for the text
//! format, and [`search`] for shortest paths.

#![warn(missing_docs)]

pub mod arena;
pub mod cli;
pub mod codec;
pub mod error;
pub mod graph;
pub mod metric;
pub mod metrics;
pub mod model;
pub mod options;
pub mod proximity;
pub mod roadmap;
pub mod search;
pub mod space;
pub mod types;

pub use error::{Result, SenderoError};
pub use graph::{Color, Graph, Relocation, RemovedVertex};
pub use metric::{DistanceMetric, Nearest, RadiusResult};
pub use model::{GraphDirection, PathSegment, SearchContext};
pub use options::{IndexKind, IndexOptions, RoadmapOptions};
pub use roadmap::Roadmap;
pub use space::{EuclideanSpace, PointSpace};
pub use types::{EdgeId, PointId, ProxHandle, VertexId};
