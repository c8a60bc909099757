//! Newline-delimited text encoding of a roadmap graph.
//!
//! ```text
//! <vertex_count>
//! <id> <point coordinates...> <vertex payload...>
//! <edge_count>
//! <source_id> <target_id> <edge payload...> <weight>
//! ```
//!
//! Ids on disk are the dense ordinals `0..vertex_count` of the saved graph.
//! Loading into a graph that already holds `n` vertices shifts every loaded
//! id by `n`, so several files can be merged into one graph.

use std::io::{BufRead, Write};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{Result, SenderoError};
use crate::graph::Graph;
use crate::model::{EdgePayload, NodePayload};
use crate::types::VertexId;

mod tokens;

pub use tokens::{TokenReader, TokenWriter};

/// Outcome of a successful [`deserialize`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadReport {
    /// Id of the first loaded vertex. Loaded vertices occupy
    /// `first .. first + vertices`.
    pub first: VertexId,
    /// Number of vertices read.
    pub vertices: usize,
    /// Number of edges read.
    pub edges: usize,
    /// Shift applied to on-disk vertex ids.
    pub offset: usize,
    /// Component count after the load.
    pub components: usize,
}

impl LoadReport {
    /// Ids of the loaded vertices.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        let start = self.first.0;
        (start..start + self.vertices as u32).map(VertexId)
    }
}

/// Writes `graph` to `out`. Every vertex must carry a point.
pub fn serialize<N: NodePayload, E: EdgePayload>(
    graph: &Graph<N, E>,
    out: &mut dyn Write,
) -> Result<()> {
    let space = graph.space().ok_or(SenderoError::SpaceNotLinked)?;
    let mut writer = TokenWriter::new(out);
    let mut ordinal: FxHashMap<VertexId, usize> = FxHashMap::default();

    writer.write(graph.vertex_count())?;
    writer.end_line()?;
    for (i, node) in graph.vertices().enumerate() {
        let point = node.point().ok_or_else(|| {
            SenderoError::InvalidArgument(format!("vertex {} has no point", node.node_id()))
        })?;
        ordinal.insert(node.node_id(), i);
        writer.write(i)?;
        space.encode_point(point, &mut writer)?;
        node.payload.encode(&mut writer)?;
        writer.end_line()?;
    }

    writer.write(graph.edge_count())?;
    writer.end_line()?;
    for link in graph.edges() {
        let (Some(src), Some(dst)) = (ordinal.get(&link.source()), ordinal.get(&link.target()))
        else {
            return Err(SenderoError::Corruption("edge endpoint is not a live vertex"));
        };
        writer.write(src)?;
        writer.write(dst)?;
        link.payload.encode(&mut writer)?;
        let weight = graph
            .get_weight(link.edge_id())
            .ok_or(SenderoError::Corruption("edge without weight"))?;
        writer.write(weight)?;
        writer.end_line()?;
    }
    writer.flush()?;
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "codec.serialize.done"
    );
    Ok(())
}

/// Reads a graph written by [`serialize`] and appends it to `graph`.
///
/// On error the vertices and edges read so far stay in `graph`; callers
/// should discard it. Component labels are recomputed once at the end.
pub fn deserialize<N: NodePayload, E: EdgePayload>(
    graph: &mut Graph<N, E>,
    input: &mut dyn BufRead,
) -> Result<LoadReport> {
    let space = graph.space().cloned().ok_or(SenderoError::SpaceNotLinked)?;
    if graph.is_bulk() {
        return Err(SenderoError::InvalidArgument(
            "cannot load into a graph with an active bulk pass".into(),
        ));
    }
    let offset = graph.vertex_count();
    let first = VertexId(offset as u32);
    let mut reader = TokenReader::new(input);

    let vertex_total: usize = reader.read("vertex count")?;
    let mut node_map: FxHashMap<usize, VertexId> = FxHashMap::default();
    for _ in 0..vertex_total {
        let disk_id: usize = reader.read("vertex id")?;
        let v = graph.add_vertex();
        let point = space.alloc_point();
        if let Some(stale) = graph.set_point(v, point)? {
            space.free_point(stale);
        }
        space.decode_point(point, &mut reader)?;
        if let Some(node) = graph.vertex_mut(v) {
            node.payload.decode(&mut reader)?;
        }
        let key = disk_id
            .checked_add(offset)
            .ok_or_else(|| reader.error(format!("vertex id {disk_id} is out of range")))?;
        if node_map.insert(key, v).is_some() {
            return Err(reader.error(format!("duplicate vertex id {disk_id}")));
        }
    }

    let edge_total: usize = reader.read("edge count")?;
    for _ in 0..edge_total {
        let from: usize = reader.read("edge source")?;
        let to: usize = reader.read("edge target")?;
        let (Some(src), Some(dst)) = (
            lookup(&node_map, from, offset),
            lookup(&node_map, to, offset),
        ) else {
            return Err(reader.error(format!("edge {from} -> {to} references an unknown vertex")));
        };
        let mut payload = E::default();
        payload.decode(&mut reader)?;
        let weight = reader.read_f64("edge weight")?;
        graph
            .add_edge_with(src, dst, weight, payload)
            .map_err(|err| reader.error(err.to_string()))?;
    }

    let components = graph.update_components();
    debug!(
        vertices = vertex_total,
        edges = edge_total,
        offset,
        components,
        "codec.deserialize.done"
    );
    Ok(LoadReport {
        first,
        vertices: vertex_total,
        edges: edge_total,
        offset,
        components,
    })
}

fn lookup(
    node_map: &FxHashMap<usize, VertexId>,
    disk_id: usize,
    offset: usize,
) -> Option<VertexId> {
    node_map.get(&disk_id.checked_add(offset)?).copied()
}
