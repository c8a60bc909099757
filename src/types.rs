//! Identifier and coordinate types shared across the roadmap, the point
//! space, and the proximity index.

use std::fmt;

use smallvec::SmallVec;

use crate::arena::Handle;

/// Coordinates of a configuration. Inline up to eight dimensions.
pub type Coords = SmallVec<[f64; 8]>;

/// Dense vertex identifier, in `[0, vertex_count)` outside bulk mode.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct VertexId(pub u32);

/// Edge identifier. Dense until edges are removed; see
/// [`crate::graph::Graph::update_edge_ids`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u32);

/// Handle to a point owned by a [`crate::space::PointSpace`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct PointId(pub Handle);

/// Handle to a proximity entry owned by a [`crate::metric::DistanceMetric`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ProxHandle(pub Handle);

impl VertexId {
    /// Returns the id as a slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    /// Returns the id as a slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl fmt::Display for ProxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(value: u32) -> Self {
        VertexId(value)
    }
}

impl From<VertexId> for u32 {
    fn from(value: VertexId) -> Self {
        value.0
    }
}

impl From<u32> for EdgeId {
    fn from(value: u32) -> Self {
        EdgeId(value)
    }
}

impl From<EdgeId> for u32 {
    fn from(value: EdgeId) -> Self {
        value.0
    }
}
