//! Point allocation and distance for configuration spaces.
//!
//! A roadmap never owns point memory. Vertices hold [`PointId`]s issued by a
//! [`PointSpace`], and the space stays responsible for allocating, freeing,
//! and encoding those points.

use std::sync::Arc;

use crate::codec::{TokenReader, TokenWriter};
use crate::error::{Result, SenderoError};
use crate::types::{Coords, PointId};

mod euclidean;

pub use euclidean::EuclideanSpace;

/// Distance function injected into a [`crate::metric::DistanceMetric`].
///
/// Must return a non-negative value and should be symmetric.
pub type DistanceFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// Allocator, codec, and distance for the points of one configuration space.
pub trait PointSpace: Send + Sync {
    /// Number of coordinates per point.
    fn dimension(&self) -> usize;

    /// Allocates a zeroed point.
    fn alloc_point(&self) -> PointId;

    /// Releases a point. Returns `false` if it was already freed.
    fn free_point(&self, point: PointId) -> bool;

    /// Copies out the coordinates of a live point.
    fn read_point(&self, point: PointId) -> Option<Coords>;

    /// Overwrites the coordinates of a live point.
    fn write_point(&self, point: PointId, coords: &[f64]) -> Result<()>;

    /// Distance between two coordinate vectors of this space.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Number of points currently allocated.
    fn live_points(&self) -> usize;

    /// Allocates a point initialized to `coords`.
    fn alloc_with(&self, coords: &[f64]) -> Result<PointId> {
        let point = self.alloc_point();
        if let Err(err) = self.write_point(point, coords) {
            self.free_point(point);
            return Err(err);
        }
        Ok(point)
    }

    /// Writes the text encoding of `point`.
    fn encode_point(&self, point: PointId, out: &mut TokenWriter<'_>) -> Result<()> {
        let coords = self.read_point(point).ok_or(SenderoError::NotFound("point"))?;
        for value in coords {
            out.write(value)?;
        }
        Ok(())
    }

    /// Reads the text encoding produced by [`PointSpace::encode_point`] into
    /// an already allocated `point`.
    fn decode_point(&self, point: PointId, input: &mut TokenReader<'_>) -> Result<()> {
        let mut coords = Coords::with_capacity(self.dimension());
        for _ in 0..self.dimension() {
            coords.push(input.read_f64("point coordinate")?);
        }
        self.write_point(point, &coords)
    }
}

/// Wraps the distance of `space` as an injectable [`DistanceFn`].
pub fn distance_fn(space: &Arc<dyn PointSpace>) -> DistanceFn {
    let space = Arc::clone(space);
    Arc::new(move |a: &[f64], b: &[f64]| space.distance(a, b))
}

/// Plain Euclidean distance.
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
