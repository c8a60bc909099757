use parking_lot::Mutex;

use super::PointSpace;
use crate::arena::Arena;
use crate::error::{Result, SenderoError};
use crate::types::{Coords, PointId};

/// Real vector space with an optionally weighted Euclidean distance.
///
/// Points live in an internal generational arena, so a freed [`PointId`]
/// never aliases a later allocation.
pub struct EuclideanSpace {
    dimension: usize,
    weights: Option<Coords>,
    points: Mutex<Arena<Coords>>,
}

impl EuclideanSpace {
    /// Creates a space of `dimension` coordinates.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            weights: None,
            points: Mutex::new(Arena::new()),
        }
    }

    /// Scales each axis by `weights` before measuring distance.
    pub fn with_weights(dimension: usize, weights: &[f64]) -> Result<Self> {
        if weights.len() != dimension {
            return Err(SenderoError::InvalidArgument(format!(
                "expected {dimension} axis weights, got {}",
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SenderoError::InvalidArgument(
                "axis weights must be finite and non-negative".into(),
            ));
        }
        Ok(Self {
            dimension,
            weights: Some(weights.iter().copied().collect()),
            points: Mutex::new(Arena::new()),
        })
    }
}

impl PointSpace for EuclideanSpace {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn alloc_point(&self) -> PointId {
        let zeroed: Coords = std::iter::repeat(0.0).take(self.dimension).collect();
        PointId(self.points.lock().insert(zeroed))
    }

    fn free_point(&self, point: PointId) -> bool {
        self.points.lock().remove(point.0).is_some()
    }

    fn read_point(&self, point: PointId) -> Option<Coords> {
        self.points.lock().get(point.0).cloned()
    }

    fn write_point(&self, point: PointId, coords: &[f64]) -> Result<()> {
        if coords.len() != self.dimension {
            return Err(SenderoError::InvalidArgument(format!(
                "expected {} coordinates, got {}",
                self.dimension,
                coords.len()
            )));
        }
        let mut points = self.points.lock();
        let slot = points.get_mut(point.0).ok_or(SenderoError::NotFound("point"))?;
        slot.clear();
        slot.extend_from_slice(coords);
        Ok(())
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match &self.weights {
            None => super::euclidean(a, b),
            Some(weights) => a
                .iter()
                .zip(b)
                .zip(weights.iter())
                .map(|((x, y), w)| {
                    let d = (x - y) * w;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
        }
    }

    fn live_points(&self) -> usize {
        self.points.lock().len()
    }
}
