use super::EdgePayload;
use crate::codec::{TokenReader, TokenWriter};
use crate::error::{Result, SenderoError};

/// Motion segment owned by an edge: the waypoints traversed between its
/// endpoints, stored flat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSegment {
    dimension: usize,
    coords: Vec<f64>,
}

impl PathSegment {
    /// Creates an empty segment for points of `dimension` coordinates.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            coords: Vec::new(),
        }
    }

    /// Coordinates per waypoint.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.coords.len() / self.dimension
        }
    }

    /// Returns `true` when the segment has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a waypoint.
    pub fn push(&mut self, waypoint: &[f64]) -> Result<()> {
        if self.dimension == 0 {
            self.dimension = waypoint.len();
        }
        if waypoint.len() != self.dimension || waypoint.is_empty() {
            return Err(SenderoError::InvalidArgument(format!(
                "waypoint has {} coordinates, segment expects {}",
                waypoint.len(),
                self.dimension
            )));
        }
        self.coords.extend_from_slice(waypoint);
        Ok(())
    }

    /// Iterates over waypoints in order.
    pub fn waypoints(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.coords.chunks_exact(self.dimension.max(1))
    }

    /// Sum of distances between consecutive waypoints.
    pub fn length(&self, distance: impl Fn(&[f64], &[f64]) -> f64) -> f64 {
        let mut total = 0.0;
        let mut prev: Option<&[f64]> = None;
        for wp in self.waypoints() {
            if let Some(p) = prev {
                total += distance(p, wp);
            }
            prev = Some(wp);
        }
        total
    }
}

impl EdgePayload for PathSegment {
    fn encode(&self, out: &mut TokenWriter<'_>) -> Result<()> {
        out.write(self.len())?;
        out.write(self.dimension)?;
        for value in &self.coords {
            out.write(value)?;
        }
        Ok(())
    }

    fn decode(&mut self, input: &mut TokenReader<'_>) -> Result<()> {
        let count: usize = input.read("waypoint count")?;
        let dimension: usize = input.read("waypoint dimension")?;
        if count > 0 && dimension == 0 {
            return Err(input.error("waypoints with zero dimension"));
        }
        let total = count
            .checked_mul(dimension)
            .ok_or_else(|| input.error("waypoint count is out of range"))?;
        self.dimension = dimension;
        self.coords.clear();
        for _ in 0..total {
            self.coords.push(input.read_f64("waypoint coordinate")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::euclidean;
    use std::io::Cursor;

    #[test]
    fn length_sums_hops() {
        let mut seg = PathSegment::new(2);
        seg.push(&[0.0, 0.0]).unwrap();
        seg.push(&[3.0, 4.0]).unwrap();
        seg.push(&[3.0, 5.0]).unwrap();
        assert_eq!(seg.len(), 3);
        assert_eq!(seg.length(euclidean), 6.0);
        assert!(seg.push(&[1.0]).is_err());
    }

    #[test]
    fn payload_codec() {
        let mut seg = PathSegment::new(2);
        seg.push(&[0.5, 1.5]).unwrap();
        seg.push(&[2.0, -1.0]).unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = TokenWriter::new(&mut buf);
            seg.encode(&mut writer).unwrap();
            writer.write(0.25).unwrap();
            writer.end_line().unwrap();
        }
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "2 2 0.5 1.5 2 -1 0.25\n");

        let mut input = Cursor::new(buf);
        let mut reader = TokenReader::new(&mut input);
        let mut decoded = PathSegment::default();
        decoded.decode(&mut reader).unwrap();
        assert_eq!(decoded, seg);
        assert_eq!(reader.read_f64("weight").unwrap(), 0.25);
    }
}
