use geo::{LineString, Polygon};

/// A closed ring of (lon, lat) points outlining one water area.
///
/// Coordinates are kept in lon/lat order throughout the crate to match the
/// OSRM and GeoJSON conventions.
#[derive(Debug, Clone)]
pub struct WaterRing {
    pub points: Vec<(f64, f64)>,
}

impl WaterRing {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn is_valid(&self) -> bool {
        self.points.len() >= 4
    }

    /// Convert to a `geo` polygon for containment and clipping math.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.points.clone()), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_validity() {
        let open = WaterRing::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(!open.is_valid());

        let closed = WaterRing::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(closed.is_valid());
    }

    #[test]
    fn test_to_polygon() {
        let ring = WaterRing::new(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)]);
        let polygon = ring.to_polygon();

        assert_eq!(polygon.exterior().coords().count(), 4);
        assert!(polygon.interiors().is_empty());
    }
}
