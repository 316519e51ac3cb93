use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon, Point, Polygon};
use rayon::prelude::*;
use rstar::{AABB, RTree, RTreeObject};

use crate::grid::{Grid, GridPoint};

/// One clipped water polygon with its envelope for R-tree queries.
struct IndexedPolygon {
    polygon: Polygon<f64>,
    lower: [f64; 2],
    upper: [f64; 2],
}

impl RTreeObject for IndexedPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lower, self.upper)
    }
}

/// All water areas of the study region, prepared for point tests.
///
/// Construction clips every feature to the study-area boundary and bulk
/// loads the pieces into an R-tree keyed by bounding box, so a point test
/// only runs the exact intersection against the handful of polygons whose
/// envelope contains the point.
pub struct WaterMask {
    tree: RTree<IndexedPolygon>,
    polygon_count: usize,
}

impl WaterMask {
    /// Build the mask from raw water polygons and the area boundary.
    ///
    /// Features outside the boundary are discarded; features straddling it
    /// are cut down to their inside part, matching how the final map only
    /// ever shows the study area.
    pub fn new(features: Vec<Polygon<f64>>, boundary: &MultiPolygon<f64>) -> Self {
        let mut indexed = Vec::new();

        for feature in features {
            let clipped = MultiPolygon::new(vec![feature]).intersection(boundary);
            for piece in clipped {
                let Some(rect) = piece.bounding_rect() else {
                    continue;
                };
                indexed.push(IndexedPolygon {
                    lower: [rect.min().x, rect.min().y],
                    upper: [rect.max().x, rect.max().y],
                    polygon: piece,
                });
            }
        }

        let polygon_count = indexed.len();
        Self {
            tree: RTree::bulk_load(indexed),
            polygon_count,
        }
    }

    /// Number of water polygons left after clipping.
    pub fn len(&self) -> usize {
        self.polygon_count
    }

    pub fn is_empty(&self) -> bool {
        self.polygon_count == 0
    }

    /// Whether the point lies in (or on the edge of) any water polygon.
    pub fn is_water(&self, point: GridPoint) -> bool {
        let location = Point::new(point.lon, point.lat);
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([point.lon, point.lat]))
            .any(|entry| entry.polygon.intersects(&location))
    }

    /// Classify every grid point; true = on land.
    ///
    /// The per-point tests share no state, so they run in parallel; output
    /// order still matches the grid's index order.
    pub fn classify(&self, grid: &Grid) -> Vec<bool> {
        grid.points()
            .par_iter()
            .map(|&point| !self.is_water(point))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoundingBox;
    use geo::LineString;

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )
    }

    fn point(lon: f64, lat: f64) -> GridPoint {
        GridPoint { lon, lat }
    }

    #[test]
    fn test_point_in_water() {
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        let mask = WaterMask::new(vec![square(1.0, 1.0, 3.0, 3.0)], &boundary);

        assert!(mask.is_water(point(2.0, 2.0)));
        assert!(!mask.is_water(point(8.0, 8.0)));
    }

    #[test]
    fn test_water_outside_boundary_clipped_away() {
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        let mask = WaterMask::new(vec![square(20.0, 20.0, 25.0, 25.0)], &boundary);

        assert!(mask.is_empty());
        assert!(!mask.is_water(point(22.0, 22.0)));
    }

    #[test]
    fn test_water_straddling_boundary() {
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        // Water extends from inside the boundary out past its east edge.
        let mask = WaterMask::new(vec![square(8.0, 4.0, 15.0, 6.0)], &boundary);

        assert!(mask.is_water(point(9.0, 5.0)));
        assert!(!mask.is_water(point(12.0, 5.0)));
    }

    #[test]
    fn test_classify_grid() {
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        let mask = WaterMask::new(vec![square(0.0, 0.0, 1.6, 1.6)], &boundary);

        let grid = Grid::generate(BoundingBox::new(0.5, 2.5, 0.5, 2.5), 1.0).unwrap();
        let on_land = mask.classify(&grid);

        assert_eq!(on_land.len(), grid.len());
        for (i, &land) in on_land.iter().enumerate() {
            let p = grid.get(i).unwrap();
            let expected_water = p.lon < 1.6 && p.lat < 1.6;
            assert_eq!(land, !expected_water, "point ({}, {})", p.lon, p.lat);
        }
    }

    #[test]
    fn test_no_water_features() {
        let boundary = MultiPolygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        let mask = WaterMask::new(vec![], &boundary);

        assert!(mask.is_empty());
        assert!(!mask.is_water(point(5.0, 5.0)));
    }
}
