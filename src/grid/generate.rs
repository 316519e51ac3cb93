use super::GridError;

/// A single destination point in WGS84 degrees.
///
/// Identity is the point's positional index in the grid's generation order,
/// so the struct itself carries no id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Study-area bounds in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }
}

/// A fixed-step destination grid over a bounding box.
///
/// Points are stored in row-major order: the outer loop walks latitude, the
/// inner loop longitude, so index `i` maps back to
/// `lat_idx = i / num_lons, lon_idx = i % num_lons`. Batch results are
/// scattered back by index, which is why this order must stay deterministic.
#[derive(Debug, Clone)]
pub struct Grid {
    points: Vec<GridPoint>,
    num_lats: usize,
    num_lons: usize,
}

impl Grid {
    /// Generate the grid for `bounds` at `step` degrees.
    ///
    /// Both axes follow the inclusive convention `min, min+step, ...` up to
    /// and including the first value at or past `max`. The endpoint is kept
    /// even when it overshoots `max` by less than one step; downstream
    /// datasets depend on that exact point set, so don't "fix" it.
    pub fn generate(bounds: BoundingBox, step: f64) -> Result<Self, GridError> {
        if !(bounds.lat_min < bounds.lat_max) || !(bounds.lon_min < bounds.lon_max) || !(step > 0.0)
        {
            return Err(GridError::InvalidRange {
                lat_min: bounds.lat_min,
                lat_max: bounds.lat_max,
                lon_min: bounds.lon_min,
                lon_max: bounds.lon_max,
                step,
            });
        }

        let lats = axis_values(bounds.lat_min, bounds.lat_max, step);
        let lons = axis_values(bounds.lon_min, bounds.lon_max, step);

        let mut points = Vec::with_capacity(lats.len() * lons.len());
        for &lat in &lats {
            for &lon in &lons {
                points.push(GridPoint { lon, lat });
            }
        }

        Ok(Self {
            points,
            num_lats: lats.len(),
            num_lons: lons.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<GridPoint> {
        self.points
    }

    pub fn num_lats(&self) -> usize {
        self.num_lats
    }

    pub fn num_lons(&self) -> usize {
        self.num_lons
    }

    pub fn get(&self, index: usize) -> Option<GridPoint> {
        self.points.get(index).copied()
    }
}

/// Axis values `min, min+step, ...` while `value < max + step`.
///
/// Values are computed as `min + i * step` rather than by accumulation, so
/// rounding error does not drift with axis length.
fn axis_values(min: f64, max: f64, step: f64) -> Vec<f64> {
    let stop = max + step;
    let mut values = Vec::new();
    let mut i = 0usize;
    loop {
        let value = min + step * i as f64;
        if value >= stop {
            break;
        }
        values.push(value);
        i += 1;
    }
    values
}
