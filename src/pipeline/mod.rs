use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::api::osrm::{DurationSource, TableError};
use crate::grid::{Grid, GridError, GridPoint, assemble, plan_batches};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("batch {batch} of {total} failed: {source}")]
    Table {
        batch: usize,
        total: usize,
        #[source]
        source: TableError,
    },

    #[error("travel time sweep cancelled after {completed} of {total} batches")]
    Cancelled { completed: usize, total: usize },
}

/// Sweep the grid: one table query per batch, strictly sequential.
///
/// Sequential on purpose - a dense grid means hundreds of requests, and the
/// routing service sets the pace. Each batch's durations are scattered back
/// to their grid indices, so the returned column lines up with the grid.
///
/// `on_batch(completed, total)` fires after every batch; progress display
/// hangs off that callback rather than living in here. `cancel` is checked
/// between batches - a cancelled sweep returns an error instead of a
/// partially filled column.
///
/// Any batch failure aborts the whole sweep. A half-swept grid is not a
/// usable dataset, so nothing is salvaged from completed batches.
pub fn fetch_travel_times<S: DurationSource + ?Sized>(
    source: &S,
    origin: GridPoint,
    grid: &Grid,
    batch_size: usize,
    mut on_batch: impl FnMut(usize, usize),
    cancel: &AtomicBool,
) -> Result<Vec<Option<f64>>, PipelineError> {
    let batches = plan_batches(grid.len(), batch_size)?;
    let total = batches.len();

    let mut results = Vec::with_capacity(total);
    for (batch_idx, range) in batches.into_iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(PipelineError::Cancelled {
                completed: batch_idx,
                total,
            });
        }

        let destinations = &grid.points()[range.clone()];
        let durations = source
            .durations(origin, destinations)
            .map_err(|source| PipelineError::Table {
                batch: batch_idx,
                total,
                source,
            })?;

        results.push((range, durations));
        on_batch(batch_idx + 1, total);
    }

    Ok(assemble(grid.len(), &results)?)
}

/// One retained grid point with its travel time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub lon: f64,
    pub lat: f64,
    pub time_sec: f64,
}

/// The grid with its duration and land columns, index-aligned.
#[derive(Debug)]
pub struct AnnotatedGrid {
    points: Vec<GridPoint>,
    time_sec: Vec<Option<f64>>,
    on_land: Vec<bool>,
}

impl AnnotatedGrid {
    pub fn new(
        grid: Grid,
        time_sec: Vec<Option<f64>>,
        on_land: Vec<bool>,
    ) -> Result<Self, GridError> {
        if time_sec.len() != grid.len() {
            return Err(GridError::LengthMismatch {
                expected: grid.len(),
                actual: time_sec.len(),
            });
        }
        if on_land.len() != grid.len() {
            return Err(GridError::LengthMismatch {
                expected: grid.len(),
                actual: on_land.len(),
            });
        }
        Ok(Self {
            points: grid.into_points(),
            time_sec,
            on_land,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn land_count(&self) -> usize {
        self.on_land.iter().filter(|&&on_land| on_land).count()
    }

    /// Rows that survive the final filter: on land, reachable, and faster
    /// than the sanity ceiling. Unreachable stays distinct from slow - a
    /// `None` duration never turns into a number here.
    pub fn retained(&self, max_time_sec: f64) -> Vec<Sample> {
        self.points
            .iter()
            .zip(&self.time_sec)
            .zip(&self.on_land)
            .filter_map(|((point, time_sec), &on_land)| {
                let time_sec = (*time_sec)?;
                if on_land && time_sec.is_finite() && time_sec < max_time_sec {
                    Some(Sample {
                        lon: point.lon,
                        lat: point.lat,
                        time_sec,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}
