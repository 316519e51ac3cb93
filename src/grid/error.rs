use thiserror::Error;

/// Errors from grid construction, batch planning, and result assembly.
///
/// The coverage variants (`IncompleteCoverage`, `OverlappingWrite`,
/// `BatchOutOfRange`, `LengthMismatch`) signal an internal consistency bug
/// rather than bad input and are not recoverable.
#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error(
        "invalid grid range: lat {lat_min}..{lat_max}, lon {lon_min}..{lon_max}, step {step}"
    )]
    InvalidRange {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
        step: f64,
    },

    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("batch range ends at {end} but the grid has {len} points")]
    BatchOutOfRange { end: usize, len: usize },

    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("grid index {index} written more than once")]
    OverlappingWrite { index: usize },

    #[error("no result written for grid index {index}")]
    IncompleteCoverage { index: usize },
}
