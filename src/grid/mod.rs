pub mod assemble;
pub mod batch;
pub mod error;
pub mod generate;

pub use assemble::assemble;
pub use batch::plan_batches;
pub use error::GridError;
pub use generate::{BoundingBox, Grid, GridPoint};
