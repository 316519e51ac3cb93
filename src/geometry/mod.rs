pub mod water;

pub use water::WaterMask;
