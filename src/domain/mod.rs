pub mod water;

pub use water::WaterRing;
