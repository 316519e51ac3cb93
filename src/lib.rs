//! timemap - Generate travel-time heat-map datasets and images from OSRM routing data

pub mod api;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod grid;
pub mod osm;
pub mod output;
pub mod pipeline;
