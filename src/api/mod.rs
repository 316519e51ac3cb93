pub mod nominatim;
pub mod osrm;
pub mod overpass;

pub use nominatim::fetch_boundary;
pub use osrm::{DurationSource, OsrmClient, OsrmClientConfig, TableError};
pub use overpass::{OverpassResponse, fetch_water};
