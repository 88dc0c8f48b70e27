//! I/O operations for reading and writing geospatial data

mod native;
mod series;

pub use native::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use series::{is_raster_path, load_series, RASTER_EXTENSIONS};
