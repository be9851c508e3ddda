//! Common geospatial types shared by the enviro-ingest fetch datasets.

pub mod aoi;
pub mod bbox;
pub mod error;
pub mod tile;
pub mod time;

pub use aoi::Aoi;
pub use bbox::BoundingBox;
pub use error::{IngestError, IngestResult};
pub use tile::{latlon_to_tile, tile_bounds, tiles_for_bbox, TileCoord};
pub use time::{composite_days, is_valid_doy};
