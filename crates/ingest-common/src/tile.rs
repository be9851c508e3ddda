//! Web Mercator (slippy map) tile math.
//!
//! Used to enumerate the terrain tiles covering an area of interest at a
//! fixed zoom level.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Latitude limit of the Web Mercator projection.
const MERCATOR_LAT_LIMIT: f64 = 85.0511287798066;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Convert lat/lon to the Web Mercator tile containing it.
pub fn latlon_to_tile(lat: f64, lon: f64, zoom: u32) -> TileCoord {
    let lat = lat.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT);
    let n = 2u32.pow(zoom) as f64;

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();

    // Points on the antimeridian / pole edge fall into the last tile
    let max = n - 1.0;
    TileCoord {
        z: zoom,
        x: x.clamp(0.0, max) as u32,
        y: y.clamp(0.0, max) as u32,
    }
}

/// Convert a tile coordinate to its lat/lon bounds.
pub fn tile_bounds(coord: &TileCoord) -> BoundingBox {
    let n = 2u32.pow(coord.z) as f64;

    let lon_min = coord.x as f64 / n * 360.0 - 180.0;
    let lon_max = (coord.x + 1) as f64 / n * 360.0 - 180.0;

    let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * coord.y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (coord.y + 1) as f64 / n))
        .sinh()
        .atan()
        .to_degrees();

    BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
}

/// Enumerate every tile touching a bounding box at the given zoom level.
///
/// Tiles are yielded row-major, west to east then north to south.
pub fn tiles_for_bbox(bbox: &BoundingBox, zoom: u32) -> Vec<TileCoord> {
    let top_left = latlon_to_tile(bbox.max_lat, bbox.min_lon, zoom);
    let bottom_right = latlon_to_tile(bbox.min_lat, bbox.max_lon, zoom);

    let mut tiles = Vec::new();
    for y in top_left.y..=bottom_right.y {
        for x in top_left.x..=bottom_right.x {
            tiles.push(TileCoord { z: zoom, x, y });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlon_to_tile_origin() {
        let coord = latlon_to_tile(0.0, 0.0, 0);
        assert_eq!(coord, TileCoord { z: 0, x: 0, y: 0 });
    }

    #[test]
    fn test_latlon_to_tile_nyc() {
        let coord = latlon_to_tile(40.7128, -74.0060, 10);
        assert_eq!(coord.z, 10);
        assert!(coord.x > 290 && coord.x < 310);
        assert!(coord.y > 370 && coord.y < 400);
    }

    #[test]
    fn test_tile_bounds_roundtrip() {
        let coord = TileCoord::new(8, 42, 99);
        let bounds = tile_bounds(&coord);

        // Center of the tile maps back to the same tile
        let center_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
        let center_lon = (bounds.min_lon + bounds.max_lon) / 2.0;
        assert_eq!(latlon_to_tile(center_lat, center_lon, 8), coord);
    }

    #[test]
    fn test_tiles_for_california_z8() {
        let ca = BoundingBox::new(-124.482003, 32.528832, -114.131211, 42.009518);
        let tiles = tiles_for_bbox(&ca, 8);

        assert!(!tiles.is_empty());
        // Every tile's bounds must intersect the bbox
        for tile in &tiles {
            assert_eq!(tile.z, 8);
            assert!(tile_bounds(tile).intersects(&ca));
        }

        // The grid is a full rectangle
        let min_x = tiles.iter().map(|t| t.x).min().unwrap();
        let max_x = tiles.iter().map(|t| t.x).max().unwrap();
        let min_y = tiles.iter().map(|t| t.y).min().unwrap();
        let max_y = tiles.iter().map(|t| t.y).max().unwrap();
        let expected = (max_x - min_x + 1) as usize * (max_y - min_y + 1) as usize;
        assert_eq!(tiles.len(), expected);
    }

    #[test]
    fn test_tiles_single_point() {
        let point = BoundingBox::around_point(-118.2437, 34.0522);
        let tiles = tiles_for_bbox(&point, 8);
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn test_polar_clamping() {
        // Latitudes beyond the Mercator limit clamp into the valid range
        let coord = latlon_to_tile(89.9, 0.0, 4);
        assert_eq!(coord.y, 0);
        let coord = latlon_to_tile(-89.9, 0.0, 4);
        assert_eq!(coord.y, 15);
    }
}
