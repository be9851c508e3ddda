//! Geographic bounding box type and operations.

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// A geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse a "min_lon,min_lat,max_lon,max_lat" string.
    pub fn from_csv(s: &str) -> Result<Self, IngestError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(IngestError::InvalidBbox(format!(
                "{}: expected 'min_lon,min_lat,max_lon,max_lat'",
                s
            )));
        }

        let mut vals = [0.0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            vals[i] = part
                .parse()
                .map_err(|_| IngestError::InvalidBbox(format!("invalid number: {}", part)))?;
        }

        Ok(Self::new(vals[0], vals[1], vals[2], vals[3]))
    }

    /// Width of the bounding box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.max_lon
            && self.max_lon > other.min_lon
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Grow this bbox to include a point.
    pub fn expand_to(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// A degenerate bbox around a single point, for use with `expand_to`.
    pub fn around_point(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let bbox = BoundingBox::from_csv("-124.482003,32.528832,-114.131211,42.009518").unwrap();
        assert_eq!(bbox.min_lon, -124.482003);
        assert_eq!(bbox.min_lat, 32.528832);
        assert_eq!(bbox.max_lon, -114.131211);
        assert_eq!(bbox.max_lat, 42.009518);
    }

    #[test]
    fn test_parse_csv_rejects_garbage() {
        assert!(BoundingBox::from_csv("1,2,3").is_err());
        assert!(BoundingBox::from_csv("a,b,c,d").is_err());
    }

    #[test]
    fn test_contains_and_intersects() {
        let ca = BoundingBox::new(-124.5, 32.5, -114.1, 42.0);
        assert!(ca.contains_point(-118.2437, 34.0522)); // Los Angeles
        assert!(!ca.contains_point(-74.0060, 40.7128)); // New York

        let nv = BoundingBox::new(-120.0, 35.0, -114.0, 42.0);
        assert!(ca.intersects(&nv));

        let fl = BoundingBox::new(-87.6, 24.5, -80.0, 31.0);
        assert!(!ca.intersects(&fl));
    }

    #[test]
    fn test_expand_to() {
        let mut bbox = BoundingBox::around_point(-120.0, 36.0);
        bbox.expand_to(-118.0, 34.0);
        bbox.expand_to(-122.0, 38.0);
        assert_eq!(bbox.min_lon, -122.0);
        assert_eq!(bbox.max_lon, -118.0);
        assert_eq!(bbox.min_lat, 34.0);
        assert_eq!(bbox.max_lat, 38.0);
    }
}
