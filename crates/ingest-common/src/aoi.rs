//! Area-of-interest loading.
//!
//! AOIs are GeoJSON polygons on disk. Only the geometry is read; feature
//! properties are ignored.

use std::path::Path;

use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::error::{IngestError, IngestResult};

/// An area of interest: polygon rings plus their bounding box.
#[derive(Debug, Clone)]
pub struct Aoi {
    /// Exterior rings of every polygon in the AOI, as (lon, lat) pairs.
    pub rings: Vec<Vec<(f64, f64)>>,
    pub bbox: BoundingBox,
}

impl Aoi {
    /// Load an AOI from a GeoJSON file.
    pub fn load(path: &Path) -> IngestResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    /// Parse an AOI from GeoJSON text.
    ///
    /// Accepts a FeatureCollection, a single Feature, or a bare geometry.
    /// Polygon and MultiPolygon geometries contribute their exterior rings.
    pub fn from_geojson_str(s: &str) -> IngestResult<Self> {
        let value: Value = serde_json::from_str(s)?;

        let mut rings = Vec::new();
        collect_rings(&value, &mut rings)?;

        if rings.is_empty() {
            return Err(IngestError::InvalidAoi(
                "no Polygon or MultiPolygon geometry found".to_string(),
            ));
        }

        let (lon0, lat0) = rings[0][0];
        let mut bbox = BoundingBox::around_point(lon0, lat0);
        for ring in &rings {
            for &(lon, lat) in ring {
                bbox.expand_to(lon, lat);
            }
        }

        Ok(Self { rings, bbox })
    }

    /// The exterior ring of the first polygon, for APIs that take a single region.
    pub fn exterior_ring(&self) -> &[(f64, f64)] {
        &self.rings[0]
    }
}

fn collect_rings(value: &Value, rings: &mut Vec<Vec<(f64, f64)>>) -> IngestResult<()> {
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            if let Some(features) = value.get("features").and_then(Value::as_array) {
                for feature in features {
                    collect_rings(feature, rings)?;
                }
            }
            Ok(())
        }
        Some("Feature") => {
            if let Some(geometry) = value.get("geometry") {
                collect_rings(geometry, rings)?;
            }
            Ok(())
        }
        Some("Polygon") => {
            if let Some(coords) = value.get("coordinates").and_then(Value::as_array) {
                if let Some(exterior) = coords.first() {
                    rings.push(parse_ring(exterior)?);
                }
            }
            Ok(())
        }
        Some("MultiPolygon") => {
            if let Some(polys) = value.get("coordinates").and_then(Value::as_array) {
                for poly in polys {
                    if let Some(exterior) = poly.as_array().and_then(|p| p.first()) {
                        rings.push(parse_ring(exterior)?);
                    }
                }
            }
            Ok(())
        }
        // Other geometry types carry no area; skip them
        Some(_) => Ok(()),
        None => Err(IngestError::InvalidAoi("missing GeoJSON type".to_string())),
    }
}

fn parse_ring(ring: &Value) -> IngestResult<Vec<(f64, f64)>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| IngestError::InvalidAoi("ring is not an array".to_string()))?;

    let mut out = Vec::with_capacity(positions.len());
    for position in positions {
        let pair = position
            .as_array()
            .ok_or_else(|| IngestError::InvalidAoi("position is not an array".to_string()))?;
        if pair.len() < 2 {
            return Err(IngestError::InvalidAoi(
                "position has fewer than two coordinates".to_string(),
            ));
        }
        let lon = pair[0]
            .as_f64()
            .ok_or_else(|| IngestError::InvalidAoi("non-numeric longitude".to_string()))?;
        let lat = pair[1]
            .as_f64()
            .ok_or_else(|| IngestError::InvalidAoi("non-numeric latitude".to_string()))?;
        out.push((lon, lat));
    }

    if out.len() < 4 {
        return Err(IngestError::InvalidAoi(format!(
            "ring has only {} positions",
            out.len()
        )));
    }

    Ok(out)
}
