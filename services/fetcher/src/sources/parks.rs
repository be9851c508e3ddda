//! OSM park boundaries within the area of interest.
//!
//! Queries the Overpass API for the configured tag (leisure=park by
//! default) within the AOI bounding box and writes the result as a GeoJSON
//! FeatureCollection. All geometry types are kept, not just polygons.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use ingest_common::{Aoi, BoundingBox, IngestError};

use crate::config::ParksConfig;
use crate::fetch::FileOutcome;
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct OsmParks;

#[async_trait]
impl Dataset for OsmParks {
    fn name(&self) -> &'static str {
        "parks"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.parks;
        let dest = ctx
            .data_root
            .join("global")
            .join("parks_osm")
            .join("parks.geojson");

        let mut outcome = FetchOutcome::default();

        if dest.exists() {
            info!(path = %dest.display(), "Park boundaries already present, skipping query");
            outcome.record(FileOutcome::Skipped);
            return Ok(outcome);
        }

        let aoi = Aoi::load(&ctx.aoi_path)?;
        let query = overpass_query(cfg, &aoi.bbox);

        info!(bbox = ?aoi.bbox, "Querying OSM for parks in AOI");

        let request = ctx
            .fetcher
            .client()
            .post(&cfg.overpass_url)
            .form(&[("data", query.as_str())]);

        let body = ctx.fetcher.fetch_text(request).await?;
        let response: Value = serde_json::from_str(&body)?;
        let feature_collection = overpass_to_geojson(&response)?;

        let serialized = serde_json::to_string(&feature_collection)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &serialized).await?;

        let feature_count = feature_collection["features"]
            .as_array()
            .map(|f| f.len())
            .unwrap_or(0);
        info!(path = %dest.display(), features = feature_count, "Saved park boundaries");

        outcome.record(FileOutcome::Written(serialized.len() as u64));
        Ok(outcome)
    }
}

/// Build the Overpass QL query for the AOI bbox (south,west,north,east order).
fn overpass_query(cfg: &ParksConfig, bbox: &BoundingBox) -> String {
    let scope = format!(
        "{},{},{},{}",
        bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
    );
    format!(
        "[out:json][timeout:{timeout}];\
         (node[\"{k}\"=\"{v}\"]({scope});\
          way[\"{k}\"=\"{v}\"]({scope});\
          relation[\"{k}\"=\"{v}\"]({scope}););\
         out geom;",
        timeout = cfg.timeout_secs,
        k = cfg.tag_key,
        v = cfg.tag_value,
        scope = scope,
    )
}

/// Convert an Overpass JSON response into a GeoJSON FeatureCollection.
fn overpass_to_geojson(response: &Value) -> Result<Value, IngestError> {
    let elements = response
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            IngestError::MalformedPayload("Overpass response has no elements array".to_string())
        })?;

    let mut features = Vec::new();

    for element in elements {
        let kind = element.get("type").and_then(Value::as_str).unwrap_or("");

        let geometry = match kind {
            "node" => node_geometry(element),
            "way" => way_geometry(element),
            "relation" => relation_geometry(element),
            _ => None,
        };

        let Some(geometry) = geometry else {
            continue;
        };

        let id = element.get("id").and_then(Value::as_u64).unwrap_or(0);
        let properties = element
            .get("tags")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        features.push(json!({
            "type": "Feature",
            "id": format!("{}/{}", kind, id),
            "properties": properties,
            "geometry": geometry,
        }));
    }

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
    }))
}

fn node_geometry(element: &Value) -> Option<Value> {
    let lon = element.get("lon").and_then(Value::as_f64)?;
    let lat = element.get("lat").and_then(Value::as_f64)?;
    Some(json!({ "type": "Point", "coordinates": [lon, lat] }))
}

fn way_geometry(element: &Value) -> Option<Value> {
    let coords = positions(element.get("geometry")?)?;
    if coords.len() >= 4 && coords.first() == coords.last() {
        Some(json!({ "type": "Polygon", "coordinates": [coords] }))
    } else {
        Some(json!({ "type": "LineString", "coordinates": coords }))
    }
}

fn relation_geometry(element: &Value) -> Option<Value> {
    let members = element.get("members").and_then(Value::as_array)?;

    let lines: Vec<Vec<[f64; 2]>> = members
        .iter()
        .filter_map(|m| m.get("geometry").and_then(positions))
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(json!({ "type": "MultiLineString", "coordinates": lines }))
}

fn positions(geometry: &Value) -> Option<Vec<[f64; 2]>> {
    let points = geometry.as_array()?;
    let mut coords = Vec::with_capacity(points.len());
    for point in points {
        let lon = point.get("lon").and_then(Value::as_f64)?;
        let lat = point.get("lat").and_then(Value::as_f64)?;
        coords.push([lon, lat]);
    }
    Some(coords)
}
