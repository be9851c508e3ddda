//! Sentinel-2 NDVI export via Google Earth Engine.
//!
//! This dataset does no raster computation itself. It builds the Earth
//! Engine expression for a cloud-filtered median NDVI composite over the
//! AOI and submits it as a Drive export task; the hosted service does the
//! rest. The operation handle returned by the API is saved for reference.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use ingest_common::Aoi;

use crate::config::{require, SentinelConfig};
use crate::fetch::FileOutcome;
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct SentinelNdvi;

#[async_trait]
impl Dataset for SentinelNdvi {
    fn name(&self) -> &'static str {
        "sentinel_ndvi"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.sentinel;
        let token = require(&ctx.credentials.gee_access_token, "GEE_ACCESS_TOKEN")?;
        let project = require(&ctx.credentials.gee_project, "GEE_PROJECT")?;

        let dest = ctx
            .data_root
            .join("global")
            .join("sentinel_ndvi")
            .join(format!("export_{}.json", cfg.export_name));

        let mut outcome = FetchOutcome::default();

        if dest.exists() {
            info!(path = %dest.display(), "Export already submitted, skipping");
            outcome.record(FileOutcome::Skipped);
            return Ok(outcome);
        }

        let aoi = Aoi::load(&ctx.aoi_path)?;
        let body = export_request(cfg, aoi.exterior_ring());

        let url = format!(
            "{}/projects/{}/image:export",
            cfg.api_url.trim_end_matches('/'),
            project
        );

        info!(name = %cfg.export_name, "Submitting NDVI export task to Earth Engine");

        let request = ctx
            .fetcher
            .client()
            .post(&url)
            .bearer_auth(token)
            .json(&body);

        match ctx.fetcher.fetch_text_to_file(request, &dest).await {
            Ok(o) => {
                info!(name = %cfg.export_name, "Export task started");
                outcome.record(o);
            }
            Err(e) => return Err(e),
        }

        Ok(outcome)
    }
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn invocation(name: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": name,
            "arguments": arguments,
        }
    })
}

/// Build the NDVI pipeline expression: load the collection, filter by
/// bounds, date and cloud cover, take the median, and compute (B8-B4)/(B8+B4).
fn ndvi_expression(cfg: &SentinelConfig, ring: &[(f64, f64)]) -> Value {
    let coordinates: Vec<Vec<[f64; 2]>> =
        vec![ring.iter().map(|&(lon, lat)| [lon, lat]).collect()];

    let region = invocation(
        "GeometryConstructors.Polygon",
        json!({ "coordinates": constant(json!(coordinates)) }),
    );

    let collection = invocation(
        "ImageCollection.load",
        json!({ "id": constant(json!(cfg.collection)) }),
    );

    let bounded = invocation(
        "ImageCollection.filterBounds",
        json!({ "collection": collection, "geometry": region }),
    );

    let dated = invocation(
        "ImageCollection.filterDate",
        json!({
            "collection": bounded,
            "start": constant(json!(cfg.start_date)),
            "end": constant(json!(cfg.end_date)),
        }),
    );

    let clear = invocation(
        "Collection.filter",
        json!({
            "collection": dated,
            "filter": invocation(
                "Filter.lessThan",
                json!({
                    "leftField": constant(json!("CLOUDY_PIXEL_PERCENTAGE")),
                    "rightValue": constant(json!(cfg.cloud_max_percent)),
                }),
            ),
        }),
    );

    let median = invocation("reduce.median", json!({ "collection": clear }));

    let ndvi = invocation(
        "Image.normalizedDifference",
        json!({
            "input": median,
            "bandNames": constant(json!(["B8", "B4"])),
        }),
    );

    invocation(
        "Image.rename",
        json!({
            "input": ndvi,
            "names": constant(json!(["NDVI"])),
        }),
    )
}

/// The full image:export request body.
fn export_request(cfg: &SentinelConfig, ring: &[(f64, f64)]) -> Value {
    json!({
        "expression": {
            "result": "0",
            "values": { "0": ndvi_expression(cfg, ring) },
        },
        "description": cfg.export_name,
        "fileExportOptions": {
            "fileFormat": "GEO_TIFF",
            "driveDestination": {
                "folder": cfg.drive_folder,
                "filenamePrefix": cfg.export_name,
            },
        },
        "grid": {
            "crsCode": cfg.crs,
            "scale": cfg.scale_meters,
        },
        "maxPixels": cfg.max_pixels.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<(f64, f64)> {
        vec![
            (-120.0, 34.0),
            (-118.0, 34.0),
            (-118.0, 36.0),
            (-120.0, 36.0),
            (-120.0, 34.0),
        ]
    }

    #[test]
    fn test_expression_pipeline_stages() {
        let cfg = SentinelConfig::default();
        let expr = ndvi_expression(&cfg, &square());
        let text = expr.to_string();

        // All pipeline stages present, applied to the configured inputs
        assert!(text.contains("ImageCollection.load"));
        assert!(text.contains("COPERNICUS/S2_SR"));
        assert!(text.contains("ImageCollection.filterBounds"));
        assert!(text.contains("ImageCollection.filterDate"));
        assert!(text.contains(&cfg.start_date));
        assert!(text.contains(&cfg.end_date));
        assert!(text.contains("CLOUDY_PIXEL_PERCENTAGE"));
        assert!(text.contains("reduce.median"));
        assert!(text.contains("normalizedDifference"));
        assert!(text.contains("B8"));
        assert!(text.contains("B4"));
        assert!(text.contains("NDVI"));
    }

    #[test]
    fn test_export_request_shape() {
        let cfg = SentinelConfig::default();
        let body = export_request(&cfg, &square());

        assert_eq!(body["description"], "california_ndvi");
        assert_eq!(body["fileExportOptions"]["fileFormat"], "GEO_TIFF");
        assert_eq!(
            body["fileExportOptions"]["driveDestination"]["folder"],
            "GTB_Exports"
        );
        assert_eq!(body["grid"]["crsCode"], "EPSG:4326");
        assert_eq!(body["grid"]["scale"], 10);
        assert_eq!(body["maxPixels"], "10000000000000");
        assert_eq!(body["expression"]["result"], "0");
    }

    #[test]
    fn test_region_uses_ring_coordinates() {
        let cfg = SentinelConfig::default();
        let expr = ndvi_expression(&cfg, &square());
        let text = expr.to_string();
        assert!(text.contains("GeometryConstructors.Polygon"));
        assert!(text.contains("-120.0,34.0"));
    }
}
