//! Mapzen/Tilezen terrain tiles over the area of interest.
//!
//! Tiles not present in the pyramid are expected; non-2xx responses are
//! skipped without failing the dataset.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use ingest_common::{tiles_for_bbox, BoundingBox, TileCoord};

use crate::fetch::FileOutcome;
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct Elevation;

#[async_trait]
impl Dataset for Elevation {
    fn name(&self) -> &'static str {
        "elevation"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.elevation;
        let bbox = BoundingBox::from_csv(&cfg.bbox)?;
        let tiles = tiles_for_bbox(&bbox, cfg.zoom);
        let out_dir = ctx.data_root.join("heat_pollution").join("elevation");

        info!(zoom = cfg.zoom, count = tiles.len(), "Fetching elevation tiles");

        let mut outcome = FetchOutcome::default();

        for tile in &tiles {
            let url = tile_url(&cfg.url_template, tile);
            let dest = out_dir.join(format!("{}_{}_{}.tif", tile.z, tile.x, tile.y));

            let request = ctx.fetcher.client().get(&url);
            match ctx.fetcher.try_fetch_to_file(request, &dest).await {
                Ok(o) => {
                    if let FileOutcome::Written(_) = o {
                        info!(z = tile.z, x = tile.x, y = tile.y, "Saved tile");
                    }
                    outcome.record(o);
                }
                Err(e) => {
                    warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "Tile fetch failed");
                    outcome.record_failure();
                }
            }
        }

        info!(
            written = outcome.written,
            skipped = outcome.skipped,
            "Elevation tiles done"
        );

        Ok(outcome)
    }
}

fn tile_url(template: &str, tile: &TileCoord) -> String {
    template
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElevationConfig;

    #[test]
    fn test_tile_url() {
        let cfg = ElevationConfig::default();
        let tile = TileCoord::new(8, 40, 98);
        assert_eq!(
            tile_url(&cfg.url_template, &tile),
            "https://s3.amazonaws.com/elevation-tiles-prod/geotiff/8/40/98.tif"
        );
    }

    #[test]
    fn test_default_bbox_parses() {
        let cfg = ElevationConfig::default();
        let bbox = BoundingBox::from_csv(&cfg.bbox).unwrap();
        let tiles = tiles_for_bbox(&bbox, cfg.zoom);
        // California at z=8 spans a modest, non-empty tile grid
        assert!(tiles.len() > 10 && tiles.len() < 200);
    }
}
