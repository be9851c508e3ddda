//! Current air quality observations (AirNow, optionally Google AQ).

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct AirQuality;

#[async_trait]
impl Dataset for AirQuality {
    fn name(&self) -> &'static str {
        "air_quality"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.air_quality;
        let out_dir = ctx.data_root.join("heat_pollution").join("air_quality");
        let mut outcome = FetchOutcome::default();

        // AirNow current observations by lat/lon
        match ctx.credentials.airnow_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                info!("Fetching current air quality from AirNow");

                let request = ctx.fetcher.client().get(&cfg.airnow_url).query(&[
                    ("format", "application/json".to_string()),
                    ("latitude", cfg.latitude.to_string()),
                    ("longitude", cfg.longitude.to_string()),
                    ("distance", cfg.distance.to_string()),
                    ("API_KEY", key.to_string()),
                ]);

                let dest = out_dir.join("airnow_current_la.json");
                match ctx.fetcher.fetch_text_to_file(request, &dest).await {
                    Ok(o) => outcome.record(o),
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch AirNow observations");
                        outcome.record_failure();
                    }
                }
            }
            _ => {
                warn!("AIRNOW_API_KEY not set, skipping AirNow fetch");
            }
        }

        // Google Air Quality, only when configured
        match ctx.credentials.google_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                info!("Fetching current conditions from Google Air Quality");

                let body = json!({
                    "location": {
                        "latitude": cfg.latitude,
                        "longitude": cfg.longitude,
                    }
                });

                let request = ctx
                    .fetcher
                    .client()
                    .post(&cfg.google_url)
                    .query(&[("key", key)])
                    .json(&body);

                let dest = out_dir.join("google_aq_current_la.json");
                match ctx.fetcher.fetch_text_to_file(request, &dest).await {
                    Ok(o) => outcome.record(o),
                    Err(e) => {
                        warn!(error = %e, "Failed to fetch Google Air Quality");
                        outcome.record_failure();
                    }
                }
            }
            _ => {
                info!("Google Air Quality API not configured, skipping");
            }
        }

        Ok(outcome)
    }
}
