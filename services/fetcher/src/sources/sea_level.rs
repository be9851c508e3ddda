//! NASA PO.DAAC global mean sea level record.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::require;
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct SeaLevel;

#[async_trait]
impl Dataset for SeaLevel {
    fn name(&self) -> &'static str {
        "sea_level"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.sea_level;
        let username = require(&ctx.credentials.nasa_username, "NASA_USERNAME")?;
        let password = require(&ctx.credentials.nasa_password, "NASA_PASSWORD")?;

        let dest = ctx
            .data_root
            .join("sea_level_rise")
            .join("mean_sea_level_gmsl.csv");

        info!("Downloading global mean sea level data from NASA PO.DAAC");

        let request = ctx
            .fetcher
            .client()
            .get(&cfg.url)
            .basic_auth(username, Some(password))
            .timeout(Duration::from_secs(cfg.timeout_secs));

        let mut outcome = FetchOutcome::default();
        match ctx.fetcher.fetch_to_file(request, &dest).await {
            Ok(o) => outcome.record(o),
            Err(e) => {
                warn!(error = %e, "Failed to fetch sea level data");
                outcome.record_failure();
            }
        }

        Ok(outcome)
    }
}
