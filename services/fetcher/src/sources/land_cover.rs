//! NLCD land cover archive.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use tracing::{info, warn};

use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct LandCover;

#[async_trait]
impl Dataset for LandCover {
    fn name(&self) -> &'static str {
        "land_cover"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.land_cover;
        let dest = ctx
            .data_root
            .join("heat_pollution")
            .join("land_cover")
            .join(&cfg.filename);

        info!(url = %cfg.url, "Fetching NLCD land cover archive");

        // The MRLC bucket rejects requests without a browser user agent
        let request = ctx
            .fetcher
            .client()
            .get(&cfg.url)
            .header(USER_AGENT, "Mozilla/5.0");

        let mut outcome = FetchOutcome::default();
        match ctx.fetcher.fetch_to_file(request, &dest).await {
            Ok(o) => outcome.record(o),
            Err(e) => {
                warn!(error = %e, "Land cover download failed");
                outcome.record_failure();
            }
        }

        Ok(outcome)
    }
}
