//! Census ACS5 demographics (population by tract).

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::require;
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct Demographics;

#[async_trait]
impl Dataset for Demographics {
    fn name(&self) -> &'static str {
        "demographics"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.demographics;
        let key = require(&ctx.credentials.census_api_key, "CENSUS_API_KEY")?;

        info!(
            variables = %cfg.variables,
            within = %cfg.within,
            "Fetching demographics from Census ACS5"
        );

        let request = ctx.fetcher.client().get(&cfg.url).query(&[
            ("get", cfg.variables.as_str()),
            ("for", cfg.geography.as_str()),
            ("in", cfg.within.as_str()),
            ("key", key),
        ]);

        let dest = ctx
            .data_root
            .join("heat_pollution")
            .join("demographics")
            .join("population_acs5_ca.json");

        let mut outcome = FetchOutcome::default();
        match ctx.fetcher.fetch_text_to_file(request, &dest).await {
            Ok(o) => outcome.record(o),
            Err(e) => {
                warn!(error = %e, "Failed to fetch Census demographics");
                outcome.record_failure();
            }
        }

        Ok(outcome)
    }
}
