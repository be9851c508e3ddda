//! NOAA GHCND daily maximum temperature for a single station.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{require, TemperatureConfig};
use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct Temperature;

#[async_trait]
impl Dataset for Temperature {
    fn name(&self) -> &'static str {
        "temperature"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.temperature;
        let token = require(&ctx.credentials.noaa_token, "NOAA_TOKEN")?;

        info!(
            station = %cfg.station_id,
            datatype = %cfg.datatype_id,
            "Fetching daily temperature from NOAA"
        );

        let request = ctx
            .fetcher
            .client()
            .get(&cfg.url)
            .header("token", token)
            .query(&[
                ("datasetid", cfg.dataset_id.as_str()),
                ("datatypeid", cfg.datatype_id.as_str()),
                ("stationid", cfg.station_id.as_str()),
                ("startdate", cfg.start_date.as_str()),
                ("enddate", cfg.end_date.as_str()),
            ])
            .query(&[("limit", cfg.limit)]);

        let dest = ctx
            .data_root
            .join("heat_pollution")
            .join("temperature")
            .join(output_filename(cfg));

        let mut outcome = FetchOutcome::default();
        match ctx.fetcher.fetch_text_to_file(request, &dest).await {
            Ok(o) => outcome.record(o),
            Err(e) => {
                warn!(error = %e, "NOAA fetch failed");
                outcome.record_failure();
            }
        }

        Ok(outcome)
    }
}

fn output_filename(cfg: &TemperatureConfig) -> String {
    let station = cfg
        .station_id
        .rsplit(':')
        .next()
        .unwrap_or(&cfg.station_id)
        .to_lowercase();
    let year = cfg.start_date.split('-').next().unwrap_or("");
    format!(
        "ghcnd_{}_{}_{}.json",
        station,
        cfg.datatype_id.to_lowercase(),
        year
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_filename() {
        let cfg = TemperatureConfig::default();
        assert_eq!(output_filename(&cfg), "ghcnd_usw00023169_tmax_2023.json");
    }
}
