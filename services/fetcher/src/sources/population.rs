//! GPWv4 population density rasters.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct Population;

#[async_trait]
impl Dataset for Population {
    fn name(&self) -> &'static str {
        "population"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.population;
        let out_dir = ctx.data_root.join("global").join("population");
        let mut outcome = FetchOutcome::default();

        for &year in &cfg.years {
            let url = year_url(&cfg.url_template, year);
            let dest = out_dir.join(format!("pop_density_{}.tif", year));

            info!(year = year, url = %url, "Fetching population density raster");

            let request = ctx.fetcher.client().get(&url);
            match ctx.fetcher.fetch_to_file(request, &dest).await {
                Ok(o) => outcome.record(o),
                Err(e) => {
                    warn!(year = year, error = %e, "Failed to fetch population raster");
                    outcome.record_failure();
                }
            }
        }

        Ok(outcome)
    }
}

fn year_url(template: &str, year: u32) -> String {
    template.replace("{year}", &year.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PopulationConfig;

    #[test]
    fn test_year_url() {
        let cfg = PopulationConfig::default();
        assert_eq!(
            year_url(&cfg.url_template, 2015),
            "https://pacific-data.sprep.org/system/files/Global_2015_PopulationDensity30sec_GPWv4.tiff"
        );
    }
}
