//! MODIS MOD13Q1 NDVI tile acquisition.
//!
//! The USGS archive exposes one directory per composite date
//! (`MOD13Q1.006/{year}.{doy:03}/`). Each directory is listed and the
//! granules matching the configured sinusoidal tiles are downloaded into a
//! per-year directory.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::RequestBuilder;
use tracing::{debug, info, warn};

use ingest_common::time::composite_days_with_interval;

use crate::runner::{Dataset, FetchContext, FetchOutcome};

pub struct ModisNdvi;

#[async_trait]
impl Dataset for ModisNdvi {
    fn name(&self) -> &'static str {
        "modis"
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome> {
        let cfg = &ctx.config.modis;
        let ndvi_root = ctx.data_root.join("global").join("ndvi");
        let mut outcome = FetchOutcome::default();

        for year in cfg.start_year..=cfg.end_year {
            let year_dir = ndvi_root.join(year.to_string());

            for doy in composite_days_with_interval(year, cfg.interval_days) {
                let dir_url = directory_url(&cfg.base_url, year, doy);

                let index = match ctx.fetcher.fetch_text(authed(ctx, &dir_url)).await {
                    Ok(body) => body,
                    Err(e) => {
                        debug!(url = %dir_url, error = %e, "No listing for composite date");
                        continue;
                    }
                };

                let links = extract_links(&index);

                for tile in &cfg.tiles {
                    let prefix = granule_prefix(&cfg.product, &cfg.collection, year, doy, tile);

                    for granule in granules_matching(&links, &prefix) {
                        info!(granule = %granule, url = %dir_url, "Fetching granule");

                        let dest = year_dir.join(&granule);
                        let request = authed(ctx, &format!("{}{}", dir_url, granule));

                        match ctx.fetcher.fetch_to_file(request, &dest).await {
                            Ok(o) => outcome.record(o),
                            Err(e) => {
                                warn!(granule = %granule, error = %e, "Failed to fetch granule");
                                outcome.record_failure();
                            }
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }
}

/// GET request with the Earthdata bearer token when one is configured.
fn authed(ctx: &FetchContext, url: &str) -> RequestBuilder {
    let request = ctx.fetcher.client().get(url);
    match &ctx.credentials.earthdata_token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn directory_url(base_url: &str, year: i32, doy: u32) -> String {
    format!("{}/{}.{:03}/", base_url.trim_end_matches('/'), year, doy)
}

fn granule_prefix(product: &str, collection: &str, year: i32, doy: u32, tile: &str) -> String {
    format!("{}.A{}{:03}.{}.{}", product, year, doy, tile, collection)
}

/// Pull href targets out of an archive index page.
fn extract_links(html: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut rest = html;

    while let Some(idx) = rest.find("href=\"") {
        rest = &rest[idx + 6..];
        match rest.find('"') {
            Some(end) => {
                links.push(rest[..end].to_string());
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }

    links
}

/// Granule filenames matching a tile prefix, deduplicated (index pages link
/// each file from both the name column and the icon).
fn granules_matching(links: &[String], prefix: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter(|l| l.starts_with(prefix) && l.ends_with(".hdf"))
        .filter(|l| seen.insert(l.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_url() {
        assert_eq!(
            directory_url("https://e4ftl01.cr.usgs.gov/MOLT/MOD13Q1.006", 2024, 17),
            "https://e4ftl01.cr.usgs.gov/MOLT/MOD13Q1.006/2024.017/"
        );
    }

    #[test]
    fn test_granule_prefix() {
        assert_eq!(
            granule_prefix("MOD13Q1", "006", 2024, 1, "h08v05"),
            "MOD13Q1.A2024001.h08v05.006"
        );
    }

    #[test]
    fn test_extract_and_match_links() {
        let html = r#"
            <html><body>
            <a href="index.html">parent</a>
            <a href="MOD13Q1.A2024001.h08v05.006.2024020123456.hdf">granule</a>
            <a href="MOD13Q1.A2024001.h08v05.006.2024020123456.hdf">icon</a>
            <a href="MOD13Q1.A2024001.h08v05.006.2024020123456.hdf.xml">metadata</a>
            <a href="MOD13Q1.A2024001.h09v04.006.2024020123459.hdf">other tile</a>
            </body></html>
        "#;

        let links = extract_links(html);
        assert_eq!(links.len(), 5);

        let matched = granules_matching(&links, "MOD13Q1.A2024001.h08v05.006");
        // .xml sidecar rejected, duplicate href collapsed, other tile excluded
        assert_eq!(
            matched,
            vec!["MOD13Q1.A2024001.h08v05.006.2024020123456.hdf".to_string()]
        );
    }
}
