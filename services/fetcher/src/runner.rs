//! Dataset trait and the sequential run loop.
//!
//! Datasets run one at a time, one request in flight at a time. A dataset
//! failure is logged and the run continues, except for missing credentials,
//! which abort the run before any further network calls.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use ingest_common::IngestError;

use crate::config::{Credentials, SourcesConfig};
use crate::fetch::{Fetcher, FileOutcome};

/// Everything a dataset needs to run.
pub struct FetchContext {
    pub fetcher: Fetcher,
    pub config: SourcesConfig,
    pub credentials: Credentials,
    /// Root directory for downloaded data (datasets append their own subpaths)
    pub data_root: PathBuf,
    /// Path to the AOI GeoJSON used by polygon-scoped datasets
    pub aoi_path: PathBuf,
}

/// Per-dataset fetch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub written: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes: u64,
}

impl FetchOutcome {
    /// Fold a single file outcome into the counters.
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Written(bytes) => {
                self.written += 1;
                self.bytes += bytes;
            }
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::NotFound => {}
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn merge(&mut self, other: &FetchOutcome) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.bytes += other.bytes;
    }
}

/// A single acquirable dataset.
#[async_trait]
pub trait Dataset: Send + Sync {
    /// Short identifier used for --dataset selection.
    fn name(&self) -> &'static str;

    /// Fetch the dataset and write its files under the data root.
    async fn fetch(&self, ctx: &FetchContext) -> Result<FetchOutcome>;
}

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub datasets_ok: usize,
    pub datasets_failed: usize,
    pub totals: FetchOutcome,
}

/// Run datasets strictly sequentially with log-and-continue semantics.
pub async fn run(datasets: &[Box<dyn Dataset>], ctx: &FetchContext) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    for dataset in datasets {
        info!(dataset = dataset.name(), "Starting dataset fetch");

        match dataset.fetch(ctx).await {
            Ok(outcome) => {
                info!(
                    dataset = dataset.name(),
                    written = outcome.written,
                    skipped = outcome.skipped,
                    failed = outcome.failed,
                    bytes = outcome.bytes,
                    "Dataset fetch complete"
                );
                summary.datasets_ok += 1;
                summary.totals.merge(&outcome);
            }
            Err(e) => {
                // Missing credentials abort the run before touching the network
                if let Some(IngestError::MissingCredential(_)) =
                    e.downcast_ref::<IngestError>()
                {
                    return Err(e);
                }

                error!(dataset = dataset.name(), error = %e, "Dataset fetch failed");
                summary.datasets_failed += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Fetcher;
    use anyhow::anyhow;

    struct Succeeds;

    #[async_trait]
    impl Dataset for Succeeds {
        fn name(&self) -> &'static str {
            "succeeds"
        }

        async fn fetch(&self, _ctx: &FetchContext) -> Result<FetchOutcome> {
            let mut outcome = FetchOutcome::default();
            outcome.record(FileOutcome::Written(100));
            outcome.record(FileOutcome::Skipped);
            Ok(outcome)
        }
    }

    struct Fails;

    #[async_trait]
    impl Dataset for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        async fn fetch(&self, _ctx: &FetchContext) -> Result<FetchOutcome> {
            Err(anyhow!("upstream exploded"))
        }
    }

    struct NeedsKey;

    #[async_trait]
    impl Dataset for NeedsKey {
        fn name(&self) -> &'static str {
            "needs_key"
        }

        async fn fetch(&self, _ctx: &FetchContext) -> Result<FetchOutcome> {
            Err(IngestError::MissingCredential("CENSUS_API_KEY").into())
        }
    }

    fn test_ctx() -> FetchContext {
        FetchContext {
            fetcher: Fetcher::new().unwrap(),
            config: SourcesConfig::default(),
            credentials: Credentials::default(),
            data_root: PathBuf::from("/tmp/enviro-ingest-test"),
            aoi_path: PathBuf::from("config/aoi/california.geojson"),
        }
    }

    #[tokio::test]
    async fn test_failures_are_non_fatal() {
        let datasets: Vec<Box<dyn Dataset>> = vec![Box::new(Fails), Box::new(Succeeds)];
        let summary = run(&datasets, &test_ctx()).await.unwrap();

        assert_eq!(summary.datasets_failed, 1);
        assert_eq!(summary.datasets_ok, 1);
        assert_eq!(summary.totals.written, 1);
        assert_eq!(summary.totals.skipped, 1);
        assert_eq!(summary.totals.bytes, 100);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let datasets: Vec<Box<dyn Dataset>> = vec![Box::new(NeedsKey), Box::new(Succeeds)];
        let err = run(&datasets, &test_ctx()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::MissingCredential("CENSUS_API_KEY"))
        ));
    }

    #[test]
    fn test_outcome_merge() {
        let mut a = FetchOutcome {
            written: 2,
            skipped: 1,
            failed: 0,
            bytes: 10,
        };
        let b = FetchOutcome {
            written: 1,
            skipped: 0,
            failed: 3,
            bytes: 5,
        };
        a.merge(&b);
        assert_eq!(a.written, 3);
        assert_eq!(a.failed, 3);
        assert_eq!(a.bytes, 15);
    }
}
