//! Shared HTTP fetch layer.
//!
//! Streams responses to disk through a `.partial` temp file with an atomic
//! rename, retries streamed downloads with exponential backoff, and skips
//! work when the destination file already exists.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use ingest_common::IngestError;

/// Retry policy for streamed downloads.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Result of a file-producing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// File written, with its size in bytes
    Written(u64),
    /// Destination already existed
    Skipped,
    /// Upstream had no such resource (non-2xx on a tolerant fetch)
    NotFound,
}

/// HTTP fetcher shared by all datasets.
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_policy(RetryPolicy::default())
    }

    pub fn with_policy(retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, retry })
    }

    /// Access the underlying client to build requests.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Stream a response body to a file, retrying transient failures.
    ///
    /// Skips the fetch entirely when the destination already exists.
    pub async fn fetch_to_file(&self, request: RequestBuilder, dest: &Path) -> Result<FileOutcome> {
        if dest.exists() {
            info!(path = %dest.display(), "File already exists, skipping download");
            return Ok(FileOutcome::Skipped);
        }

        ensure_parent(dest).await?;
        let partial = partial_path(dest);

        let mut attempt = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            let req = request
                .try_clone()
                .context("Request body is not cloneable")?;

            match self.stream_to_partial(req, &partial).await {
                Ok(bytes) => {
                    finalize(&partial, dest).await?;
                    info!(path = %dest.display(), bytes = bytes, "Download completed");
                    return Ok(FileOutcome::Written(bytes));
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        fs::remove_file(&partial).await.ok();
                        return Err(e.context(format!(
                            "Download failed after {} attempts: {}",
                            attempt,
                            dest.display()
                        )));
                    }

                    warn!(
                        error = %e,
                        attempt = attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_secs = delay.as_secs(),
                        "Download failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.retry.max_delay);
                }
            }
        }
    }

    /// Single-attempt streamed fetch that treats any non-2xx as NotFound.
    ///
    /// Used for tile pyramids where missing tiles are expected.
    pub async fn try_fetch_to_file(
        &self,
        request: RequestBuilder,
        dest: &Path,
    ) -> Result<FileOutcome> {
        if dest.exists() {
            debug!(path = %dest.display(), "File already exists, skipping download");
            return Ok(FileOutcome::Skipped);
        }

        ensure_parent(dest).await?;

        let response = request.send().await.context("HTTP request failed")?;
        if !response.status().is_success() {
            debug!(status = %response.status(), path = %dest.display(), "Resource not available");
            return Ok(FileOutcome::NotFound);
        }

        let partial = partial_path(dest);
        let mut file = fs::File::create(&partial)
            .await
            .context("Failed to create output file")?;

        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading response chunk")?;
            file.write_all(&chunk)
                .await
                .context("Error writing to file")?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        finalize(&partial, dest).await?;
        Ok(FileOutcome::Written(bytes))
    }

    /// Fetch a response body as text. Single attempt, like the one-shot
    /// API calls this tool makes.
    pub async fn fetch_text(&self, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.context("HTTP request failed")?;
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        response.text().await.context("Error reading response body")
    }

    /// Fetch a response body and write it to a file verbatim.
    pub async fn fetch_text_to_file(
        &self,
        request: RequestBuilder,
        dest: &Path,
    ) -> Result<FileOutcome> {
        if dest.exists() {
            info!(path = %dest.display(), "File already exists, skipping fetch");
            return Ok(FileOutcome::Skipped);
        }

        let body = self.fetch_text(request).await?;

        ensure_parent(dest).await?;
        fs::write(dest, &body)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        info!(path = %dest.display(), bytes = body.len(), "Saved response");
        Ok(FileOutcome::Written(body.len() as u64))
    }

    async fn stream_to_partial(&self, request: RequestBuilder, partial: &Path) -> Result<u64> {
        let response = request.send().await.context("HTTP request failed")?;
        let status = response.status();

        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url: response.url().to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        // Truncate any leftover partial from a previous attempt
        let mut file = fs::File::create(partial)
            .await
            .context("Failed to create output file")?;

        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error reading response chunk")?;
            file.write_all(&chunk)
                .await
                .context("Error writing to file")?;
            bytes += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        Ok(bytes)
    }
}

/// Path of the in-progress temp file next to the destination.
fn partial_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    dest.with_file_name(format!("{}.partial", name))
}

async fn ensure_parent(dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Move a completed partial into place (copy+delete for cross-filesystem moves).
async fn finalize(partial: &Path, dest: &Path) -> Result<()> {
    if fs::rename(partial, dest).await.is_err() {
        fs::copy(partial, dest).await?;
        fs::remove_file(partial).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        let dest = Path::new("/data/raw/global/population/pop_density_2020.tif");
        assert_eq!(
            partial_path(dest),
            Path::new("/data/raw/global/population/pop_density_2020.tif.partial")
        );
    }

    #[tokio::test]
    async fn test_fetch_to_file_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("already.json");
        fs::write(&dest, b"{}").await.unwrap();

        let fetcher = Fetcher::new().unwrap();
        // The URL is unroutable; the skip check must fire before any request
        let request = fetcher.client().get("http://127.0.0.1:1/nope");
        let outcome = fetcher.fetch_to_file(request, &dest).await.unwrap();
        assert_eq!(outcome, FileOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_fetch_text_to_file_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("already.csv");
        fs::write(&dest, b"a,b\n").await.unwrap();

        let fetcher = Fetcher::new().unwrap();
        let request = fetcher.client().get("http://127.0.0.1:1/nope");
        let outcome = fetcher.fetch_text_to_file(request, &dest).await.unwrap();
        assert_eq!(outcome, FileOutcome::Skipped);

        // Existing content untouched
        assert_eq!(fs::read(&dest).await.unwrap(), b"a,b\n");
    }

    #[tokio::test]
    async fn test_try_fetch_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("8_40_98.tif");
        fs::write(&dest, b"tile").await.unwrap();

        let fetcher = Fetcher::new().unwrap();
        let request = fetcher.client().get("http://127.0.0.1:1/nope");
        let outcome = fetcher.try_fetch_to_file(request, &dest).await.unwrap();
        assert_eq!(outcome, FileOutcome::Skipped);
    }
}
