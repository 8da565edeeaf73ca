//! Flag image fetcher
//!
//! Downloads one SVG per country into a cache directory. Files that already
//! exist are skipped, so reruns only fetch what is missing. Downloads run in
//! small concurrent batches with a pause between batches; a failed download
//! is recorded and never aborts the rest of the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::FlagsConfig;
use crate::country::Country;
use crate::error::{DatasetError, Result};
use crate::store::write_atomic;

/// What happened to one country's flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagOutcome {
    Downloaded,
    Skipped,
    Failed(String),
}

/// Per-country result of a fetch run
#[derive(Debug, Clone)]
pub struct FlagResult {
    pub cca2: String,
    pub name: String,
    pub outcome: FlagOutcome,
}

/// Counts reported after a fetch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl FlagSummary {
    pub fn from_results(results: &[FlagResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                FlagOutcome::Downloaded => summary.downloaded += 1,
                FlagOutcome::Skipped => summary.skipped += 1,
                FlagOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Batched flag downloader
pub struct FlagFetcher {
    http: Client,
    base_url: String,
    dir: PathBuf,
    batch_size: usize,
    pause: Duration,
}

impl FlagFetcher {
    /// Create a fetcher writing into `dir`
    pub fn new(config: &FlagsConfig, dir: impl AsRef<Path>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DatasetError::fetch(&config.base_url, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            dir: dir.as_ref().to_path_buf(),
            batch_size: config.batch_size.max(1),
            pause: Duration::from_millis(config.batch_pause_ms),
        })
    }

    /// Local file for a country's flag
    pub fn flag_path(&self, cca2: &str) -> PathBuf {
        self.dir.join(format!("{}.svg", cca2))
    }

    /// Remote URL for a country's flag
    pub fn flag_url(&self, cca2: &str) -> String {
        format!("{}{}.svg", self.base_url, cca2.to_lowercase())
    }

    /// Fetch every missing flag, `batch_size` at a time
    pub async fn fetch_all(&self, countries: &[Country]) -> Vec<FlagResult> {
        info!(count = countries.len(), batch_size = self.batch_size, "fetching flags");
        let mut results = Vec::with_capacity(countries.len());

        let batches: Vec<&[Country]> = countries.chunks(self.batch_size).collect();
        for (i, batch) in batches.iter().enumerate() {
            let outcomes = join_all(batch.iter().map(|c| self.fetch_one(c))).await;
            results.extend(outcomes);

            if i + 1 < batches.len() && !self.pause.is_zero() {
                sleep(self.pause).await;
            }
        }
        results
    }

    async fn fetch_one(&self, country: &Country) -> FlagResult {
        let outcome = self.download(&country.cca2).await;
        if let FlagOutcome::Failed(reason) = &outcome {
            warn!(cca2 = %country.cca2, %reason, "flag download failed");
        }
        FlagResult {
            cca2: country.cca2.clone(),
            name: country.name.clone(),
            outcome,
        }
    }

    async fn download(&self, cca2: &str) -> FlagOutcome {
        if cca2.is_empty() {
            return FlagOutcome::Failed("missing cca2".to_string());
        }

        let path = self.flag_path(cca2);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => return FlagOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return FlagOutcome::Failed(e.to_string()),
        }

        let response = match self.http.get(self.flag_url(cca2)).send().await {
            Ok(response) => response,
            Err(e) => return FlagOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return FlagOutcome::Failed(format!("HTTP {}", status.as_u16()));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return FlagOutcome::Failed(e.to_string()),
        };

        // temp file, fsync and rename are blocking calls
        match tokio::task::spawn_blocking(move || write_atomic(&path, &body)).await {
            Ok(Ok(())) => FlagOutcome::Downloaded,
            Ok(Err(e)) => FlagOutcome::Failed(e.to_string()),
            Err(e) => FlagOutcome::Failed(format!("write task failed: {}", e)),
        }
    }
}
