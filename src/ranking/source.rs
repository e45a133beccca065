use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};

use super::table::DistributionTable;
use super::types::{RawDistribution, TableKey};
use crate::dataset;

/// Where distribution tables come from
pub trait DistributionSource: Send + Sync + 'static {
    fn fetch(&self, key: &TableKey) -> impl Future<Output = Result<DistributionTable>> + Send;
}

/// Reads tables straight from the data directory
#[derive(Debug, Clone)]
pub struct FileSource {
    data_dir: PathBuf,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl DistributionSource for FileSource {
    async fn fetch(&self, key: &TableKey) -> Result<DistributionTable> {
        let map = dataset::load_dataset(&self.data_dir, key).await?;
        let raw: RawDistribution = serde_json::from_value(Value::Object(map))
            .with_context(|| format!("Unexpected layout in {}", dataset::data_file_name(key)))?;
        Ok(DistributionTable::from_raw(raw.data)?)
    }
}

/// Fetches tables from a running instance's data endpoint
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSource {
    /// `base_url` is the service root, e.g. "http://localhost:8000"
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/gaokao/data", base_url.trim_end_matches('/')),
        }
    }
}

impl DistributionSource for HttpSource {
    async fn fetch(&self, key: &TableKey) -> Result<DistributionTable> {
        // Retry strategy: exponential backoff with 3 attempts, transport errors only
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let response = Retry::start(retry_strategy, || {
            self.client
                .get(&self.endpoint)
                .query(&[("province", &key.province), ("subject", &key.subject)])
                .send()
        })
        .await
        .context("Failed to reach score data endpoint")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP error! status: {}", status.as_u16());
        }

        let raw: RawDistribution = response
            .json()
            .await
            .context("Failed to parse score data JSON")?;

        if let Some(error) = raw.error {
            return Err(match error {
                Value::String(msg) => anyhow!(msg),
                other => anyhow!("score data endpoint reported an error: {}", other),
            });
        }

        Ok(DistributionTable::from_raw(raw.data)?)
    }
}
