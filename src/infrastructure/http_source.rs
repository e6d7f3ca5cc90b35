// HTTP metrics source - fetches `{title, value}` lists from the backend endpoint
use crate::application::metrics_source::MetricsSource;
use crate::domain::snapshot::{Measurement, Snapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMetricsSource {
    pub fn new(endpoint: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch(&self) -> Result<Snapshot> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to metrics endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Metrics endpoint returned status {}: {}", status, body);
        }

        let measurements = response
            .json::<Vec<Measurement>>()
            .await
            .context("Failed to parse metrics response")?;

        tracing::debug!("Fetched {} measurements from {}", measurements.len(), self.endpoint);
        Ok(Snapshot::from_measurements(measurements)?)
    }
}
