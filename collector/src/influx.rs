use anyhow::{Context, Result};
use async_trait::async_trait;
use heatwatch::config::StorageConfig;
use heatwatch::Point;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Storage collaborator: persists one point per call.
#[async_trait]
pub trait PointWriter: Send + Sync {
    async fn write(&self, point: &Point) -> Result<()>;
}

/// Writes points to an InfluxDB v2 bucket using the HTTP write API.
pub struct InfluxWriter {
    http_client: Client,
    write_url: String,
    org: String,
    bucket: String,
    token: Option<String>,
}

impl InfluxWriter {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build storage HTTP client")?;
        Ok(Self {
            http_client,
            write_url: format!("{}/api/v2/write", config.url.trim_end_matches('/')),
            org: config.org.clone(),
            bucket: config.bucket.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    async fn write(&self, point: &Point) -> Result<()> {
        let body = point
            .to_line_protocol()
            .context("Cannot encode a point without fields")?;

        let mut request = self
            .http_client
            .post(&self.write_url)
            .query(&[("org", self.org.as_str()), ("bucket", self.bucket.as_str())])
            .header("Content-Type", "text/plain; charset=utf-8");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {}", token));
        }

        let response = request
            .body(body)
            .send()
            .await
            .context("Failed to send write request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());

            anyhow::bail!("InfluxDB returned error status {}: {}", status, body);
        }

        debug!(
            measurement = %point.measurement,
            fields = point.fields.len(),
            bucket = %self.bucket,
            "Point written"
        );

        Ok(())
    }
}
