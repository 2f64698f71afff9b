use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use heatwatch::config::DeviceConfig;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Device API collaborator: fetches the full status tree.
///
/// Implementations return the raw JSON payload. Whether it actually holds
/// an entity collection is decided by the flattener, so application-level
/// error payloads must be passed through rather than turned into errors.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<Value>;
}

/// HTTP client for the device status API.
pub struct DeviceClient {
    http_client: Client,
    status_url: String,
    access_token: Option<String>,
}

impl DeviceClient {
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("heatwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build device HTTP client")?;
        Ok(Self {
            http_client,
            status_url: config.status_url.clone(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl StatusSource for DeviceClient {
    /// GET the status tree.
    ///
    /// A non-2xx response with a JSON body is returned as-is (it will be
    /// classified as malformed and dumped); without a JSON body it is an error.
    async fn fetch_status(&self) -> Result<Value> {
        let mut request = self.http_client.get(&self.status_url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send status request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read status response body")?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                if !status.is_success() {
                    warn!(status = %status, "Device API returned error status");
                }
                Ok(value)
            }
            Err(e) if status.is_success() => {
                Err(e).context("Failed to parse status response")
            }
            Err(_) => bail!("Device API returned error status {}: {}", status, body),
        }
    }
}

/// Serves a previously captured status response from disk.
///
/// Used for offline debugging against a dump or saved payload.
pub struct ReplaySource {
    path: PathBuf,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusSource for ReplaySource {
    async fn fetch_status(&self) -> Result<Value> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read replay file {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse replay file {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(server: &mockito::Server, token: Option<&str>) -> DeviceClient {
        DeviceClient::new(&DeviceConfig {
            status_url: format!("{}/features", server.url()),
            access_token: token.map(str::to_string),
            timeout_secs: 5,
            replay_file: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_status_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/features")
            .match_header("authorization", "Bearer device-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"entities":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server, Some("device-token"));
        let value = client.fetch_status().await.unwrap();
        assert_eq!(value, json!({"entities": []}));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_status_passes_json_error_payload_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/features")
            .with_status(429)
            .with_body(r#"{"statusCode":429,"errorType":"RATE_LIMIT_EXCEEDED"}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let value = client.fetch_status().await.unwrap();
        assert_eq!(value["errorType"], "RATE_LIMIT_EXCEEDED");
        assert!(value.get("entities").is_none());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_status_error_without_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/features")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.fetch_status().await.unwrap_err();
        assert!(err.to_string().contains("502"), "unexpected error: {}", err);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_status_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/features")
            .with_status(200)
            .with_body("{\"entities\": [")
            .create_async()
            .await;

        let client = client_for(&server, None);
        assert!(client.fetch_status().await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_status_unreachable() {
        let client = DeviceClient::new(&DeviceConfig {
            status_url: "http://localhost:9999/features".to_string(), // Invalid port
            access_token: None,
            timeout_secs: 2,
            replay_file: None,
        })
        .unwrap();

        assert!(client.fetch_status().await.is_err());
    }

    #[tokio::test]
    async fn test_replay_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, r#"{"entities":[{"class":["heating.burner","feature"]}]}"#).unwrap();

        let source = ReplaySource::new(&path);
        let value = source.fetch_status().await.unwrap();
        assert_eq!(value["entities"][0]["class"][0], "heating.burner");

        let missing = ReplaySource::new(dir.path().join("missing.json"));
        assert!(missing.fetch_status().await.is_err());
    }
}
