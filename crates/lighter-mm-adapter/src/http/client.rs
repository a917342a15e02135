/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::http::{LighterError, Result};

/// Base URL for the Lighter mainnet API
pub const DEFAULT_BASE_URL: &str = "https://mainnet.zklighter.elliot.ai";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for the Lighter REST API
#[derive(Debug, Clone)]
pub struct LighterClient {
    http_client: Client,
    base_url: Url,
}

impl LighterClient {
    /// Create a new client against mainnet with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client against mainnet with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client with custom configuration and base URL
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build request builder for an API endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode the JSON body.
    ///
    /// Non-2xx statuses and bodies carrying a result `code` other than 0/200
    /// are mapped to [`LighterError::Api`].
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Some((code, message)) = result_code(&body) {
                return Err(LighterError::Api { code, message });
            }
            return Err(LighterError::from_status(status, body));
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(code) = value.get("code").and_then(|code| code.as_i64())
            && code != 0
            && code != 200
        {
            let message = value
                .get("message")
                .and_then(|message| message.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(LighterError::Api { code, message });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "api response decoded");
        Ok(serde_json::from_value(value)?)
    }
}

fn result_code(body: &str) -> Option<(i64, String)> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let code = value.get("code")?.as_i64()?;
    let message = value
        .get("message")
        .and_then(|message| message.as_str())
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}
