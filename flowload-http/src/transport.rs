//! Transport seam between the API client and the wire

use crate::errors::HttpError;
use crate::types::{ApiResponse, HttpMethod};
use flowload_config::HttpConfig;
use reqwest::Client;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Executes one HTTP request and returns the status plus parsed JSON body
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&JsonValue>,
        token: Option<&str>,
    ) -> Result<ApiResponse, HttpError>;
}

/// Real transport over a pooled `reqwest` client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        debug!(
            "Creating HTTP transport with {}s timeout",
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ApiTransport for ReqwestTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&JsonValue>,
        token: Option<&str>,
    ) -> Result<ApiResponse, HttpError> {
        debug!("Sending {} {}", method, url);

        let mut request = self.client.request(method.into(), url);

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        // 204s and non-JSON error pages come back as Null; the engine only
        // needs the status code for those.
        let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);

        debug!("Received {} from {} {}", status, method, url);
        Ok(ApiResponse::new(status, body))
    }
}
