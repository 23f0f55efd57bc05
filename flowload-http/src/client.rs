//! Token-aware JSON client for the orchestration API

use crate::errors::HttpError;
use crate::transport::{ApiTransport, ReqwestTransport};
use crate::types::{ApiResponse, HttpMethod};
use flowload_config::HttpConfig;
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// API client shared by every virtual user
///
/// Holds the base URL, the bearer token obtained at setup, and the
/// transport. Cheap to share behind an `Arc`; the token is written once
/// during setup and read-only afterwards.
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client over the real HTTP transport
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self, HttpError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(base_url, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport (tests use the mock)
    pub fn with_transport(base_url: &str, transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Obtain a bearer token; the one fatal call in the engine
    pub async fn login(&self, username: &str, password: &str) -> Result<(), HttpError> {
        info!("Authenticating against {}", self.base_url);
        let body = json!({ "username": username, "password": password });
        let response = self
            .transport
            .execute(
                HttpMethod::Post,
                &self.url_for("/api/v1/auth/login"),
                Some(&body),
                None,
            )
            .await?;

        if response.status != 200 {
            return Err(HttpError::AuthenticationFailed {
                status: response.status,
            });
        }

        let token = response
            .body
            .get("token")
            .and_then(|v| v.as_str())
            .ok_or(HttpError::MissingField("token"))?
            .to_string();

        *self.token.write().unwrap() = Some(token);
        debug!("Authentication succeeded");
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.request(HttpMethod::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: &JsonValue) -> Result<ApiResponse, HttpError> {
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    /// POST without a body, for action sub-resources like `/execute`
    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.request(HttpMethod::Post, path, None).await
    }

    pub async fn put(&self, path: &str, body: &JsonValue) -> Result<ApiResponse, HttpError> {
        self.request(HttpMethod::Put, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.request(HttpMethod::Delete, path, None).await
    }

    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<ApiResponse, HttpError> {
        let token = self.token.read().unwrap().clone();
        self.transport
            .execute(method, &self.url_for(path), body, token.as_deref())
            .await
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
