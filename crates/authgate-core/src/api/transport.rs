//! HTTP transport used by the session manager.
//!
//! `HttpTransport` is the seam the manager talks through; `ReqwestTransport`
//! is the production implementation. Authentication headers are not stored on
//! the client: every request asks the configured interceptor for them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::auth::RequestInterceptor;

use super::TransportError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST form-encoded fields and decode the JSON response body.
    /// An empty 2xx body decodes to `Value::Null`.
    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError>;

    /// POST with no body. Returns the status code; non-2xx is not an error.
    async fn post_empty(&self, path: &str) -> Result<u16, TransportError>;

    /// GET and decode the JSON response body.
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    interceptor: Option<Arc<dyn RequestInterceptor>>,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            interceptor: None,
        })
    }

    /// Attach the interceptor consulted for headers on every request.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        if let Some(ref interceptor) = self.interceptor {
            for (name, value) in interceptor.headers() {
                match (
                    header::HeaderName::from_bytes(name.as_bytes()),
                    header::HeaderValue::from_str(&value),
                ) {
                    (Ok(n), Ok(v)) => {
                        headers.insert(n, v);
                    }
                    _ => {
                        debug!(header = name, "Skipping invalid header");
                    }
                }
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, TransportError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::from_status(status, &body))
        }
    }

    async fn decode_json(response: Response, url: &str) -> Result<Value, TransportError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            TransportError::Decode(format!(
                "Failed to parse JSON response from {}: {}",
                url, e
            ))
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(url = %url, "POST form");

        let response = self
            .client
            .post(&url)
            .headers(self.request_headers())
            .form(fields)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode_json(response, &url).await
    }

    async fn post_empty(&self, path: &str) -> Result<u16, TransportError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .headers(self.request_headers())
            .send()
            .await?;

        Ok(response.status().as_u16())
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.request_headers())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode_json(response, &url).await
    }
}
