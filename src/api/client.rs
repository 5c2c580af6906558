//! Generic HTTP client for the helpdesk API.
//!
//! Every call resolves to an [`ApiResponse`]; transport failures never
//! surface as a separate error path.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::response::{error_message, ApiResponse};
use crate::config::ApiConfig;

/// Per-request options for [`ApiClient::request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Pre-serialized JSON body
    pub body: Option<String>,
    /// Extra headers, applied over the JSON content type
    pub headers: HeaderMap,
    /// Bearer token for the `Authorization` header
    pub token: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            token: None,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    /// Serialize `body` as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self::with_client(&config.base_url, http))
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a request against `endpoint` and normalize the outcome.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Caller values replace the default per name; repeated values are kept
        headers.extend(options.headers);
        if let Some(token) = options.token.as_deref() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => return ApiResponse::network_failure(format!("Invalid bearer token: {e}")),
            }
        }

        let mut builder = self.http.request(options.method.clone(), &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(method = %options.method, url = %url, error = %e, "Request did not reach the server");
                return ApiResponse::network_failure(e.to_string());
            }
        };

        let status = response.status();
        let code = status.as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(method = %options.method, url = %url, error = %e, "Failed to read response body");
                return ApiResponse::Error {
                    error: e.to_string(),
                    status: code,
                };
            }
        };

        debug!(method = %options.method, url = %url, status = code, "Request completed");

        if !status.is_success() {
            return ApiResponse::Error {
                error: error_message(&body),
                status: code,
            };
        }

        // An empty success body decodes as JSON null
        let parsed = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_slice(&body)
        };

        match parsed {
            Ok(data) => ApiResponse::Data { data, status: code },
            Err(e) => ApiResponse::Error {
                error: format!("Failed to parse response: {e}"),
                status: code,
            },
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, token: Option<&str>) -> ApiResponse<T> {
        self.request(endpoint, RequestOptions::new(Method::GET).token(token))
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        token: Option<&str>,
    ) -> ApiResponse<T> {
        self.send_json(Method::POST, endpoint, body, token).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        token: Option<&str>,
    ) -> ApiResponse<T> {
        self.send_json(Method::PATCH, endpoint, body, token).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str, token: Option<&str>) -> ApiResponse<T> {
        self.request(endpoint, RequestOptions::new(Method::DELETE).token(token))
            .await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
        token: Option<&str>,
    ) -> ApiResponse<T> {
        let options = match RequestOptions::new(method).token(token).json(body) {
            Ok(options) => options,
            Err(e) => {
                return ApiResponse::network_failure(format!("Failed to encode request body: {e}"))
            }
        };
        self.request(endpoint, options).await
    }
}
