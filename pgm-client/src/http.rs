//! HTTP client wrapper.
//!
//! Resolves route templates, stamps headers, enforces the request timeout and
//! turns every outcome into an [`AppResult`]. Holds no state between calls
//! apart from the underlying connection pool.

use std::time::{Duration, Instant};

use common::config::ClientConfig;
use common::errors::{AppError, AppResult};
use common::middleware::REQUEST_ID_HEADER;
use common::response::ErrorBody;
use common::utils::IdGenerator;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::endpoints::{self, PathParams};

const USER_AGENT: &str = concat!("pgm/", env!("CARGO_PKG_VERSION"));

/// Per-request options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    /// Overrides the client-wide timeout for this request.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn json_body(mut self, method: Method, body: serde_json::Value) -> Self {
        self.method = method;
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Thin wrapper around `reqwest::Client` bound to one backend.
#[derive(Clone)]
pub struct HttpClient {
    base_url: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client from validated configuration.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "unsupported URL scheme: {}",
                base_url.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http,
            timeout: config.timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves a route template against the base URL.
    pub fn url_for(&self, template: &str, params: &PathParams<'_>) -> AppResult<Url> {
        endpoints::resolve(&self.base_url, template, params)
    }

    /// Issues a request and decodes a JSON body into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        template: &str,
        params: &PathParams<'_>,
        options: RequestOptions,
    ) -> AppResult<T> {
        let limit = options.timeout.unwrap_or(self.timeout);
        let response = self.send(template, params, options).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, limit))?;

        serde_json::from_slice(&bytes).map_err(|e| AppError::UnexpectedResponse(e.to_string()))
    }

    /// Issues a request and returns the raw body.
    pub async fn request_bytes(
        &self,
        template: &str,
        params: &PathParams<'_>,
        options: RequestOptions,
    ) -> AppResult<Vec<u8>> {
        let limit = options.timeout.unwrap_or(self.timeout);
        let response = self.send(template, params, options).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, limit))?;
        Ok(bytes.to_vec())
    }

    /// Sends the request; any non-2xx status is turned into [`AppError::Http`].
    async fn send(
        &self,
        template: &str,
        params: &PathParams<'_>,
        options: RequestOptions,
    ) -> AppResult<reqwest::Response> {
        let url = self.url_for(template, params)?;
        let limit = options.timeout.unwrap_or(self.timeout);
        let request_id = IdGenerator::request_id();

        let mut builder = self
            .http
            .request(options.method.clone(), url.clone())
            .timeout(limit)
            .header(ACCEPT, "application/json, application/sql;q=0.9, */*;q=0.8")
            .header(REQUEST_ID_HEADER.as_str(), request_id.as_str())
            .headers(options.headers);

        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = &options.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        tracing::debug!(
            method = %options.method,
            url = %url,
            request_id = %request_id,
            "sending request"
        );
        let started = Instant::now();

        let response = builder
            .send()
            .await
            .map_err(|e| map_transport_error(e, limit))?;

        let status = response.status();
        tracing::debug!(
            status = status.as_u16(),
            request_id = %request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(AppError::Http {
            status: status.as_u16(),
            message: extract_error_message(status, &body),
        })
    }
}

/// Picks the most useful message out of an error response.
///
/// Prefers `message`, then `error`; empty strings are skipped. Falls back to
/// the status line when the body is not a recognisable error document.
pub fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Some(parsed.error).filter(|e| !e.trim().is_empty()));
        if let Some(message) = message {
            return message;
        }
    }

    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

fn map_transport_error(err: reqwest::Error, limit: Duration) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(limit)
    } else if err.is_builder() {
        AppError::Validation(err.to_string())
    } else if err.is_decode() {
        AppError::UnexpectedResponse(err.to_string())
    } else {
        AppError::Network(err.to_string())
    }
}
