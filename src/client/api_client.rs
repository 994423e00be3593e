//! Upstream API client.
//!
//! Thin wrapper over `reqwest` that speaks the `{ success, data, message }`
//! envelope and turns failures into [`ApiError`]s.

use std::time::Duration;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::{query_pairs, ApiError, Result, RetryPolicy, FALLBACK_MESSAGE};
use crate::config::Config;
use crate::models::ApiEnvelope;

// == Api Client ==
/// JSON client for the storefront backend.
///
/// No retries and no timeout unless configured with
/// [`with_retry_policy`](Self::with_retry_policy) and
/// [`with_timeout`](Self::with_timeout).
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    retry: RetryPolicy,
    timeout: Option<Duration>,
}

impl ApiClient {
    // == Constructors ==
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
            retry: RetryPolicy::none(),
            timeout: None,
        }
    }

    /// Builds a client from the upstream settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(&config.upstream_base_url).with_retry_policy(config.retry_policy());
        if let Some(token) = &config.service_role_key {
            client = client.with_bearer_token(token.clone());
        }
        if let Some(secs) = config.request_timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        client
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Bounds each attempt, from connect until the body is read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == URL Building ==
    /// Joins `path` onto the base URL and appends the non-null members of
    /// `query` as a query string.
    pub fn build_url<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;

        let pairs = query_pairs(query)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    // == Verbs ==
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.build_url(path, query)?;
        self.send(Method::GET, url, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path, &())?;
        self.send(Method::POST, url, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path, &())?;
        self.send(Method::PUT, url, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.build_url(path, &())?;
        self.send(Method::PATCH, url, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.build_url(path, query)?;
        self.send(Method::DELETE, url, None).await
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url, body: Option<Value>) -> Result<T> {
        let data = self
            .retry
            .run(|| self.send_once(method.clone(), url.clone(), body.as_ref()))
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn send_once(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        debug!(method = %method, url = %url, "upstream request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(body);
        } else {
            request = request.header(reqwest::header::CONTENT_TYPE, "application/json");
        }

        let response = request.send().await?;
        handle_response(response).await
    }
}

// == Response Handling ==
/// HTTP status first, then the envelope's `success` flag.
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        });
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let envelope: ApiEnvelope<Value> = serde_json::from_str(&body)?;
    if !envelope.success {
        let message = envelope
            .message
            .or(envelope.error)
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        return Err(ApiError::Application(message));
    }

    Ok(envelope.data.unwrap_or(Value::Null))
}
