use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend answered with a non-2xx status
    #[error("backend returned HTTP {status}")]
    Status { status: StatusCode, body: String },

    #[error("failed to reach backend: {0}")]
    Network(#[source] reqwest::Error),

    #[error("backend returned an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("invalid backend request: {0}")]
    Request(String),
}

/// Successful backend answer
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Value,
}

/// Thin client for the external recommendation backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET with query parameters
    pub async fn get<P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<BackendReply, BackendError> {
        let request = self.http.get(self.url(path)).query(params);
        self.send(path, request).await
    }

    /// GET with a raw, already-encoded query string
    pub async fn get_raw(&self, path: &str, query: Option<&str>) -> Result<BackendReply, BackendError> {
        let url = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.url(path), q),
            _ => self.url(path),
        };
        let request = self.http.get(url);
        self.send(path, request).await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<BackendReply, BackendError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(path, request).await
    }

    /// POST url-encoded form fields
    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        path: &str,
        fields: &F,
    ) -> Result<BackendReply, BackendError> {
        let request = self.http.post(self.url(path)).form(fields);
        self.send(path, request).await
    }

    async fn send(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<BackendReply, BackendError> {
        debug!(path, "calling backend");
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "backend request failed");
            BackendError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path, status = status.as_u16(), body = %body, "backend returned an error status");
            return Err(BackendError::Status { status, body });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            warn!(path, error = %e, "backend body is not JSON");
            BackendError::Decode(e)
        })?;
        Ok(BackendReply { status, body })
    }
}
