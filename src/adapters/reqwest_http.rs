//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production streaming transport, implementing
//! the [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::config::{RequestMethod, StreamRequest};
use crate::traits::{Headers, HttpClient, HttpError, StreamResponse};

/// HTTP client implementation using reqwest.
///
/// No request timeout is set: scan streams stay open for as long as the
/// scan runs. Liveness is the session's stall monitor's job.
///
/// # Example
///
/// ```ignore
/// use scanstream::adapters::ReqwestHttpClient;
/// use scanstream::config::StreamRequest;
/// use scanstream::traits::HttpClient;
///
/// let client = ReqwestHttpClient::new();
/// let response = client.open_stream(&StreamRequest::get("https://app.local/stream")).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Wrap a preconfigured client (proxy, TLS roots, connect timeout).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Map a send failure onto the transport error taxonomy.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert a body read error. Anything mid-stream counts as I/O.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Io(err.to_string())
        }
    }

    /// Non-UTF-8 header values are dropped.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn build_request(&self, request: &StreamRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            RequestMethod::Get => self.client.get(&request.url),
            RequestMethod::Post => self.client.post(&request.url),
        };
        builder = builder.header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn open_stream(&self, request: &StreamRequest) -> Result<StreamResponse, HttpError> {
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HttpError::ServerError { status, message });
        }

        let headers = Self::convert_headers(response.headers());
        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(Self::convert_body_error));

        Ok(StreamResponse::with_headers(status, headers, Box::pin(stream)))
    }
}
