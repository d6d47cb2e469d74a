//! Mock HTTP client for testing.
//!
//! Responses are scripted per connection attempt: each `open_stream`
//! call pops the next [`MockResponse`] from a queue, so a test can lay
//! out "fail, fail, succeed" reconnect scenarios up front.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::StreamRequest;
use crate::traits::{ByteStream, Headers, HttpClient, HttpError, StreamResponse};

/// A recorded request for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// JSON body (for POST requests)
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Scripted outcome of one connection attempt.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// 200 with these chunks, then a clean end of stream
    Stream(Vec<Bytes>),
    /// 200 with these chunks, then a body error
    StreamThenError(Vec<Bytes>, HttpError),
    /// 200 with these chunks, then the body stays open
    StreamThenHang(Vec<Bytes>),
    /// `open_stream` fails
    Error(HttpError),
    /// 200 with no body
    NoBody,
    /// `open_stream` never resolves
    Pending,
}

impl MockResponse {
    /// Convenience for text chunks.
    pub fn chunks<I, S>(chunks: I) -> Vec<Bytes>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        chunks.into_iter().map(|c| Bytes::from(c.into())).collect()
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use scanstream::adapters::mock::{MockHttpClient, MockResponse};
/// use scanstream::traits::HttpError;
///
/// let client = MockHttpClient::new();
/// client.push_response(MockResponse::Error(HttpError::ConnectionFailed("down".into())));
/// client.push_response(MockResponse::Stream(MockResponse::chunks(["data: {}\n\n"])));
///
/// // ... run a session ...
///
/// assert_eq!(client.request_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Responses consumed in order, one per attempt
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Headers attached to every successful response
    response_headers: Arc<Mutex<Headers>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            response_headers: Arc::new(Mutex::new(Headers::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue the outcome of the next unscripted attempt.
    pub fn push_response(&self, response: MockResponse) {
        self.script.lock().unwrap().push_back(response);
    }

    /// Set a header returned with every successful response.
    pub fn set_response_header(&self, name: &str, value: &str) {
        self.response_headers
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    fn record_request(&self, request: &StreamRequest) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });
    }

    fn ok(&self, body: Option<ByteStream>) -> StreamResponse {
        StreamResponse {
            status: 200,
            headers: self.response_headers.lock().unwrap().clone(),
            body,
        }
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn open_stream(&self, request: &StreamRequest) -> Result<StreamResponse, HttpError> {
        self.record_request(request);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Stream(chunks)) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>));
                Ok(self.ok(Some(Box::pin(stream))))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let stream = futures::stream::iter(
                    chunks.into_iter().map(Ok).chain(std::iter::once(Err(err))),
                );
                Ok(self.ok(Some(Box::pin(stream))))
            }
            Some(MockResponse::StreamThenHang(chunks)) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>))
                    .chain(futures::stream::pending());
                Ok(self.ok(Some(Box::pin(stream))))
            }
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::NoBody) => Ok(self.ok(None)),
            Some(MockResponse::Pending) => futures::future::pending().await,
            None => Err(HttpError::ConnectionFailed(format!(
                "No mock response scripted for {}",
                request.url
            ))),
        }
    }
}
