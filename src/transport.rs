use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use thiserror::Error;

use crate::config::HttpSettings;

/// Upper bound on in-flight feed requests per provider.
pub const DEFAULT_MAX_WORKERS: usize = 30;

/// Why a single feed could not be fetched or decoded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not a feed document of the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// The worker pool could not start any work at all.
#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Source of raw feed documents.
///
/// The widget receives this as an injected dependency so tests can serve
/// canned documents without touching the network.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self, TransportSetupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent("VideoFeeds/1.0 (Feed Aggregator)")
            .build()
            .map_err(TransportSetupError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_reqwest)
    }
}

/// Fetches every URL with at most `max_workers` requests in flight and decodes
/// each body with `decode`.
///
/// The returned results line up index for index with `urls`. A failure of one
/// URL never affects the others; only a pool that cannot start returns `Err`.
pub async fn run_concurrently<D, F>(
    transport: &dyn FeedTransport,
    urls: &[String],
    max_workers: usize,
    decode: F,
) -> Result<Vec<Result<D, FetchError>>, TransportSetupError>
where
    D: Send,
    F: Fn(&str) -> Result<D, FetchError> + Sync,
{
    if max_workers == 0 {
        return Err(TransportSetupError::NoWorkers);
    }

    let decode = &decode;
    let results: Vec<_> = stream::iter(urls.iter().cloned())
        .map(|url: String| fetch_one(transport, url, decode))
        .buffered(max_workers)
        .collect()
        .await;

    Ok(results)
}

async fn fetch_one<D, F>(
    transport: &dyn FeedTransport,
    url: String,
    decode: &F,
) -> Result<D, FetchError>
where
    F: Fn(&str) -> Result<D, FetchError>,
{
    let body = transport.fetch(&url).await?;
    decode(&body)
}
