//! Page fetching from the remote paged API.

use crate::config::SourceConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::PageNumber;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// A live page body: chunks arrive as the network delivers them.
pub type PageBody = Pin<Box<dyn Stream<Item = std::result::Result<Bytes, FetchError>> + Send>>;

/// Source of page bodies, one request per page number.
///
/// Implementations must return as soon as response headers arrive; the body
/// streams in behind the returned stream. The pipeline calls `fetch` strictly
/// sequentially, so implementations never see overlapping requests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page and return its body as a live byte stream.
    async fn fetch(&self, page: PageNumber) -> std::result::Result<PageBody, FetchError>;
}

/// HTTP implementation of [`PageFetcher`] backed by a shared reqwest client.
///
/// Issues `GET <base_url>?<page_param>=<n>` per page. A non-success status or
/// transport failure yields a [`FetchError`] tagged with the page number.
/// The configured per-page timeout covers headers and body; there is no
/// automatic retry.
#[derive(Debug)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    base_url: Url,
    page_param: String,
}

impl HttpPageFetcher {
    /// Build a fetcher from source configuration.
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let base_url = Url::parse(&source.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {}", source.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(source.fetch_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            page_param: source.page_param.clone(),
        })
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: Url, page_param: String) -> Self {
        Self {
            client,
            base_url,
            page_param,
        }
    }

    fn page_url(&self, page: PageNumber) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.page_param, &page.get().to_string());
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, page: PageNumber) -> std::result::Result<PageBody, FetchError> {
        let url = self.page_url(page);
        tracing::debug!(%page, %url, "requesting page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { page, status });
        }

        Ok(response
            .bytes_stream()
            .map_err(move |source| FetchError::Body { page, source })
            .boxed())
    }
}
