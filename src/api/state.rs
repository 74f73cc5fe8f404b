//! Application state for the API server

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::fetch::{HttpPageFetcher, PageFetcher};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clones) and provides
/// access to the export configuration and the page fetcher.
#[derive(Clone)]
pub struct AppState {
    /// Export configuration
    pub config: Arc<Config>,

    /// Fetcher used by every export request (shares one HTTP client)
    pub fetcher: Arc<dyn PageFetcher>,
}

impl AppState {
    /// Create state backed by an HTTP fetcher built from the configuration.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        config.validate()?;
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(&config.source)?);
        Ok(Self { config, fetcher })
    }

    /// Create state around an existing fetcher.
    pub fn with_fetcher(config: Arc<Config>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { config, fetcher }
    }
}
