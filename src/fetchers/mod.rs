//! Page fetching collaborators.
//!
//! Both backends share one [`Pacer`] so the whole process keeps a minimum
//! interval between outbound requests.

pub mod http;
pub mod pacing;
pub mod webdriver;

use crate::config::{FetchBackend, FetchConfig};
use crate::error::FetchError;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub use http::HttpFetcher;
pub use pacing::Pacer;
pub use webdriver::WebDriverFetcher;

/// Something that can turn a URL into page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the body of `url`
    ///
    /// Retries are the implementation's business; an `Err` means the page
    /// could not be read within the configured budget.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;

    /// Release any session held by the fetcher
    async fn close(&self) {}
}

/// Build the fetcher selected by `config.backend`
pub fn build_fetcher(
    config: &FetchConfig,
    pacer: Arc<Pacer>,
) -> Result<Arc<dyn PageFetcher>, FetchError> {
    match config.backend {
        FetchBackend::Http => Ok(Arc::new(HttpFetcher::new(config.clone(), pacer)?)),
        FetchBackend::WebDriver => Ok(Arc::new(WebDriverFetcher::new(config.clone(), pacer))),
    }
}
