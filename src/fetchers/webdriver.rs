use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fetchers::{Pacer, PageFetcher};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use url::Url;

/// Common WebDriver addresses tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444",
];

/// Fetches pages through a browser session, for sites that render with JavaScript
///
/// The session is opened on first use and reused for later fetches. Each
/// batch worker owns its own fetcher and therefore its own session.
pub struct WebDriverFetcher {
    config: FetchConfig,
    pacer: Arc<Pacer>,
    client: Mutex<Option<Client>>,
}

impl WebDriverFetcher {
    pub fn new(config: FetchConfig, pacer: Arc<Pacer>) -> Self {
        Self {
            config,
            pacer,
            client: Mutex::new(None),
        }
    }

    /// Navigate and read the page source, bounded by the fetch timeout
    async fn scrape(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        let budget = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(budget, async {
            client.goto(url.as_str()).await?;
            Ok::<_, CmdError>(client.source().await?)
        })
        .await;

        match result {
            Ok(Ok(source)) => Ok(source),
            Ok(Err(e)) => Err(FetchError::WebDriver {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let mut guard = self.client.lock().await;

        if guard.is_none() {
            ::log::debug!("Connecting to WebDriver for {}", url);
            *guard = Some(connect(&self.config.webdriver_url, url).await?);
        }

        let mut last_error = None;
        for attempt in 0..2 {
            if attempt > 0 {
                // The session may have died; a fresh one gets a single retry
                ::log::warn!("Attempting to reconnect WebDriver session");
                if let Some(stale) = guard.take() {
                    close_session(stale).await;
                }
                match ClientBuilder::native().connect(&self.config.webdriver_url).await {
                    Ok(client) => {
                        ::log::info!("Reconnected to WebDriver");
                        *guard = Some(client);
                    }
                    Err(e) => {
                        ::log::error!("Failed to reconnect to WebDriver: {}", e);
                        break;
                    }
                }
            }

            let Some(client) = guard.as_ref() else {
                break;
            };

            self.pacer.wait().await;
            match self.scrape(client, url).await {
                Ok(source) => {
                    ::log::debug!("Scraped {} ({} bytes)", url, source.len());
                    return Ok(source);
                }
                Err(e) => {
                    ::log::warn!("{}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::WebDriver {
            url: url.to_string(),
            message: "no WebDriver session".to_string(),
        }))
    }

    /// End the browser session, if one was opened
    async fn close(&self) {
        if let Some(client) = self.client.lock().await.take() {
            close_session(client).await;
        }
    }
}

async fn close_session(client: Client) {
    if let Err(e) = client.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }
}

/// Connect to the configured WebDriver, falling back to common local addresses
async fn connect(webdriver_url: &str, target: &Url) -> Result<Client, FetchError> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS
        .iter()
        .filter(|url| **url != webdriver_url)
    {
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        // Fallback failures are expected; don't log each one
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(FetchError::WebDriver {
        url: target.to_string(),
        message: "could not connect to any WebDriver server".to_string(),
    })
}
