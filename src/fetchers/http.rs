use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fetchers::{Pacer, PageFetcher};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Fetches pages with plain HTTP requests
pub struct HttpFetcher {
    client: Client,
    /// Same settings but without certificate verification
    insecure_client: Client,
    config: FetchConfig,
    pacer: Arc<Pacer>,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig, pacer: Arc<Pacer>) -> Result<Self, FetchError> {
        let insecure_client = build_client(&config, false)?;
        let client = if config.verify_tls {
            build_client(&config, true)?
        } else {
            insecure_client.clone()
        };

        Ok(Self {
            client,
            insecure_client,
            config,
            pacer,
        })
    }

    async fn get(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        self.pacer.wait().await;

        let response = client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let max_retries = self.config.max_retries;
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut last_error = None;

        for attempt in 0..max_retries {
            let last_attempt = attempt + 1 == max_retries;

            let error = match self.get(&self.client, url).await {
                Ok(body) => {
                    ::log::debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => e,
            };

            match &error {
                FetchError::Tls { .. } if self.config.verify_tls => {
                    ::log::warn!(
                        "TLS error on attempt {}/{} for {}, retrying without verification",
                        attempt + 1,
                        max_retries,
                        url
                    );
                    match self.get(&self.insecure_client, url).await {
                        Ok(body) => return Ok(body),
                        Err(e) => {
                            ::log::warn!("Failed even without TLS verification: {}", e);
                            last_error = Some(e);
                        }
                    }
                }
                FetchError::Timeout { .. } | FetchError::Connect { .. } => {
                    ::log::warn!("{} (attempt {}/{})", error, attempt + 1, max_retries);
                    last_error = Some(error);
                    if !last_attempt {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
                _ => {
                    ::log::warn!("{} (attempt {}/{})", error, attempt + 1, max_retries);
                    last_error = Some(error);
                    if !last_attempt {
                        tokio::time::sleep(retry_delay / 2).await;
                    }
                }
            }
        }

        ::log::error!("Error fetching {} after {} attempts", url, max_retries);
        Err(last_error.unwrap_or_else(|| FetchError::Request {
            url: url.to_string(),
            message: "no attempts were made".to_string(),
        }))
    }
}

fn build_client(config: &FetchConfig, verify_tls: bool) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

/// Map a reqwest error onto the fetch taxonomy
fn classify(url: &Url, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if is_tls_error(&error) {
        FetchError::Tls {
            url,
            message: error.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Request {
            url,
            message: error.to_string(),
        }
    }
}

/// TLS failures surface as connect errors; look for them in the source chain
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string().to_lowercase();
        if message.contains("certificate") || message.contains("tls") || message.contains("ssl") {
            return true;
        }
        source = cause.source();
    }
    false
}
