use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::LanguageModel;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a client; the key comes from configuration, never from source
    pub fn new(api_key: impl Into<String>, config: LlmConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            config,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// One request, no retries
    async fn generate_once(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Request(e.to_string())
            }
        })?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Exponential backoff with jitter before attempt `attempt` (1-based retries)
    fn backoff(&self, attempt: u32) -> Duration {
        let jitter = 0.5 + fastrand::f64();
        let base = self.config.backoff_base_ms as f64 * 2f64.powi(attempt as i32);
        Duration::from_millis((base * jitter) as u64)
    }
}

/// Seconds from a Retry-After header (delta-seconds form only)
fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let max_retries = self.config.max_retries;
        let mut last_error = LlmError::EmptyResponse;

        for attempt in 0..max_retries {
            if attempt > 0 {
                let wait = self.backoff(attempt);
                ::log::info!(
                    "Retrying model call in {:.1}s (attempt {}/{})",
                    wait.as_secs_f64(),
                    attempt + 1,
                    max_retries
                );
                tokio::time::sleep(wait).await;
            }

            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(LlmError::RateLimited { retry_after_secs }) => {
                    let secs = retry_after_secs
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                        .min(self.config.max_retry_after_secs);
                    ::log::warn!("Rate limited, waiting {}s...", secs);
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    last_error = LlmError::RateLimited { retry_after_secs };
                }
                Err(e) => {
                    ::log::warn!(
                        "Model call failed (attempt {}/{}): {}",
                        attempt + 1,
                        max_retries,
                        e
                    );
                    last_error = e;
                }
            }
        }

        Err(LlmError::Exhausted {
            attempts: max_retries,
            last: Box::new(last_error),
        })
    }
}
