use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How pages are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    /// Plain HTTP requests
    #[default]
    Http,
    /// A browser driven over WebDriver (for JavaScript-rendered sites)
    WebDriver,
}

/// Configuration for page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub backend: FetchBackend,

    /// Per-request timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per page
    #[serde(default = "default_fetch_max_retries")]
    pub max_retries: u32,

    /// Pause between attempts after a timeout or connection error
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Minimum spacing between any two outbound fetches, process-wide
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Verify TLS certificates on the first try
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

/// Configuration for the language model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,

    /// Base for exponential backoff between attempts
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on a server-requested Retry-After wait
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Page text beyond this many characters is cut from the extraction prompt
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

/// Configuration for the per-URL pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Use the lexical ranker on homepage links when the classifier is unreachable
    #[serde(default)]
    pub heuristic_fallback: bool,
}

/// Configuration for result files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    #[serde(default = "default_csv_file")]
    pub csv_file: String,

    #[serde(default = "default_master_log_file")]
    pub master_log_file: String,

    /// Newest entries kept in the master log
    #[serde(default = "default_master_log_limit")]
    pub master_log_limit: usize,

    /// Truncation length for flattened values
    #[serde(default = "default_max_field_length")]
    pub max_field_length: usize,

    /// Truncation length for CSV summary columns
    #[serde(default = "default_summary_field_length")]
    pub summary_field_length: usize,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Worker count for batch runs (derived from the batch size if None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl ReaderConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.fetch.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Read the model API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ConfigError::MissingApiKey(self.llm.api_key_env.clone())),
        }
    }

    /// Reject values that would make calls unbounded or impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "llm.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.fetch.max_retries == 0 || self.llm.max_retries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_retries",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::default(),
            timeout_secs: default_fetch_timeout_secs(),
            max_retries: default_fetch_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            verify_tls: true,
            user_agent: default_user_agent(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_retry_after_secs: default_max_retry_after_secs(),
            api_key_env: default_api_key_env(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            csv_file: default_csv_file(),
            master_log_file: default_master_log_file(),
            master_log_limit: default_master_log_limit(),
            max_field_length: default_max_field_length(),
            summary_field_length: default_summary_field_length(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_fetch_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_min_request_interval_ms() -> u64 {
    200
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    45
}

fn default_llm_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_max_retry_after_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_max_prompt_chars() -> usize {
    60_000
}

fn default_results_dir() -> String {
    "results".to_string()
}

fn default_csv_file() -> String {
    "imprint_extractions.csv".to_string()
}

fn default_master_log_file() -> String {
    "extraction_log.json".to_string()
}

fn default_master_log_limit() -> usize {
    1000
}

fn default_max_field_length() -> usize {
    100
}

fn default_summary_field_length() -> usize {
    150
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ReaderConfig::from_json("{}").unwrap();
        assert_eq!(config.fetch.backend, FetchBackend::Http);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert!(config.fetch.verify_tls);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.max_retries, 3);
        assert_eq!(config.output.master_log_limit, 1000);
        assert!(!config.pipeline.heuristic_fallback);
        assert!(config.workers.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let json = r#"{
            "fetch": { "backend": "webdriver", "timeout_secs": 30 },
            "llm": { "model": "gemini-2.0-flash" },
            "workers": 4
        }"#;
        let config = ReaderConfig::from_json(json).unwrap();
        assert_eq!(config.fetch.backend, FetchBackend::WebDriver);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.max_retries, 2);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.timeout_secs, 45);
        assert_eq!(config.workers, Some(4));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = ReaderConfig::from_json(r#"{ "llm": { "timeout_secs": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "llm.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let mut config = ReaderConfig::default();
        config.llm.api_key_env = "IMPRINT_READER_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let err = config.api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(name) if name.contains("NEVER_SET")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "output": { "results_dir": "out" } }"#).unwrap();

        let config = ReaderConfig::from_file(&path).unwrap();
        assert_eq!(config.output.results_dir, "out");
        assert_eq!(config.output.csv_file, "imprint_extractions.csv");
    }
}
