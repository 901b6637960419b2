pub mod batch;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod filter;
pub mod imprint;
pub mod llm;
pub mod parsers;
pub mod record;
pub mod results;
pub mod sinks;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use config::ReaderConfig;
pub use error::{BatchError, ConfigError, FetchError, LlmError, SinkError};
pub use imprint::ImprintPipeline;
pub use results::{ExtractedFields, ImprintResult, Link};

use batch::BatchStats;
use fetchers::Pacer;
use llm::GeminiClient;
use sinks::{ConsolidationSummary, ResultStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Main builder for imprint extraction runs
pub struct ImprintReader {
    config: ReaderConfig,
    api_key: Option<String>,
}

impl Default for ImprintReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImprintReader {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ReaderConfig::default().with_env_overrides(),
            api_key: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config.with_env_overrides();
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ReaderConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, ConfigError> {
        let config = ReaderConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Use this API key instead of reading it from the environment
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the number of concurrent workers for batch runs
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    fn api_key(&self) -> Result<String, ConfigError> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            Some(_) => Err(ConfigError::MissingApiKey(self.config.llm.api_key_env.clone())),
            None => self.config.api_key(),
        }
    }

    /// Returns a factory producing independent pipelines that share one pacer
    ///
    /// Fails up front when no API key is available.
    pub fn pipeline_factory(
        &self,
    ) -> Result<impl Fn() -> Result<ImprintPipeline, BatchError> + Send + Sync + use<>, ConfigError>
    {
        let api_key = self.api_key()?;
        let config = self.config.clone();
        let pacer = Arc::new(Pacer::new(Duration::from_millis(
            config.fetch.min_request_interval_ms,
        )));

        Ok(move || -> Result<ImprintPipeline, BatchError> {
            let fetcher = fetchers::build_fetcher(&config.fetch, Arc::clone(&pacer))?;
            let model = GeminiClient::new(api_key.clone(), config.llm.clone())?;
            Ok(ImprintPipeline::new(fetcher, Arc::new(model))
                .with_config(config.pipeline.clone())
                .with_max_prompt_chars(config.llm.max_prompt_chars))
        })
    }

    /// Process one URL and persist the result
    pub async fn extract(&self, url: &str) -> Result<(ImprintResult, PathBuf), BatchError> {
        let factory = self.pipeline_factory()?;
        let pipeline = factory()?;
        let store = ResultStore::new(self.config.output.clone())?;

        let result = pipeline.process_input(url).await;
        pipeline.close().await;

        let path = store.record(&result).await?;
        Ok((result, path))
    }

    /// Process URLs from a CSV file
    ///
    /// `start` skips input rows and `max` caps how many are read.
    pub async fn run_batch(
        &self,
        csv_path: impl AsRef<Path>,
        start: usize,
        max: Option<usize>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<BatchStats, BatchError> {
        let factory = self.pipeline_factory()?;
        let urls = batch::load_urls(csv_path.as_ref(), start, max)?;
        let workers = self
            .config
            .workers
            .unwrap_or_else(|| batch::default_workers(max.unwrap_or(urls.len())));
        let store = Arc::new(ResultStore::new(self.config.output.clone())?);

        let stats = batch::run_batch(urls, workers, &factory, Arc::clone(&store), shutdown).await?;

        println!("\nAll results saved to:");
        println!("   - CSV: {}", store.csv_path().display());
        println!("   - JSON log: {}", store.master_log_path().display());
        println!("   - Individual files: {}", store.dir().display());
        Ok(stats)
    }

    /// Merge the per-result documents into one summary file
    pub fn consolidate(&self) -> Result<ConsolidationSummary, SinkError> {
        sinks::consolidate(
            Path::new(&self.config.output.results_dir),
            &self.config.output.master_log_file,
        )
    }
}
