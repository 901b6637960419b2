use crate::config::PipelineConfig;
use crate::fetchers::PageFetcher;
use crate::imprint::classifier::{self, Classification};
use crate::imprint::{extraction, ranker, rescue};
use crate::llm::LanguageModel;
use crate::parsers::{extract_links, to_markdown};
use crate::results::{ExtractedFields, ImprintResult, Link};
use std::sync::Arc;
use url::Url;

const DEFAULT_MAX_PROMPT_CHARS: usize = 60_000;

/// Runs one input URL from homepage to structured record
///
/// Stateless between calls; the batch layer gives every worker its own
/// instance.
pub struct ImprintPipeline {
    fetcher: Arc<dyn PageFetcher>,
    model: Arc<dyn LanguageModel>,
    config: PipelineConfig,
    max_prompt_chars: usize,
}

impl ImprintPipeline {
    pub fn new(fetcher: Arc<dyn PageFetcher>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            fetcher,
            model,
            config: PipelineConfig::default(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Page text beyond this is cut from the extraction prompt
    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    /// Release fetcher resources once the pipeline is no longer needed
    pub async fn close(&self) {
        self.fetcher.close().await;
    }

    /// Process raw input, adding `https://` when no scheme is given
    pub async fn process_input(&self, raw: &str) -> ImprintResult {
        match parse_input_url(raw) {
            Some(url) => self.process(&url).await,
            None => {
                ::log::warn!("Skipping invalid URL: {:?}", raw);
                ImprintResult::failure(raw.trim(), "invalid URL")
            }
        }
    }

    /// Process one URL; every failure ends up as an error marker on the result
    pub async fn process(&self, url: &Url) -> ImprintResult {
        let original_url = url.to_string();
        ::log::info!("Processing URL: {}", url);

        ::log::info!("1. Fetching homepage content...");
        let home_html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                ::log::warn!("Could not fetch homepage: {}", e);
                return ImprintResult::failure(original_url, "could not fetch homepage");
            }
        };

        ::log::info!("2. Extracting links...");
        let links = extract_links(&home_html, url);
        ::log::info!("Found {} links", links.len());
        if links.is_empty() {
            return ImprintResult::failure(original_url, "no links found");
        }

        ::log::info!("3. Identifying imprint page...");
        let Some(classified) = self.identify(&links).await else {
            return ImprintResult::failure(original_url, "no imprint page identified");
        };
        ::log::info!("Identified imprint page: {}", classified.url);

        ::log::info!("4. Fetching imprint page content...");
        let classified_html = match self.fetcher.fetch(&classified.url).await {
            Ok(html) => html,
            Err(e) => {
                ::log::warn!("Could not fetch imprint page: {}", e);
                return ImprintResult {
                    imprint_url: Some(classified.url),
                    ..ImprintResult::failure(original_url, "could not fetch imprint page")
                };
            }
        };

        let (imprint_link, imprint_html) = self.rescue(classified, classified_html).await;

        ::log::info!("5. Converting to markdown...");
        let markdown = to_markdown(&imprint_html);

        ::log::info!("6. Extracting imprint data...");
        let extracted_fields =
            extraction::extract_fields(self.model.as_ref(), &markdown, self.max_prompt_chars)
                .await;
        if let ExtractedFields::Error { error, .. } = &extracted_fields {
            ::log::warn!("Extraction for {} produced an error: {}", url, error);
        }

        ImprintResult {
            original_url,
            imprint_url: Some(imprint_link.url),
            extracted_fields,
            raw_page_text: Some(markdown),
        }
    }

    /// Classifier pick, or the lexical ranker when the model is unreachable
    /// and the fallback is enabled
    async fn identify(&self, links: &[Link]) -> Option<Link> {
        match classifier::classify(self.model.as_ref(), links).await {
            Classification::Found(link) => Some(link),
            Classification::Unavailable(_) if self.config.heuristic_fallback => {
                ::log::info!("Classifier unavailable, falling back to link ranking");
                ranker::rank(links)
            }
            Classification::Unparseable(answer) => {
                ::log::warn!("Classification failed, unparseable answer: {}", answer);
                None
            }
            _ => None,
        }
    }

    /// Swap a hub page for the imprint it links to; failures keep the hub
    async fn rescue(&self, classified: Link, classified_html: String) -> (Link, String) {
        let candidate = rescue::maybe_rescue(&classified, &classified_html);
        if candidate.url == classified.url {
            return (classified, classified_html);
        }

        ::log::info!("4b. Fetching secondary imprint page...");
        match self.fetcher.fetch(&candidate.url).await {
            Ok(html) => {
                ::log::info!("Using secondary imprint page: {}", candidate.url);
                (candidate, html)
            }
            Err(e) => {
                ::log::warn!("Failed to fetch secondary page, using original: {}", e);
                (classified, classified_html)
            }
        }
    }
}

/// Parse a user-supplied URL, assuming `https://` when the scheme is missing
pub fn parse_input_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    let candidate = if has_scheme {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    Url::parse(&candidate)
        .ok()
        .filter(|url| url.host_str().is_some_and(|h| !h.is_empty()))
}
