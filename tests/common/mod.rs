#![allow(dead_code)]

use imprint_reader::ReaderConfig;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MODEL: &str = "mock-model";

/// Serves `html` at `url_path`
pub async fn mount_page(server: &MockServer, url_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Answers model calls whose prompt contains `marker` with `text`
pub async fn mount_model_reply(server: &MockServer, marker: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", MODEL)))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .mount(server)
        .await;
}

/// Routes classification prompts to `index` and extraction prompts to `record`
pub async fn mount_model(server: &MockServer, index: &str, record: &str) {
    mount_model_reply(server, "list of links from a website", index).await;
    mount_model_reply(server, "imprint/legal notice page content", record).await;
}

/// Configuration pointing the model at `server` and results at `results_dir`
pub fn config_for(server: &MockServer, results_dir: &Path) -> ReaderConfig {
    let mut config = ReaderConfig::default();
    config.llm.endpoint = server.uri();
    config.llm.model = MODEL.to_string();
    config.llm.backoff_base_ms = 1;
    config.llm.max_retries = 1;
    config.fetch.timeout_secs = 5;
    config.fetch.retry_delay_ms = 1;
    config.fetch.min_request_interval_ms = 0;
    config.output.results_dir = results_dir.display().to_string();
    config
}
