use crate::parsers::text::{self, TextOptions};
use scraper::{Html, Selector};
use std::sync::LazyLock;

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

/// Converts an HTML page to Markdown text for the extraction prompt
///
/// Falls back to the plain body text when the Markdown conversion fails.
pub fn to_markdown(html: &str) -> String {
    let markdown = match htmd::convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            ::log::warn!("Markdown conversion failed, using plain text: {}", e);
            body_text(html)
        }
    };

    let options = TextOptions {
        preserve_paragraphs: true,
        preserve_line_breaks: true,
    };
    text::normalize(&markdown, &options)
}

/// Plain text of the document body with whitespace collapsed
pub fn body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    doc.select(&BODY_SELECTOR)
        .flat_map(|n| n.text())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
