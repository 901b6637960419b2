use crate::filter::LinkFilter;
use crate::results::Link;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

static CLICKABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("button[onclick], div[onclick], span[onclick]")
        .expect("valid clickable selector")
});

static CONTAINER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("nav[class], footer[class], div[class]").expect("valid container selector"));

static CONTAINER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(nav|menu|footer|legal)").expect("valid class pattern"));

static QUOTED_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid quoted pattern"));

/// Paths tried when a page exposes no usable links at all
pub const COMMON_LEGAL_PATHS: &[&str] = &[
    "/impressum",
    "/imprint",
    "/legal",
    "/legal-notice",
    "/impressum.html",
    "/imprint.html",
    "/legal.html",
    "/impressum.php",
    "/imprint.php",
    "/legal.php",
    "/kontakt",
    "/contact",
    "/about",
    "/ueber-uns",
];

/// Extracts same-site candidate links from an HTML document
///
/// Anchors are collected first. If none survive the same-site filter, the
/// fallbacks run in order and all contribute: `onclick` navigation targets,
/// anchors inside navigation/footer/legal containers, and finally a fixed
/// list of common legal paths (unverified guesses).
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Link> {
    let doc = Html::parse_document(html);
    let filter = LinkFilter::for_base(base_url);

    let mut links = anchor_links(doc.select(&ANCHOR_SELECTOR), base_url, &filter);
    ::log::debug!("Anchor scan found {} same-site links", links.len());

    if links.is_empty() {
        ::log::info!("No standard links found on {}, trying fallback methods", base_url);

        links.extend(onclick_links(&doc, base_url, &filter));

        for container in doc.select(&CONTAINER_SELECTOR) {
            let class = container.value().attr("class").unwrap_or_default();
            if CONTAINER_CLASS.is_match(class) {
                links.extend(anchor_links(
                    container.select(&ANCHOR_SELECTOR),
                    base_url,
                    &filter,
                ));
            }
        }

        if links.is_empty() {
            ::log::info!("Trying common imprint URL patterns for {}", base_url);
            links.extend(common_path_links(base_url));
        }
    }

    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).map(|l| l.url.as_str()).collect::<Vec<_>>()
        );
    }

    links
}

/// Resolve and filter a set of anchor elements
fn anchor_links<'a>(
    anchors: impl Iterator<Item = ElementRef<'a>>,
    base_url: &Url,
    filter: &LinkFilter,
) -> Vec<Link> {
    anchors
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            resolve(base_url, href, &visible_text(anchor), filter)
        })
        .collect()
}

/// Navigation targets hidden in `onclick` handlers of non-anchor elements
fn onclick_links(doc: &Html, base_url: &Url, filter: &LinkFilter) -> Vec<Link> {
    doc.select(&CLICKABLE_SELECTOR)
        .filter_map(|element| {
            let onclick = element.value().attr("onclick")?;
            if !(onclick.contains("location") || onclick.contains("window.open")) {
                return None;
            }
            let target = QUOTED_TARGET.captures(onclick)?.get(1)?.as_str();
            resolve(base_url, target, &visible_text(element), filter)
        })
        .collect()
}

/// Synthetic candidates for well-known legal paths
fn common_path_links(base_url: &Url) -> Vec<Link> {
    COMMON_LEGAL_PATHS
        .iter()
        .filter_map(|path| {
            let url = base_url.join(path).ok()?;
            Some(Link::new(url, format!("Common path: {}", path), *path))
        })
        .collect()
}

fn resolve(base_url: &Url, href: &str, text: &str, filter: &LinkFilter) -> Option<Link> {
    let href = href.trim();
    let url = base_url.join(href).ok()?;
    if !filter.accepts(&url) {
        ::log::trace!("Link filter rejected: {}", url);
        return None;
    }
    Some(Link::new(url, text, href))
}

/// Text content of an element with whitespace collapsed
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
