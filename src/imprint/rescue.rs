//! Recovery from classifier picks that land on a generic legal/about hub.

use crate::imprint::ranker;
use crate::parsers::extract_links;
use crate::results::Link;

const HUB_WORDS: &[&str] = &["legal", "terms", "policies", "about", "footer"];
const DIRECT_WORDS: &[&str] = &["imprint", "impressum"];

/// True if the link looks like a hub page rather than the imprint itself
pub fn needs_rescue(link: &Link) -> bool {
    let text = link.text.to_lowercase();
    let href = link.href.to_lowercase();
    let mentions = |word: &&str| text.contains(word) || href.contains(word);

    HUB_WORDS.iter().any(mentions) && !DIRECT_WORDS.iter().any(mentions)
}

/// Look one level deeper for the real imprint link
///
/// `page_html` is the already-fetched content of `classified`. Returns the
/// better link if the hub page has one, otherwise `classified` unchanged.
pub fn maybe_rescue(classified: &Link, page_html: &str) -> Link {
    if !needs_rescue(classified) {
        return classified.clone();
    }

    ::log::info!("Checking for secondary imprint links in {}", classified.url);
    let secondary = extract_links(page_html, &classified.url);

    match ranker::rank(&secondary) {
        Some(link) => {
            ::log::info!("Found secondary imprint link: {}", link.url);
            link
        }
        None => {
            ::log::info!("No secondary imprint links found, using original page");
            classified.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn link(text: &str, href: &str) -> Link {
        let base = Url::parse("https://example.com/").unwrap();
        Link::new(base.join(href).unwrap(), text, href)
    }

    #[test]
    fn test_gate() {
        assert!(needs_rescue(&link("Legal", "/legal")));
        assert!(needs_rescue(&link("Über uns", "/about-us")));
        assert!(needs_rescue(&link("Rechtliches", "/policies")));
        assert!(!needs_rescue(&link("Legal notice / Impressum", "/legal")));
        assert!(!needs_rescue(&link("Legal", "/legal/imprint")));
        assert!(!needs_rescue(&link("Kontakt", "/kontakt")));
    }

    #[test]
    fn test_hub_page_yields_nested_imprint() {
        let hub = link("Legal", "/legal");
        let html = r#"<html><body>
            <a href="/legal/privacy">Privacy</a>
            <a href="/legal/impressum">Impressum</a>
        </body></html>"#;

        let rescued = maybe_rescue(&hub, html);
        assert_eq!(rescued.url.as_str(), "https://example.com/legal/impressum");
    }

    #[test]
    fn test_relative_links_resolve_against_hub_url() {
        let hub = link("About", "/company/about/");
        let html = r#"<a href="imprint">Imprint</a>"#;

        let rescued = maybe_rescue(&hub, html);
        assert_eq!(rescued.url.as_str(), "https://example.com/company/about/imprint");
    }

    #[test]
    fn test_hub_without_candidates_keeps_original() {
        let hub = link("Terms", "/terms");
        let html = r#"<a href="/shop">Shop</a><a href="/privacy">Privacy</a>"#;
        assert_eq!(maybe_rescue(&hub, html), hub);
    }

    #[test]
    fn test_direct_link_is_untouched() {
        let direct = link("Impressum", "/impressum");
        let html = r#"<a href="/other-impressum">Impressum</a>"#;
        assert_eq!(maybe_rescue(&direct, html), direct);
    }
}
