use crate::parsers::links::{COMMON_LEGAL_PATHS, extract_links};
use url::Url;

fn base() -> Url {
    Url::parse("https://example.com/").unwrap()
}

#[cfg(test)]
mod anchor_tests {
    use super::*;

    #[test]
    fn test_relative_anchors_are_resolved() {
        let html = r#"<html><body>
            <a href="/impressum">Impressum</a>
            <a href="privacy.html">Privacy</a>
        </body></html>"#;

        let links = extract_links(html, &base());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url.as_str(), "https://example.com/impressum");
        assert_eq!(links[0].text, "Impressum");
        assert_eq!(links[0].href, "/impressum");
        assert_eq!(links[1].url.as_str(), "https://example.com/privacy.html");
    }

    #[test]
    fn test_only_same_host_links_are_kept() {
        let html = r#"<html><body>
            <a href="https://example.com/legal">Legal</a>
            <a href="https://facebook.com/example">Facebook</a>
            <a href="mailto:info@example.com">Mail</a>
            <a href="/kontakt">Kontakt</a>
        </body></html>"#;

        let base = base();
        let links = extract_links(html, &base);
        assert_eq!(links.len(), 2);
        for link in &links {
            assert_eq!(link.url.host_str(), base.host_str());
        }
    }

    #[test]
    fn test_anchor_text_is_whitespace_collapsed() {
        let html = r#"<a href="/imprint">
            Legal
              <span>Notice</span>
        </a>"#;

        let links = extract_links(html, &base());
        assert_eq!(links[0].text, "Legal Notice");
    }

    #[test]
    fn test_insertion_order_and_duplicates_are_preserved() {
        let html = r#"
            <a href="/b">B</a>
            <a href="/a">A</a>
            <a href="/b">B again</a>
        "#;

        let links = extract_links(html, &base());
        let paths: Vec<&str> = links.iter().map(|l| l.url.path()).collect();
        assert_eq!(paths, vec!["/b", "/a", "/b"]);
    }

    #[test]
    fn test_anchors_resolve_against_subpage_base() {
        let base = Url::parse("https://example.com/company/legal/").unwrap();
        let html = r#"<a href="imprint">Imprint</a>"#;

        let links = extract_links(html, &base);
        assert_eq!(
            links[0].url.as_str(),
            "https://example.com/company/legal/imprint"
        );
    }
}

#[cfg(test)]
mod fallback_tests {
    use super::*;

    #[test]
    fn test_onclick_targets_are_extracted() {
        let html = r#"<html><body>
            <button onclick="window.location.href='/impressum'">Impressum</button>
            <div onclick="window.open('/datenschutz')">Datenschutz</div>
            <span onclick="doSomething('/ignored')">Ignored</span>
        </body></html>"#;

        let links = extract_links(html, &base());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url.as_str(), "https://example.com/impressum");
        assert_eq!(links[0].text, "Impressum");
        assert_eq!(links[0].href, "/impressum");
        assert_eq!(links[1].url.path(), "/datenschutz");
    }

    #[test]
    fn test_onclick_targets_on_other_hosts_are_dropped() {
        let html = r#"<button onclick="location='https://other.com/imprint'">Imprint</button>"#;

        let links = extract_links(html, &base());
        // Falls through to the common-path guesses
        assert_eq!(links.len(), COMMON_LEGAL_PATHS.len());
        assert!(links.iter().all(|l| l.text.starts_with("Common path: ")));
    }

    #[test]
    fn test_zero_anchors_yield_common_paths() {
        let html = "<html><body><p>Welcome to our site</p></body></html>";

        let links = extract_links(html, &base());
        assert!(!links.is_empty());
        assert_eq!(links.len(), COMMON_LEGAL_PATHS.len());
        for (link, path) in links.iter().zip(COMMON_LEGAL_PATHS) {
            assert_eq!(link.href, *path);
            assert_eq!(link.url.path(), *path);
            assert_eq!(link.text, format!("Common path: {}", path));
        }
    }

    #[test]
    fn test_common_paths_are_skipped_when_onclick_finds_something() {
        let html = r#"<div onclick="location.href='/imprint'">Imprint</div>"#;

        let links = extract_links(html, &base());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url.path(), "/imprint");
    }

    #[test]
    fn test_external_only_anchors_fall_back() {
        let html = r#"<footer class="site-footer">
            <a href="https://cdn.other.net/x">External</a>
        </footer>"#;

        let links = extract_links(html, &base());
        assert_eq!(links.len(), COMMON_LEGAL_PATHS.len());
    }
}
