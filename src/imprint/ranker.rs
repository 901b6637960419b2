//! Lexical scoring of candidate links.
//!
//! Used as the rescue heuristic on hub pages and, when enabled, as the
//! last-resort pick when the classifier cannot be reached.

use crate::results::Link;

/// Candidates scoring below this are never returned
pub const SCORE_THRESHOLD: i32 = 5;

const EXACT_TEXTS: &[&str] = &["imprint", "impressum", "legal notice"];
const EXACT_HREF_PARTS: &[&str] = &["/imprint", "/impressum"];
const KEYWORDS: &[&str] = &["imprint", "impressum"];
const MODERATE_TEXTS: &[&str] = &["contact", "about us", "legal info", "legal information"];
const PENALTY_WORDS: &[&str] = &["privacy", "cookie", "terms"];

/// Scores a single link; higher means more likely to be the imprint page
///
/// The first matching tier sets the base score. Penalties for
/// privacy/cookie/terms wording and for very short text always apply.
pub fn score(link: &Link) -> i32 {
    let text = link.text.trim().to_lowercase();
    let href = link.href.to_lowercase();

    let mut score = if EXACT_TEXTS.contains(&text.as_str())
        || EXACT_HREF_PARTS.iter().any(|p| href.contains(p))
    {
        10
    } else if KEYWORDS.iter().any(|k| text.contains(k)) {
        8
    } else if KEYWORDS.iter().any(|k| href.contains(k)) {
        7
    } else if MODERATE_TEXTS.contains(&text.as_str()) {
        3
    } else if text.contains("legal") && text.contains("notice") {
        5
    } else {
        0
    };

    if PENALTY_WORDS.iter().any(|w| text.contains(w)) {
        score -= 2;
    }
    if text.chars().count() < 3 {
        score -= 3;
    }

    score
}

/// Picks the best-scoring link at or above [`SCORE_THRESHOLD`]
///
/// Ties keep their original order.
pub fn rank(links: &[Link]) -> Option<Link> {
    let mut candidates: Vec<(&Link, i32)> = links
        .iter()
        .map(|link| (link, score(link)))
        .inspect(|(link, s)| ::log::trace!("Score {} for {} ({:?})", s, link.url, link.text))
        .filter(|(_, s)| *s >= SCORE_THRESHOLD)
        .collect();

    // Stable sort keeps document order among equal scores
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    if !candidates.is_empty() {
        ::log::debug!("Found {} potential imprint links", candidates.len());
    }

    candidates.first().map(|(link, _)| Link::clone(link))
}
