//! Model-backed choice of the imprint link among the homepage candidates.

use crate::error::LlmError;
use crate::llm::LanguageModel;
use crate::results::Link;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("valid integer pattern"));

/// What the classifier made of the candidate list
#[derive(Debug)]
pub enum Classification {
    /// The model picked this candidate
    Found(Link),
    /// The model answered that no candidate qualifies, or named an index out of range
    NoneFound,
    /// The model answered, but nothing in the answer identified a candidate
    Unparseable(String),
    /// The model could not be reached
    Unavailable(LlmError),
}

impl Classification {
    pub fn into_link(self) -> Option<Link> {
        match self {
            Classification::Found(link) => Some(link),
            _ => None,
        }
    }
}

/// Ask the model which candidate is the imprint page
pub async fn classify(model: &dyn LanguageModel, links: &[Link]) -> Classification {
    if links.is_empty() {
        return Classification::NoneFound;
    }

    let prompt = build_prompt(links);
    match model.complete(&prompt).await {
        Ok(response) => parse_response(&response, links),
        Err(e) => {
            ::log::warn!("Could not classify links: {}", e);
            Classification::Unavailable(e)
        }
    }
}

/// Prompt listing every candidate by index
pub fn build_prompt(links: &[Link]) -> String {
    let mut listing = String::new();
    for (i, link) in links.iter().enumerate() {
        let _ = writeln!(
            listing,
            "{}: URL: {}, Text: '{}', Href: '{}'",
            i, link.url, link.text, link.href
        );
    }

    format!(
        "Analyze the following list of links from a website and identify which one is most \
likely the imprint page (also known as \"Impressum\" in German, legal notice, or legal \
information page).

Links:
{listing}
Please respond with ONLY the number (index) of the link that is most likely the imprint \
page. If none of the links appear to be an imprint page, respond with \"-1\".

Look for keywords like: imprint, impressum, legal, notice, about, contact, terms, privacy, \
legal notice, disclaimer, etc.

If you see a \"legal\" or \"legal notice\" or similar page that might contain multiple legal \
documents including an imprint, choose that one.
"
    )
}

/// Interpret a free-text model answer against the candidate list
///
/// An answer that is exactly one candidate's href or URL selects it. Otherwise
/// the first integer token is read as an index; `-1` and anything outside
/// `0..links.len()` mean no candidate.
pub fn parse_response(response: &str, links: &[Link]) -> Classification {
    let answer = response.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`');

    if let Some(link) = links
        .iter()
        .find(|link| !answer.is_empty() && (link.href == answer || link.url.as_str() == answer))
    {
        ::log::debug!("Model named candidate {} directly", link.url);
        return Classification::Found(link.clone());
    }

    let Some(token) = INTEGER_TOKEN.find(answer) else {
        ::log::warn!("Could not parse model response: {}", answer);
        return Classification::Unparseable(answer.to_string());
    };

    match token.as_str().parse::<i64>() {
        Ok(-1) => {
            ::log::info!("No imprint page found in the links");
            Classification::NoneFound
        }
        Ok(index) => match usize::try_from(index).ok().and_then(|i| links.get(i)) {
            Some(link) => Classification::Found(link.clone()),
            None => {
                ::log::warn!(
                    "Model returned index {} for {} candidates",
                    index,
                    links.len()
                );
                Classification::NoneFound
            }
        },
        Err(_) => Classification::Unparseable(answer.to_string()),
    }
}
