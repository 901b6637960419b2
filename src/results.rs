use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// A candidate link discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL the link resolves to
    pub url: Url,

    /// Visible anchor text (may be empty)
    pub text: String,

    /// Raw attribute value as written in the document
    pub href: String,
}

impl Link {
    /// Create a new link
    pub fn new(url: Url, text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            url,
            text: text.into(),
            href: href.into(),
        }
    }
}

/// Payload of a result: either the structured record or an error marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedFields {
    /// Something went wrong, with a human-readable reason
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_response: Option<String>,
    },

    /// The JSON object returned by the model
    Data(Map<String, Value>),
}

impl ExtractedFields {
    /// Build an error marker
    pub fn error(reason: impl Into<String>) -> Self {
        ExtractedFields::Error {
            error: reason.into(),
            raw_response: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractedFields::Error { .. })
    }

    /// The record, if extraction succeeded
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            ExtractedFields::Data(map) => Some(map),
            ExtractedFields::Error { .. } => None,
        }
    }

    /// The error reason, if any
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExtractedFields::Error { error, .. } => Some(error),
            ExtractedFields::Data(_) => None,
        }
    }
}

/// Outcome of processing one input URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprintResult {
    /// The URL we were asked to process
    pub original_url: String,

    /// The page the fields were extracted from
    pub imprint_url: Option<Url>,

    /// Structured record or error marker
    pub extracted_fields: ExtractedFields,

    /// Markdown text of the imprint page
    pub raw_page_text: Option<String>,
}

impl ImprintResult {
    /// A result that failed before any imprint page was read
    pub fn failure(original_url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            imprint_url: None,
            extracted_fields: ExtractedFields::error(reason),
            raw_page_text: None,
        }
    }

    /// Counted as a success iff a record without an error marker is present
    pub fn is_success(&self) -> bool {
        !self.extracted_fields.is_error()
    }
}
