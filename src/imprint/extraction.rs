//! Structured field extraction from the imprint page text.

use crate::llm::LanguageModel;
use crate::parsers::text::truncate_chars;
use crate::results::ExtractedFields;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Error marker when the model could not be reached
pub const NO_RESPONSE: &str = "No response from language model";

/// Error marker when the model's answer holds no JSON object
pub const UNPARSEABLE: &str = "Unparseable model response";

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object pattern"));

const SCHEMA: &str = r#"{
  "company_name": "Main company/organization name",
  "managing_directors": ["Director 1", "Director 2"],
  "business_address": {
    "street": "Street address",
    "city": "City name",
    "postal_code": "Postal code",
    "country": "Country"
  },
  "phone_numbers": ["Phone 1", "Phone 2"],
  "email_addresses": ["email1@example.com"],
  "website_url": "https://website.com",
  "registration_details": {
    "trade_register": "Register name",
    "registration_number": "Registration number",
    "court": "Court name"
  },
  "vat_id": "VAT ID number",
  "tax_id": "Tax ID number",
  "professional_liability_insurance": "Insurance details",
  "other_legal_info": {
    "key": "value"
  }
}"#;

/// Ask the model for the structured record; never fails
pub async fn extract_fields(
    model: &dyn LanguageModel,
    page_text: &str,
    max_prompt_chars: usize,
) -> ExtractedFields {
    let prompt = build_prompt(page_text, max_prompt_chars);
    match model.complete(&prompt).await {
        Ok(response) => parse_response(&response),
        Err(e) => {
            ::log::warn!("Field extraction failed: {}", e);
            ExtractedFields::error(NO_RESPONSE)
        }
    }
}

/// Extraction prompt with the fixed schema; page text is cut at `max_prompt_chars`
pub fn build_prompt(page_text: &str, max_prompt_chars: usize) -> String {
    let content = truncate_chars(page_text, max_prompt_chars);
    if content.len() < page_text.len() {
        ::log::debug!(
            "Page text truncated to {} characters for extraction",
            max_prompt_chars
        );
    }

    format!(
        "Analyze the following imprint/legal notice page content and extract all relevant \
legal and contact information.

IMPORTANT: Please use EXACTLY this JSON structure with these field names:

{SCHEMA}

Content to analyze:
{content}

Rules:
- Use null for missing information
- Keep text fields concise (max 200 characters each)
- For multiple entities, choose the PRIMARY/MAIN one
- Use consistent field names as shown above
- Do not create new field names

Respond with ONLY the JSON object, no additional text.
"
    )
}

/// Pull the JSON object out of a model answer
///
/// Models like to wrap the object in prose or code fences, so the widest
/// `{ ... }` span is parsed.
pub fn parse_response(response: &str) -> ExtractedFields {
    let response = response.trim();
    if response.is_empty() {
        return ExtractedFields::error(NO_RESPONSE);
    }

    let parsed = JSON_OBJECT
        .find(response)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    match parsed {
        Some(Value::Object(map)) => ExtractedFields::Data(map),
        _ => {
            ::log::warn!("Could not parse extraction response as JSON");
            ExtractedFields::Error {
                error: UNPARSEABLE.to_string(),
                raw_response: Some(response.to_string()),
            }
        }
    }
}
