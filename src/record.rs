//! Lookups into the extracted record and flattening for tabular output.
//!
//! Models do not always follow the requested schema, so each logical field
//! has a list of extraction paths tried in order.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A sequence of object keys leading to a value
pub type ExtractionPath = &'static [&'static str];

pub const COMPANY_NAME_PATHS: &[ExtractionPath] = &[
    &["company_name"],
    &["main_entity", "organization_name"],
    &["company_info", "name"],
    &["main_entity", "name"],
    &["organization_name"],
    &["name"],
    &["company"],
    &["entity_name"],
    &["business_name"],
];

pub const MANAGING_DIRECTORS_PATHS: &[ExtractionPath] = &[
    &["managing_directors"],
    &["main_entity", "managing_directors"],
    &["company_info", "managing_directors"],
];

pub const STREET_PATHS: &[ExtractionPath] = &[
    &["business_address", "street"],
    &["main_entity", "address", "street"],
    &["company_info", "address", "street"],
];

pub const CITY_PATHS: &[ExtractionPath] = &[
    &["business_address", "city"],
    &["main_entity", "address", "city"],
    &["company_info", "address", "city"],
];

pub const POSTAL_CODE_PATHS: &[ExtractionPath] = &[
    &["business_address", "postal_code"],
    &["main_entity", "address", "postal_code"],
    &["company_info", "address", "postal_code"],
];

pub const COUNTRY_PATHS: &[ExtractionPath] = &[
    &["business_address", "country"],
    &["main_entity", "address", "country"],
    &["company_info", "address", "country"],
];

pub const PHONE_PATHS: &[ExtractionPath] = &[
    &["phone_numbers"],
    &["main_entity", "phone_numbers"],
    &["company_info", "phone_numbers"],
];

pub const EMAIL_PATHS: &[ExtractionPath] = &[
    &["email_addresses"],
    &["main_entity", "email_addresses"],
    &["company_info", "email_addresses"],
];

pub const WEBSITE_PATHS: &[ExtractionPath] = &[
    &["website_url"],
    &["main_entity", "website_url"],
    &["company_info", "website_url"],
];

pub const REGISTRATION_NUMBER_PATHS: &[ExtractionPath] = &[
    &["registration_details", "registration_number"],
    &["main_entity", "registration_details", "registration_number"],
    &["company_info", "registration_details", "registration_number"],
];

pub const VAT_ID_PATHS: &[ExtractionPath] = &[
    &["vat_id"],
    &["main_entity", "vat_id"],
    &["company_info", "vat_id"],
];

/// Items of a list value shown in a summary column
const SUMMARY_LIST_ITEMS: usize = 3;

/// Follow `path` through nested objects
pub fn lookup<'a>(record: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(record.get(*first)?, |value, key| value.as_object()?.get(*key))
}

/// First non-empty value along `paths`, rendered for a summary column
///
/// Lists show their first three items joined with `"; "`. The text is cut to
/// `max_len` characters with a trailing `...`. Returns an empty string when
/// nothing matches.
pub fn first_value(record: &Map<String, Value>, paths: &[ExtractionPath], max_len: usize) -> String {
    for path in paths {
        let Some(value) = lookup(record, path).filter(|v| is_present(v)) else {
            continue;
        };

        let text = match value {
            Value::Array(items) => items
                .iter()
                .take(SUMMARY_LIST_ITEMS)
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join("; "),
            other => scalar_text(other),
        };
        return truncate(&text, max_len);
    }
    String::new()
}

/// The company name, wherever the model put it
pub fn company_name(record: &Map<String, Value>) -> Option<&str> {
    COMPANY_NAME_PATHS.iter().find_map(|path| {
        lookup(record, path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    })
}

/// Flatten a record into sorted `key -> text` pairs
///
/// Nested keys are joined with `_`, list items get an index suffix, and
/// lists of scalars additionally get a combined `"; "`-joined entry under
/// the list's own key. Null and empty lists become empty strings.
pub fn flatten(record: &Map<String, Value>, max_len: usize) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    flatten_into(&mut flat, "", record, max_len);
    flat
}

fn flatten_into(
    flat: &mut BTreeMap<String, String>,
    prefix: &str,
    object: &Map<String, Value>,
    max_len: usize,
) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };

        match value {
            Value::Object(nested) => flatten_into(flat, &key, nested, max_len),
            Value::Array(items) if items.is_empty() => {
                flat.insert(key, String::new());
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_key = format!("{}_{}", key, i);
                    match item {
                        Value::Object(nested) => flatten_into(flat, &item_key, nested, max_len),
                        other => {
                            flat.insert(item_key, truncate(&scalar_text(other), max_len));
                        }
                    }
                }
                if items.iter().all(|item| !item.is_object()) {
                    let combined = items.iter().map(scalar_text).collect::<Vec<_>>().join("; ");
                    flat.insert(key, truncate(&combined, max_len));
                }
            }
            other => {
                flat.insert(key, truncate(&scalar_text(other), max_len));
            }
        }
    }
}

/// Plain text for a value: strings unquoted, null empty, the rest as JSON
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Python-style truthiness, which is what "non-empty" means for a lookup
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Cut to `max_len` characters, ending in `...` when shortened
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_lookup() {
        let r = record(json!({ "a": { "b": { "c": 1 } }, "x": "y" }));
        assert_eq!(lookup(&r, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(&r, &["x", "b"]), None);
        assert_eq!(lookup(&r, &["missing"]), None);
        assert_eq!(lookup(&r, &[]), None);
    }

    #[test]
    fn test_company_name_paths() {
        assert_eq!(
            company_name(&record(json!({ "company_name": "Direct GmbH" }))),
            Some("Direct GmbH")
        );
        assert_eq!(
            company_name(&record(json!({
                "company_name": null,
                "main_entity": { "organization_name": "Nested AG" }
            }))),
            Some("Nested AG")
        );
        assert_eq!(
            company_name(&record(json!({ "business_name": "Last Resort KG" }))),
            Some("Last Resort KG")
        );
        assert_eq!(company_name(&record(json!({ "name": 5 }))), None);
    }

    #[test]
    fn test_first_value_renders_lists_and_alternatives() {
        let r = record(json!({
            "managing_directors": ["A", "B", "C", "D"],
            "company_info": { "address": { "city": "Berlin" } },
            "vat_id": ""
        }));
        assert_eq!(first_value(&r, MANAGING_DIRECTORS_PATHS, 150), "A; B; C");
        assert_eq!(first_value(&r, CITY_PATHS, 150), "Berlin");
        assert_eq!(first_value(&r, VAT_ID_PATHS, 150), "");
        assert_eq!(first_value(&r, CITY_PATHS, 5), "Be...");
        assert_eq!(first_value(&r, MANAGING_DIRECTORS_PATHS, 6), "A; ...");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("Müllerstraße 12", 8), "Mülle...");
        assert_eq!(truncate("abcdef", 2), "...");
    }

    #[test]
    fn test_flatten_shapes() {
        let r = record(json!({
            "company_name": "Example GmbH",
            "business_address": { "street": "Musterstr. 1", "city": null },
            "phone_numbers": ["+49 1", "+49 2"],
            "email_addresses": [],
            "offices": [{ "city": "Köln" }],
            "vat_id": null
        }));
        let flat = flatten(&r, 100);

        assert_eq!(flat["company_name"], "Example GmbH");
        assert_eq!(flat["business_address_street"], "Musterstr. 1");
        assert_eq!(flat["business_address_city"], "");
        assert_eq!(flat["phone_numbers_0"], "+49 1");
        assert_eq!(flat["phone_numbers_1"], "+49 2");
        assert_eq!(flat["phone_numbers"], "+49 1; +49 2");
        assert_eq!(flat["email_addresses"], "");
        assert_eq!(flat["offices_0_city"], "Köln");
        assert!(!flat.contains_key("offices"));
        assert_eq!(flat["vat_id"], "");
    }

    #[test]
    fn test_flatten_truncates_with_ellipsis() {
        let r = record(json!({ "other": "x".repeat(120) }));
        let flat = flatten(&r, 100);
        assert_eq!(flat["other"].chars().count(), 100);
        assert!(flat["other"].ends_with("..."));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let r = record(json!({
            "b": { "z": [1, 2], "a": "text" },
            "a": [{ "k": true }, { "k": false }]
        }));
        let first = flatten(&r, 100);
        let second = flatten(&r, 100);
        assert_eq!(first, second);
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec!["a_0_k", "a_1_k", "b_a", "b_z", "b_z_0", "b_z_1"]
        );
    }
}
