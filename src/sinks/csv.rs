use crate::config::OutputConfig;
use crate::error::SinkError;
use crate::record::{self, ExtractionPath};
use crate::results::ImprintResult;
use crate::sinks::json::TIMESTAMP_FORMAT;
use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::path::Path;

pub const HEADER: [&str; 18] = [
    "timestamp",
    "original_url",
    "imprint_url",
    "processing_date",
    "processing_time",
    "success",
    "error_message",
    "company_name",
    "managing_directors",
    "street",
    "city",
    "postal_code",
    "country",
    "phone",
    "email",
    "website",
    "registration_number",
    "vat_id",
];

/// Columns after `company_name`, in header order
const SUMMARY_COLUMNS: [&[ExtractionPath]; 10] = [
    record::MANAGING_DIRECTORS_PATHS,
    record::STREET_PATHS,
    record::CITY_PATHS,
    record::POSTAL_CODE_PATHS,
    record::COUNTRY_PATHS,
    record::PHONE_PATHS,
    record::EMAIL_PATHS,
    record::WEBSITE_PATHS,
    record::REGISTRATION_NUMBER_PATHS,
    record::VAT_ID_PATHS,
];

/// One CSV row for a result
pub fn row(result: &ImprintResult, now: DateTime<Local>, config: &OutputConfig) -> Vec<String> {
    let max_len = config.summary_field_length;

    let mut row = vec![
        now.format(TIMESTAMP_FORMAT).to_string(),
        result.original_url.clone(),
        result
            .imprint_url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_default(),
        now.format("%Y-%m-%d").to_string(),
        now.format("%H:%M:%S").to_string(),
        result.is_success().to_string(),
        result
            .extracted_fields
            .error_message()
            .unwrap_or_default()
            .to_string(),
    ];

    match result.extracted_fields.data() {
        Some(data) => {
            row.push(
                record::company_name(data)
                    .map(|name| record::truncate(name, max_len))
                    .unwrap_or_default(),
            );
            row.extend(
                SUMMARY_COLUMNS
                    .iter()
                    .map(|paths| record::first_value(data, paths, max_len)),
            );
        }
        None => row.resize(HEADER.len(), String::new()),
    }

    row
}

/// Append a result, writing the header first if the file is new or empty
pub fn append_result(
    path: &Path,
    result: &ImprintResult,
    now: DateTime<Local>,
    config: &OutputConfig,
) -> Result<(), SinkError> {
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SinkError::io(path, e))?;
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if needs_header {
        writer.write_record(HEADER)?;
    }
    writer.write_record(row(result, now, config))?;
    writer.flush().map_err(|e| SinkError::io(path, e))?;

    Ok(())
}
