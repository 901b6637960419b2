use crate::error::SinkError;
use crate::record;
use crate::results::ImprintResult;
use crate::sinks::write_atomically;
use crate::utils::host_file_stem;
use chrono::{DateTime, Local};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Timestamp used in file names and the `timestamp` field
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The JSON document stored for one result
///
/// Successful results also carry `flattened_data`, the record flattened to
/// `_`-joined keys with values cut to `max_field_length`.
pub fn document(result: &ImprintResult, now: DateTime<Local>, max_field_length: usize) -> Value {
    let flattened = result
        .extracted_fields
        .data()
        .map(|data| record::flatten(data, max_field_length));

    json!({
        "timestamp": now.format(TIMESTAMP_FORMAT).to_string(),
        "processing_info": {
            "date": now.format("%Y-%m-%d").to_string(),
            "time": now.format("%H:%M:%S").to_string(),
            "timezone": now.format("%Z").to_string(),
        },
        "url": result.original_url,
        "imprint_url": result.imprint_url.as_ref().map(|u| u.as_str()),
        "imprint_data": result.extracted_fields,
        "flattened_data": flattened,
        "markdown_content": result.raw_page_text,
    })
}

/// Write `document` to `{host}_{timestamp}.json` in `dir`
///
/// Results for the same host within one second get a numeric suffix instead
/// of overwriting each other.
pub fn write_document(
    dir: &Path,
    result: &ImprintResult,
    document: &Value,
    now: DateTime<Local>,
) -> Result<PathBuf, SinkError> {
    let stem = format!(
        "{}_{}",
        host_file_stem(&result.original_url),
        now.format(TIMESTAMP_FORMAT)
    );
    let contents = serde_json::to_vec_pretty(document)?;

    let mut suffix = 0;
    loop {
        let name = match suffix {
            0 => format!("{}.json", stem),
            n => format!("{}_{}.json", stem, n),
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&contents)
                    .map_err(|e| SinkError::io(&path, e))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(SinkError::io(&path, e)),
        }
    }
}

/// Append to the master log, keeping only the newest `limit` entries
pub fn append_to_master_log(path: &Path, document: Value, limit: usize) -> Result<(), SinkError> {
    let mut log = match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str::<Value>(&contents)?,
        Err(e) if e.kind() == ErrorKind::NotFound => json!({ "extractions": [] }),
        Err(e) => return Err(SinkError::io(path, e)),
    };

    if !log.get("extractions").is_some_and(Value::is_array) {
        ::log::warn!("Master log {} has no extractions list, starting a new one", path.display());
        log = json!({ "extractions": [] });
    }

    if let Some(entries) = log.get_mut("extractions").and_then(Value::as_array_mut) {
        entries.push(document);
        if entries.len() > limit {
            let excess = entries.len() - limit;
            entries.drain(..excess);
        }
    }

    write_atomically(path, &serde_json::to_vec_pretty(&log)?)
}
