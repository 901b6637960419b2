use crate::error::SinkError;
use crate::sinks::write_atomically;
use chrono::Local;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const CONSOLIDATED_FILE: &str = "consolidated_extractions.json";

/// Counts reported after consolidation
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationSummary {
    pub output: PathBuf,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percentage, one decimal place
    pub success_rate: f64,
}

/// Merge every per-result document in `dir` into one summary file
///
/// The master log and earlier consolidated output are skipped. Files that
/// cannot be read or parsed count as failures.
pub fn consolidate(dir: &Path, master_log_file: &str) -> Result<ConsolidationSummary, SinkError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| SinkError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.ends_with(".json") && name != master_log_file && name != CONSOLIDATED_FILE
        })
        .collect();
    files.sort();

    ::log::info!("Found {} individual JSON files to consolidate", files.len());

    let mut extractions = Vec::with_capacity(files.len());
    let mut successful = 0;
    let mut failed = 0;

    for path in &files {
        let document = std::fs::read_to_string(path)
            .ok()
            .and_then(|contents| serde_json::from_str::<Value>(&contents).ok());
        let Some(document) = document else {
            ::log::warn!("Error processing {}", path.display());
            failed += 1;
            continue;
        };

        let imprint_data = document.get("imprint_data").cloned().unwrap_or(json!({}));
        let success = is_successful(&imprint_data);
        if success {
            successful += 1;
        } else {
            failed += 1;
        }

        extractions.push(json!({
            "url": document.get("url").cloned().unwrap_or(json!("")),
            "imprint_url": document.get("imprint_url").cloned().unwrap_or(json!("")),
            "timestamp": document.get("timestamp").cloned().unwrap_or(json!("")),
            "success": success,
            "imprint_data": imprint_data,
        }));
    }

    let total = files.len();
    let success_rate = if total == 0 {
        0.0
    } else {
        (successful as f64 / total as f64 * 1000.0).round() / 10.0
    };

    let consolidated = json!({
        "metadata": {
            "total_urls_processed": total,
            "consolidation_date": Local::now().to_rfc3339(),
            "successful_extractions": successful,
            "failed_extractions": failed,
            "success_rate": success_rate,
        },
        "extractions": extractions,
    });

    let output = dir.join(CONSOLIDATED_FILE);
    write_atomically(&output, &serde_json::to_vec_pretty(&consolidated)?)?;

    Ok(ConsolidationSummary {
        output,
        total,
        successful,
        failed,
        success_rate,
    })
}

/// A non-empty record without an error marker
fn is_successful(imprint_data: &Value) -> bool {
    imprint_data
        .as_object()
        .is_some_and(|map| !map.is_empty() && map.get("error").is_none_or(Value::is_null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consolidate_counts_and_skips_logs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(
            dir.join("a_com_20250101_000000.json"),
            r#"{"url": "https://a.com", "imprint_url": "https://a.com/impressum", "timestamp": "20250101_000000", "imprint_data": {"company_name": "A"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("b_com_20250101_000001.json"),
            r#"{"url": "https://b.com", "imprint_url": null, "imprint_data": {"error": "no links found"}}"#,
        )
        .unwrap();
        std::fs::write(dir.join("c_com_20250101_000002.json"), "{ not json").unwrap();
        std::fs::write(dir.join("extraction_log.json"), r#"{"extractions": []}"#).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let summary = consolidate(dir, "extraction_log.json").unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.success_rate, 33.3);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.output).unwrap()).unwrap();
        let extractions = written["extractions"].as_array().unwrap();
        assert_eq!(extractions.len(), 2);
        assert_eq!(extractions[0]["success"], true);
        assert_eq!(extractions[1]["success"], false);
        assert_eq!(written["metadata"]["total_urls_processed"], 3);
    }

    #[test]
    fn test_rerun_ignores_previous_output() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("a_com_20250101_000000.json"),
            r#"{"url": "https://a.com", "imprint_data": {"company_name": "A"}}"#,
        )
        .unwrap();

        consolidate(tmp.path(), "extraction_log.json").unwrap();
        let again = consolidate(tmp.path(), "extraction_log.json").unwrap();
        assert_eq!(again.total, 1);
        assert_eq!(again.success_rate, 100.0);
    }
}
