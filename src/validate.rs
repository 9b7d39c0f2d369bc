//! Quality checks for extracted records.
//!
//! Validation never fails a run. Each record gets a [`ValidationReport`]
//! whose `issues` mark missing or broken content and whose `warnings` mark
//! content that looks thin or still carries page furniture.
//!
//! Checks run on the JSON form, so the same rules apply to freshly
//! assembled records and to files already on disk.

use crate::record::ExtractedRecord;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const COMMON_FIELDS: [&str; 8] = [
    "document_type",
    "version",
    "version_date",
    "business_area",
    "sub_category",
    "process_name",
    "process_code",
    "metadata",
];

/// Page furniture that should never survive into a description.
const ARTIFACTS: [&str; 8] = [
    "Part I",
    "Appendix C",
    "Appendix D",
    "Page ",
    "May 2014",
    "Version 3.0",
    "Model Details",
    "Matrix Details",
];

const LEVEL_KEYS: [&str; 5] = ["level_1", "level_2", "level_3", "level_4", "level_5"];

/// Findings for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// File path or process name.
    pub target: String,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// No issues. Warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, msg: impl Into<String>) {
        self.issues.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

pub fn validate_record(record: &ExtractedRecord) -> ValidationReport {
    match serde_json::to_value(record) {
        Ok(value) => validate_value(&value, record.process_name()),
        Err(e) => {
            let mut report = ValidationReport::new(record.process_name());
            report.issue(format!("Record does not serialise: {e}"));
            report
        }
    }
}

/// Validate a record in its JSON form.
pub fn validate_value(data: &Value, target: &str) -> ValidationReport {
    let mut report = ValidationReport::new(target);

    for field in COMMON_FIELDS {
        if data.get(field).is_none() {
            report.issue(format!("Missing required field: {field}"));
        }
    }

    match data.get("version").and_then(Value::as_str) {
        Some("3.0") => {}
        other => report.warn(format!("Unexpected version: {}", other.unwrap_or("none"))),
    }

    if let Some(name) = data.get("process_name").and_then(Value::as_str) {
        check_process_name(name, &mut report);
    }

    match data.get("document_type").and_then(Value::as_str) {
        Some("BPT") => check_bpt(data, &mut report),
        Some("BCM") => check_bcm(data, &mut report),
        other => report.issue(format!("Invalid document_type: {}", other.unwrap_or("none"))),
    }

    let meta = data.get("metadata");
    for field in ["source_file", "source_page_range", "extracted_date"] {
        if meta.and_then(|m| m.get(field)).is_none() {
            report.warn(format!("Missing metadata.{field}"));
        }
    }

    report
}

/// Read and validate one JSON file. Unreadable or malformed files are
/// reported as issues.
pub fn validate_file(path: &Path) -> ValidationReport {
    let target = path.display().to_string();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            let mut report = ValidationReport::new(target);
            report.issue(format!("Error reading file: {e}"));
            return report;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => validate_value(&value, &target),
        Err(e) => {
            let mut report = ValidationReport::new(target);
            report.issue(format!("Invalid JSON: {e}"));
            report
        }
    }
}

/// Validate every `*.json` file below `dir`, in path order.
pub fn validate_dir(dir: &Path) -> Vec<ValidationReport> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files);
    files.sort();
    debug!("Validating {} files under {}", files.len(), dir.display());
    files.iter().map(|p| validate_file(p)).collect()
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for path in entries.filter_map(Result::ok).map(|e| e.path()) {
        if path.is_dir() {
            collect_json_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "json") {
            out.push(path);
        }
    }
}

// ── Rules ────────────────────────────────────────────────────────────────

fn check_process_name(name: &str, report: &mut ValidationReport) {
    if name.trim().is_empty() {
        report.issue("Empty process_name");
        return;
    }
    let lower = name.to_lowercase();
    if lower.contains(".pdf") || name.contains('_') || name.contains("v3.0") || name.contains("Item Details") {
        report.issue(format!("Process name contains artifacts: {name}"));
    }
}

fn str_field<'a>(obj: &'a Value, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn array_len(obj: &Value, key: &str) -> Option<usize> {
    obj.get(key).and_then(Value::as_array).map(Vec::len)
}

fn check_bpt(data: &Value, report: &mut ValidationReport) {
    let Some(pd) = data.get("process_details") else {
        report.issue("Missing required field: process_details");
        return;
    };

    let desc = str_field(pd, "description");
    if desc.is_empty() {
        report.issue("Empty description");
    } else if desc.chars().count() < 100 {
        report.warn(format!("Very short description ({} chars)", desc.chars().count()));
    }
    if let Some(artifact) = ARTIFACTS.iter().find(|a| desc.contains(*a)) {
        report.warn(format!("description contains artifact: '{artifact}'"));
    }

    match pd.get("trigger_events") {
        Some(te) if te.is_object() => {
            let env = array_len(te, "environment_based").unwrap_or(0);
            let int = array_len(te, "interaction_based").unwrap_or(0);
            if env + int == 0 {
                report.warn("No trigger events found");
            }
        }
        _ => report.issue("trigger_events should be an object"),
    }

    let steps = pd.get("process_steps").and_then(Value::as_array);
    match steps.map(Vec::len) {
        None | Some(0) => report.issue("No process steps found"),
        Some(n) if n < 3 => report.warn(format!("Only {n} process steps")),
        Some(_) => {}
    }
    if let Some(i) = steps.and_then(|s| {
        s.iter()
            .position(|step| step.as_str().is_some_and(|t| t.contains("Item") || t.contains("Details")))
    }) {
        report.warn(format!("Process step {} may contain artifacts", i + 1));
    }

    if array_len(pd, "results").unwrap_or(0) == 0 {
        report.warn("No results found");
    }
    for field in ["shared_data", "predecessor_processes", "successor_processes"] {
        if array_len(pd, field).unwrap_or(0) == 0 {
            report.warn(format!("Empty {field}"));
        }
    }
    if str_field(pd, "constraints").is_empty() {
        report.warn("Empty constraints");
    }
    if array_len(pd, "failures").unwrap_or(0) == 0 {
        report.warn("No failures listed");
    }
}

fn check_bcm(data: &Value, report: &mut ValidationReport) {
    let Some(questions) = data
        .get("maturity_model")
        .and_then(|m| m.get("capability_questions"))
        .and_then(Value::as_array)
    else {
        report.issue("Missing maturity_model.capability_questions");
        return;
    };

    if questions.is_empty() {
        report.issue("No capability questions found");
    } else if questions.len() < 5 {
        report.warn(format!("Only {} questions (expected 8-12)", questions.len()));
    }

    for (i, q) in questions.iter().enumerate() {
        let n = i + 1;
        let text = str_field(q, "question");
        if text.is_empty() {
            report.issue(format!("Question {n}: Missing 'question' field"));
        } else {
            if !text.contains('?') {
                report.issue(format!("Question {n}: No question mark"));
            }
            if text.chars().count() < 10 {
                report.warn(format!("Question {n}: Very short question text"));
            }
            if text.starts_with("Capability Question") {
                report.warn(format!("Question {n} has 'Capability Question' prefix artifact"));
            }
        }

        if q.get("category").is_none() {
            report.warn(format!("Question {n}: Missing 'category' field"));
        }

        let Some(levels) = q.get("levels") else {
            report.issue(format!("Question {n}: Missing 'levels' field"));
            continue;
        };
        let mut empty = 0;
        for key in LEVEL_KEYS {
            match levels.get(key).and_then(Value::as_str) {
                None => report.issue(format!("Question {n}: Missing {key}")),
                Some(t) if t.trim().is_empty() => empty += 1,
                Some(_) => {}
            }
        }
        if empty == LEVEL_KEYS.len() {
            report.issue(format!("Question {n}: All levels empty"));
        } else if empty >= 3 {
            report.warn(format!("Question {n}: {empty} empty levels"));
        }
    }
}
