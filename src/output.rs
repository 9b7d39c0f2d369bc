//! Output layout and run reports.
//!
//! Every record becomes one JSON file at
//! `<output_base>/<bpt|bcm>/<area dir>/<CODE>_<name>_<TAG>_v<version>.json`.
//! The report types here describe what a run did with each area and file.

use crate::area::{BusinessArea, DocumentFamily};
use crate::error::AreaError;
use crate::record::ExtractedRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ── Paths ────────────────────────────────────────────────────────────────

/// File-name-safe form of a process name: spaces and `/` become `_`.
pub fn sanitize_name(name: &str) -> String {
    name.replace([' ', '/'], "_")
}

/// `<output_base>/<bpt|bcm>/<area dir>`.
pub fn area_output_dir(output_base: &Path, family: DocumentFamily, area: BusinessArea) -> PathBuf {
    output_base.join(family.dir_name()).join(area.dir_name())
}

/// Directory for exported BPT diagrams of one area.
pub fn images_dir(output_base: &Path, area: BusinessArea) -> PathBuf {
    area_output_dir(output_base, DocumentFamily::Bpt, area).join("images")
}

pub fn record_filename(code: &str, process_name: &str, family: DocumentFamily, version: &str) -> String {
    format!(
        "{}_{}_{}_v{}.json",
        code,
        sanitize_name(process_name),
        family.tag(),
        version
    )
}

/// Where `record` is written under `output_base`.
pub fn record_path(output_base: &Path, record: &ExtractedRecord) -> PathBuf {
    area_output_dir(output_base, record.family(), record.business_area()).join(record_filename(
        record.process_code(),
        record.process_name(),
        record.family(),
        record.version(),
    ))
}

// ── Reports ──────────────────────────────────────────────────────────────

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    /// The file already existed and overwrite was off.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    pub process_name: String,
    pub path: PathBuf,
    pub status: WriteStatus,
}

/// Result of extracting one area/family pair.
#[derive(Debug, Clone, Serialize)]
pub struct AreaReport {
    pub area: BusinessArea,
    pub family: DocumentFamily,
    pub source_file: PathBuf,
    /// Every record assembled from the source, in document order.
    pub records: Vec<ExtractedRecord>,
    pub files: Vec<WrittenFile>,
    pub duration_ms: u64,
}

impl AreaReport {
    pub fn written(&self) -> usize {
        self.files.iter().filter(|f| f.status == WriteStatus::Written).count()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().filter(|f| f.status == WriteStatus::Skipped).count()
    }
}

/// One area/family pair of a batch run, successful or not.
#[derive(Debug, Clone, Serialize)]
pub struct AreaOutcome {
    pub area: BusinessArea,
    pub family: DocumentFamily,
    pub result: Result<AreaReport, AreaError>,
}

impl AreaOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn report(&self) -> Option<&AreaReport> {
        self.result.as_ref().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub areas_total: usize,
    pub areas_succeeded: usize,
    pub areas_failed: usize,
    pub records_total: usize,
    pub files_written: usize,
    pub files_skipped: usize,
    pub bpt_records: usize,
    pub bcm_records: usize,
    pub capability_questions: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub outcomes: Vec<AreaOutcome>,
    pub stats: ExtractionStats,
}

impl ExtractionSummary {
    pub fn from_outcomes(outcomes: Vec<AreaOutcome>, total_duration_ms: u64) -> Self {
        let mut stats = ExtractionStats {
            areas_total: outcomes.len(),
            total_duration_ms,
            ..ExtractionStats::default()
        };
        for outcome in &outcomes {
            let Some(report) = outcome.report() else {
                stats.areas_failed += 1;
                continue;
            };
            stats.areas_succeeded += 1;
            stats.records_total += report.records.len();
            stats.files_written += report.written();
            stats.files_skipped += report.skipped();
            for record in &report.records {
                match record {
                    ExtractedRecord::Bpt(_) => stats.bpt_records += 1,
                    ExtractedRecord::Bcm(r) => {
                        stats.bcm_records += 1;
                        stats.capability_questions += r.maturity_model.capability_questions.len();
                    }
                }
            }
        }
        Self { outcomes, stats }
    }

    pub fn errors(&self) -> impl Iterator<Item = &AreaError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }
}
