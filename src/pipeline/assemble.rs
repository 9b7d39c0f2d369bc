//! Record assembly: combine one process slice's parsed sections (or its
//! capability questions) into the canonical BPT/BCM records.
//!
//! Assembly is pure. The caller supplies everything that depends on the
//! outside world (source identifier, extraction date, diagrams), so the
//! same inputs always produce the same record.

use crate::area::{BusinessArea, DocumentFamily};
use crate::config::HeuristicPolicy;
use crate::pipeline::boundary::ProcessSlice;
use crate::pipeline::lists::{
    extract_bulleted_list, extract_description, extract_simple_list, extract_trigger_events,
};
use crate::pipeline::sections::{segment_sections, SectionKind};
use crate::pipeline::steps::extract_numbered_list;
use crate::record::{
    BcmRecord, CapabilityQuestion, Diagram, ExtractionMode, MaturityModel, ProcessDetails,
    ProcessRecord, Provenance, TriggerEvents,
};
use chrono::NaiveDate;
use tracing::warn;

/// Values shared by every record produced from one source document.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub area: BusinessArea,
    pub version: String,
    pub version_date: String,
    pub source_file: String,
    pub extracted_date: NaiveDate,
}

impl RecordContext {
    fn provenance(&self, pages: (usize, usize), mode: Option<ExtractionMode>) -> Provenance {
        Provenance {
            source_file: self.source_file.clone(),
            source_page_range: Provenance::page_range(pages.0, pages.1),
            extracted_date: self.extracted_date,
            extraction_mode: mode,
        }
    }
}

/// Today's local date, used for `extracted_date`.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Sub-category from a banner such as `CM Case Management` or
/// `FM – Accounts Payable Management`: the words after the code. Falls back
/// to the area name.
pub fn sub_category_from_banner(banner: Option<&str>, area: BusinessArea) -> String {
    let Some(banner) = banner else {
        return area.name().to_string();
    };
    let spaced = banner.replace(['\u{2013}', '\u{2014}'], " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    if words.len() > 1 {
        words[1..].join(" ")
    } else {
        area.name().to_string()
    }
}

/// Run every section reconstructor over one BPT process's lines.
pub fn parse_process_details(
    lines: &[String],
    area: BusinessArea,
    process_name: &str,
    policy: &HeuristicPolicy,
) -> ProcessDetails {
    let code = area.code();
    let mut details = ProcessDetails::default();

    let sections = segment_sections(lines, policy);
    if !sections.iter().any(|s| s.kind == SectionKind::Description) {
        warn!("'{}': no Description section", process_name);
    }

    for section in &sections {
        let body = section.body(lines);
        match section.kind {
            SectionKind::Description => details.description = extract_description(body),
            SectionKind::TriggerEvent => {
                let (environment_based, interaction_based) = extract_trigger_events(body);
                details.trigger_events = TriggerEvents {
                    environment_based,
                    interaction_based,
                };
            }
            SectionKind::Result => details.results = extract_bulleted_list(body),
            SectionKind::ProcessSteps => details.process_steps = extract_numbered_list(body),
            SectionKind::SharedData => {
                details.shared_data = extract_simple_list(body, code, process_name)
            }
            SectionKind::Predecessor => {
                details.predecessor_processes = extract_simple_list(body, code, process_name)
            }
            SectionKind::Successor => {
                details.successor_processes = extract_simple_list(body, code, process_name)
            }
            SectionKind::Constraints => details.constraints = extract_description(body),
            SectionKind::Failures => details.failures = extract_bulleted_list(body),
            SectionKind::PerformanceMeasures => {
                details.performance_measures = extract_bulleted_list(body)
            }
        }
    }

    if details.process_steps.is_empty() {
        warn!("'{}': no process steps recovered", process_name);
    }
    details
}

pub fn assemble_bpt(
    ctx: &RecordContext,
    slice: &ProcessSlice,
    mut details: ProcessDetails,
    diagrams: Vec<Diagram>,
    pages: (usize, usize),
) -> ProcessRecord {
    details.diagrams = diagrams;
    ProcessRecord {
        document_type: DocumentFamily::Bpt,
        version: ctx.version.clone(),
        version_date: ctx.version_date.clone(),
        business_area: ctx.area,
        sub_category: sub_category_from_banner(slice.category_line.as_deref(), ctx.area),
        process_name: slice.name.clone(),
        process_code: ctx.area.code().to_string(),
        process_details: details,
        metadata: ctx.provenance(pages, None),
    }
}

pub fn assemble_bcm(
    ctx: &RecordContext,
    slice: &ProcessSlice,
    questions: Vec<CapabilityQuestion>,
    mode: ExtractionMode,
    pages: (usize, usize),
) -> BcmRecord {
    BcmRecord {
        document_type: DocumentFamily::Bcm,
        version: ctx.version.clone(),
        version_date: ctx.version_date.clone(),
        business_area: ctx.area,
        sub_category: sub_category_from_banner(slice.category_line.as_deref(), ctx.area),
        process_name: slice.name.clone(),
        process_code: ctx.area.code().to_string(),
        maturity_model: MaturityModel {
            capability_questions: questions,
        },
        metadata: ctx.provenance(pages, Some(mode)),
    }
}
