//! Canonical record shapes written as one JSON file per process.
//!
//! Records are built once by [`crate::pipeline::assemble`] and never
//! mutated afterwards; re-extraction replaces the whole file.

use crate::area::{BusinessArea, CapabilityCategory, DocumentFamily};
use chrono::NaiveDate;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

// ── Steps ────────────────────────────────────────────────────────────────

/// A line nested under a numbered step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepLine {
    /// `a. …` sub-step, one indent.
    Lettered { key: char, text: String },
    /// `ii. …` sub-sub-step, two indents.
    Roman { key: String, text: String },
    /// `NOTE: …` annotation, one indent. Text keeps its `NOTE:` prefix.
    Note(String),
}

impl StepLine {
    /// The line without indentation, e.g. `a. sub one`.
    pub fn label(&self) -> String {
        match self {
            StepLine::Lettered { key, text } => format!("{key}. {text}"),
            StepLine::Roman { key, text } => format!("{key}. {text}"),
            StepLine::Note(text) => text.clone(),
        }
    }

    pub fn indent(&self) -> &'static str {
        match self {
            StepLine::Lettered { .. } | StepLine::Note(_) => "  ",
            StepLine::Roman { .. } => "    ",
        }
    }

    pub(crate) fn text_mut(&mut self) -> &mut String {
        match self {
            StepLine::Lettered { text, .. } | StepLine::Roman { text, .. } => text,
            StepLine::Note(text) => text,
        }
    }
}

/// A numbered top-level step with its nested lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub number: u32,
    pub text: String,
    pub children: Vec<StepLine>,
}

impl Step {
    /// Indentation-preserving text: the step unindented, lettered lines and
    /// notes at one indent, roman lines at two.
    pub fn render(&self) -> String {
        let mut out = format!("{}. {}", self.number, self.text);
        for child in &self.children {
            out.push('\n');
            out.push_str(child.indent());
            out.push_str(&child.label());
        }
        out
    }
}

/// One entry in a process's step sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEntry {
    Step(Step),
    /// Divider before an alternate branch whose numbering restarts at 1.
    AlternatePath { label: String },
}

impl StepEntry {
    pub fn render(&self) -> String {
        match self {
            StepEntry::Step(step) => step.render(),
            StepEntry::AlternatePath { label } => format!("--- Alternate Path: {label} ---"),
        }
    }

    pub fn as_step(&self) -> Option<&Step> {
        match self {
            StepEntry::Step(step) => Some(step),
            StepEntry::AlternatePath { .. } => None,
        }
    }
}

impl fmt::Display for StepEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// Steps are published as their rendered text blocks.
fn serialize_steps<S: Serializer>(steps: &[StepEntry], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(steps.len()))?;
    for entry in steps {
        seq.serialize_element(&entry.render())?;
    }
    seq.end()
}

// ── Provenance ───────────────────────────────────────────────────────────

/// How the BCM questions of a record were recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Spans clustered into table columns by x position.
    Position,
    /// Plain-text fallback; all level text lands in `level_1`.
    TextFallback,
}

/// Where a record came from. Serialised as the record's `metadata` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub source_file: String,
    /// `"<first>-<last>"`, 1-based inclusive.
    pub source_page_range: String,
    pub extracted_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_mode: Option<ExtractionMode>,
}

impl Provenance {
    pub fn page_range(first: usize, last: usize) -> String {
        format!("{first}-{last}")
    }
}

// ── BPT ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriggerEvents {
    pub environment_based: Vec<String>,
    pub interaction_based: Vec<String>,
}

impl TriggerEvents {
    pub fn is_empty(&self) -> bool {
        self.environment_based.is_empty() && self.interaction_based.is_empty()
    }
}

/// An exported process diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagram {
    pub filename: String,
    pub description: String,
    pub page_reference: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessDetails {
    pub description: String,
    pub trigger_events: TriggerEvents,
    pub results: Vec<String>,
    #[serde(serialize_with = "serialize_steps")]
    pub process_steps: Vec<StepEntry>,
    pub diagrams: Vec<Diagram>,
    pub shared_data: Vec<String>,
    pub predecessor_processes: Vec<String>,
    pub successor_processes: Vec<String>,
    pub constraints: String,
    pub failures: Vec<String>,
    pub performance_measures: Vec<String>,
}

/// A Business Process Template record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub document_type: DocumentFamily,
    pub version: String,
    pub version_date: String,
    pub business_area: BusinessArea,
    pub sub_category: String,
    pub process_name: String,
    pub process_code: String,
    pub process_details: ProcessDetails,
    pub metadata: Provenance,
}

// ── BCM ──────────────────────────────────────────────────────────────────

/// The five maturity-level cells of one question. Any may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaturityLevels {
    pub level_1: String,
    pub level_2: String,
    pub level_3: String,
    pub level_4: String,
    pub level_5: String,
}

impl MaturityLevels {
    /// Build from level texts in order; extra entries are ignored.
    pub fn from_texts<I: IntoIterator<Item = String>>(texts: I) -> Self {
        let mut levels = MaturityLevels::default();
        for (i, text) in texts.into_iter().enumerate().take(5) {
            *levels.slot_mut(i + 1) = text;
        }
        levels
    }

    /// Text of level `n` (1-based).
    pub fn get(&self, n: usize) -> &str {
        match n {
            1 => &self.level_1,
            2 => &self.level_2,
            3 => &self.level_3,
            4 => &self.level_4,
            5 => &self.level_5,
            _ => "",
        }
    }

    fn slot_mut(&mut self, n: usize) -> &mut String {
        match n {
            1 => &mut self.level_1,
            2 => &mut self.level_2,
            3 => &mut self.level_3,
            4 => &mut self.level_4,
            _ => &mut self.level_5,
        }
    }

    pub fn non_empty_count(&self) -> usize {
        (1..=5).filter(|&n| !self.get(n).trim().is_empty()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityQuestion {
    pub category: CapabilityCategory,
    pub question: String,
    pub levels: MaturityLevels,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaturityModel {
    pub capability_questions: Vec<CapabilityQuestion>,
}

/// A Business Capability Matrix record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BcmRecord {
    pub document_type: DocumentFamily,
    pub version: String,
    pub version_date: String,
    pub business_area: BusinessArea,
    pub sub_category: String,
    pub process_name: String,
    pub process_code: String,
    pub maturity_model: MaturityModel,
    pub metadata: Provenance,
}

// ── Either record ────────────────────────────────────────────────────────

/// A record of either family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedRecord {
    Bpt(ProcessRecord),
    Bcm(BcmRecord),
}

impl ExtractedRecord {
    pub fn family(&self) -> DocumentFamily {
        match self {
            ExtractedRecord::Bpt(_) => DocumentFamily::Bpt,
            ExtractedRecord::Bcm(_) => DocumentFamily::Bcm,
        }
    }

    pub fn business_area(&self) -> BusinessArea {
        match self {
            ExtractedRecord::Bpt(r) => r.business_area,
            ExtractedRecord::Bcm(r) => r.business_area,
        }
    }

    pub fn process_name(&self) -> &str {
        match self {
            ExtractedRecord::Bpt(r) => &r.process_name,
            ExtractedRecord::Bcm(r) => &r.process_name,
        }
    }

    pub fn process_code(&self) -> &str {
        match self {
            ExtractedRecord::Bpt(r) => &r.process_code,
            ExtractedRecord::Bcm(r) => &r.process_code,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            ExtractedRecord::Bpt(r) => &r.version,
            ExtractedRecord::Bcm(r) => &r.version,
        }
    }

    pub fn metadata(&self) -> &Provenance {
        match self {
            ExtractedRecord::Bpt(r) => &r.metadata,
            ExtractedRecord::Bcm(r) => &r.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_step() -> Step {
        Step {
            number: 3,
            text: "Validate the request".into(),
            children: vec![
                StepLine::Lettered {
                    key: 'a',
                    text: "Check identity".into(),
                },
                StepLine::Roman {
                    key: "ii".into(),
                    text: "Check address".into(),
                },
                StepLine::Note("NOTE: Manual review allowed".into()),
            ],
        }
    }

    #[test]
    fn step_render_indents_children() {
        assert_eq!(
            sample_step().render(),
            "3. Validate the request\n  a. Check identity\n    ii. Check address\n  NOTE: Manual review allowed"
        );
    }

    #[test]
    fn alternate_path_divider() {
        let e = StepEntry::AlternatePath {
            label: "Manual Override".into(),
        };
        assert_eq!(e.render(), "--- Alternate Path: Manual Override ---");
        assert!(e.as_step().is_none());
    }

    #[test]
    fn steps_serialise_as_strings() {
        let details = ProcessDetails {
            process_steps: vec![StepEntry::Step(sample_step())],
            ..ProcessDetails::default()
        };
        let v = serde_json::to_value(&details).unwrap();
        assert_eq!(v["process_steps"][0].as_str().unwrap().lines().count(), 4);
        assert!(v["trigger_events"]["environment_based"].is_array());
    }

    #[test]
    fn maturity_levels_from_texts() {
        let levels = MaturityLevels::from_texts(vec!["one".to_string(), String::new(), "three".into()]);
        assert_eq!(levels.get(1), "one");
        assert_eq!(levels.get(3), "three");
        assert_eq!(levels.get(5), "");
        assert_eq!(levels.non_empty_count(), 2);
    }

    #[test]
    fn question_omits_missing_note() {
        let q = CapabilityQuestion {
            category: CapabilityCategory::Timeliness,
            question: "Is it timely?".into(),
            levels: MaturityLevels::default(),
            note: None,
        };
        let v = serde_json::to_value(&q).unwrap();
        assert!(v.get("note").is_none());
        assert_eq!(
            v["category"],
            "Business Capability Quality: Timeliness of Process"
        );
    }

    #[test]
    fn page_range_format() {
        assert_eq!(Provenance::page_range(4, 7), "4-7");
    }
}
