//! Process boundary detection over a whole document's line stream.
//!
//! A business-area PDF holds many processes back to back. These detectors
//! find where each one starts, recover its name and category banner, and
//! slice the stream so every process is parsed on its own.

use crate::area::BusinessArea;
use crate::config::HeuristicPolicy;
use crate::pipeline::normalize::is_item_details;
use crate::pipeline::sections::SectionKind;
use std::collections::HashSet;
use tracing::debug;

/// One detected process: its name, optional category banner and the
/// half-open line range of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSlice {
    pub name: String,
    /// The raw banner line, e.g. `CM Case Management` or
    /// `FM – Accounts Payable Management`.
    pub category_line: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

impl ProcessSlice {
    pub fn lines<'a>(&self, lines: &'a [String]) -> &'a [String] {
        let end = self.end_line.min(lines.len());
        &lines[self.start_line.min(end)..end]
    }
}

/// Group headings that sit above processes in the capability matrices and
/// must never be read as process names.
const GROUP_HEADINGS: [&str; 19] = [
    "Accounts Receivable Management",
    "Accounts Payable Management",
    "Fiscal Management",
    "Provider Information Management",
    "Provider Support",
    "Health Plan Administration",
    "Health Benefits Administration",
    "Plan Administration",
    "Contract Management",
    "Contractor Information Management",
    "Contractor Support",
    "Claims Adjudication",
    "Payment and Reporting",
    "Compliance Management",
    "Authorization Determination",
    "Case Management",
    "Provider Enrollment",
    "Standards Management",
    "Member Management",
];

const STOPWORDS: [&str; 9] = ["the", "and", "or", "of", "to", "for", "in", "a", "an"];

fn is_noise(line: &str) -> bool {
    line.chars().count() < 3
        || line.contains("Part I")
        || line.contains("Page")
        || line.contains("Version")
        || line.contains("May 2014")
}

pub(crate) fn contains_code_word(line: &str, code: &str) -> bool {
    line.split(|c: char| !c.is_alphanumeric()).any(|w| w == code)
}

pub(crate) fn starts_uppercase(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_uppercase)
}

/// Two or more words, each capitalised or a short stopword.
pub fn is_title_case_name(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    words.len() >= 2
        && words
            .iter()
            .all(|w| starts_uppercase(w) || STOPWORDS.contains(w))
}

fn close_slices(starts: Vec<(String, Option<String>, usize)>, total: usize, backoff: usize) -> Vec<ProcessSlice> {
    let next_starts: Vec<usize> = starts.iter().skip(1).map(|s| s.2).collect();
    starts
        .into_iter()
        .enumerate()
        .map(|(idx, (name, category_line, start_line))| {
            let end_line = next_starts
                .get(idx)
                .map_or(total, |&next| next.saturating_sub(backoff).max(start_line + 1));
            ProcessSlice {
                name,
                category_line,
                start_line,
                end_line,
            }
        })
        .collect()
}

// ── BPT ──────────────────────────────────────────────────────────────────

/// Find BPT processes: one per standalone `Description` title.
///
/// The name and category banner are recovered from the
/// `name_lookback_lines` lines above the title. Each process ends
/// `process_end_backoff` lines before the next process's title.
pub fn detect_bpt_processes(
    lines: &[String],
    area: BusinessArea,
    policy: &HeuristicPolicy,
) -> Vec<ProcessSlice> {
    let code = area.code();
    let description = SectionKind::Description.title();
    let mut starts = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.trim() != description {
            continue;
        }
        let mut name: Option<String> = None;
        let mut category: Option<String> = None;

        for j in (i.saturating_sub(policy.name_lookback_lines)..i).rev() {
            let candidate = lines[j].trim();
            if is_noise(candidate) || is_item_details(candidate) {
                continue;
            }
            if contains_code_word(candidate, code) && candidate.contains(' ') {
                if category.is_none() && name.as_deref() != Some(candidate) {
                    category = Some(candidate.to_string());
                }
                continue;
            }
            if name.is_none() && starts_uppercase(candidate) {
                name = Some(candidate.to_string());
            }
        }

        match name {
            Some(name) => {
                debug!("BPT process '{}' starts at line {}", name, i);
                starts.push((name, category, i));
            }
            None => debug!("Description at line {} has no recoverable name; skipped", i),
        }
    }

    close_slices(starts, lines.len(), policy.process_end_backoff)
}

// ── BCM ──────────────────────────────────────────────────────────────────

fn is_bcm_noise(line: &str, area: BusinessArea) -> bool {
    is_noise(line)
        || matches!(
            line,
            "Details" | "Item" | "Item Details" | "Capability" | "Question" | "Capability Question"
        )
        || line.starts_with("Level ")
        || line.contains("Business Capability")
        || line.contains("Appendix")
        || GROUP_HEADINGS.contains(&line)
        || BusinessArea::ALL.iter().any(|a| a.name() == line)
        || line.contains('\u{2013}')
        || line.contains('?')
        || line == area.name()
}

/// Find BCM processes: title-case lines followed, within
/// `bcm_lookahead_lines`, by a `CODE – Category` banner or the
/// `Capability` table header. First occurrence of a name wins.
pub fn detect_bcm_processes(
    lines: &[String],
    area: BusinessArea,
    policy: &HeuristicPolicy,
) -> Vec<ProcessSlice> {
    let code = area.code();
    let mut seen: HashSet<String> = HashSet::new();
    let mut starts = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if is_bcm_noise(line, area) {
            continue;
        }

        let mut is_process = false;
        let mut category: Option<String> = None;
        let window_end = (i + policy.bcm_lookahead_lines).min(lines.len());
        for next in lines[(i + 1).min(window_end)..window_end].iter().map(|l| l.trim()) {
            if next.is_empty() {
                continue;
            }
            if next.contains('\u{2013}') && (contains_code_word(next, code) || starts_uppercase(next)) && !next.contains('?') {
                is_process = true;
                category = Some(next.to_string());
                break;
            }
            if next == "Capability" || next.starts_with("Capability Question") {
                is_process = true;
                break;
            }
        }

        if is_process && is_title_case_name(line) && seen.insert(line.to_string()) {
            debug!("BCM process '{}' starts at line {}", line, i);
            starts.push((line.to_string(), category, i));
        }
    }

    close_slices(starts, lines.len(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bpt_names_and_categories() {
        let policy = HeuristicPolicy::default();
        let l = lines(&[
            "Part I, Appendix D - Page 1",
            "CM Case Management",
            "Establish Case",
            "Item",
            "Details",
            "Description",
            "The process opens a case.",
            "Steps line",
            "Steps line",
            "Steps line",
            "Steps line",
            "May 2014 Version 3.0",
            "CM Case Management",
            "Manage Case Information",
            "Item",
            "Details",
            "Description",
            "Another process.",
        ]);
        let slices = detect_bpt_processes(&l, BusinessArea::CareManagement, &policy);
        assert_eq!(slices.len(), 2);

        assert_eq!(slices[0].name, "Establish Case");
        assert_eq!(slices[0].category_line.as_deref(), Some("CM Case Management"));
        assert_eq!(slices[0].start_line, 5);
        assert_eq!(slices[0].end_line, 16 - 5);

        assert_eq!(slices[1].name, "Manage Case Information");
        assert_eq!(slices[1].end_line, l.len());
    }

    #[test]
    fn bpt_description_without_name_is_skipped() {
        let policy = HeuristicPolicy::default();
        let l = lines(&["Item", "Description", "text"]);
        assert!(detect_bpt_processes(&l, BusinessArea::CareManagement, &policy).is_empty());
    }

    #[test]
    fn title_case_names() {
        assert!(is_title_case_name("Manage Provider Communication"));
        assert!(is_title_case_name("Determination of Eligibility"));
        assert!(!is_title_case_name("Inquiry"));
        assert!(!is_title_case_name("Manage provider data"));
    }

    #[test]
    fn bcm_candidates_need_banner_or_header() {
        let policy = HeuristicPolicy::default();
        let l = lines(&[
            "Financial Management",
            "Accounts Payable Management",
            "Manage Provider Payables",
            "FM \u{2013} Accounts Payable Management",
            "Capability",
            "Question",
            "Level 1",
            "Is the process automated?",
            "Manual entry",
            "Prepare Remittance Advice",
            "Capability Question",
            "Does the State track it?",
            "Manage Provider Payables",
            "FM \u{2013} Accounts Payable Management",
        ]);
        let slices = detect_bcm_processes(&l, BusinessArea::FinancialManagement, &policy);
        let names: Vec<&str> = slices.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Manage Provider Payables", "Prepare Remittance Advice"]);
        assert_eq!(
            slices[0].category_line.as_deref(),
            Some("FM \u{2013} Accounts Payable Management")
        );
        assert_eq!(slices[0].end_line, 9);
        assert_eq!(slices[1].category_line, None);
        assert_eq!(slices[1].end_line, l.len());
    }

    #[test]
    fn bcm_candidate_filter() {
        let policy = HeuristicPolicy::default();
        let area = BusinessArea::PlanManagement;

        let rejected = [
            "Review Plan \u{2013} Draft",
            "Is The Plan Current?",
            "Manage plan data",
            "Develop Goals",
        ];
        for &name in &rejected[..3] {
            let l = lines(&[name, "Capability"]);
            assert!(detect_bcm_processes(&l, area, &policy).is_empty(), "accepted '{name}'");
        }

        let l = lines(&["Determination of Eligibility", "Capability"]);
        let slices = detect_bcm_processes(&l, area, &policy);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].name, "Determination of Eligibility");

        // No banner or header within the look-ahead window.
        let l = lines(&[rejected[3], "one", "two", "three", "four", "five", "Capability"]);
        assert!(detect_bcm_processes(&l, area, &policy).is_empty());
    }

    #[test]
    fn bcm_duplicate_names_keep_first() {
        let policy = HeuristicPolicy::default();
        let l = lines(&[
            "Develop Agency Goals",
            "Capability",
            "Is the goal set?",
            "Develop Agency Goals",
            "Capability",
            "Does it change?",
        ]);
        let slices = detect_bcm_processes(&l, BusinessArea::PlanManagement, &policy);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].start_line, 0);
        assert_eq!(slices[0].end_line, l.len());
    }

    #[test]
    fn bcm_skips_group_headings() {
        let policy = HeuristicPolicy::default();
        let l = lines(&["Claims Adjudication", "OM \u{2013} Claims Adjudication", "Capability"]);
        assert!(detect_bcm_processes(&l, BusinessArea::OperationsManagement, &policy).is_empty());
    }
}
