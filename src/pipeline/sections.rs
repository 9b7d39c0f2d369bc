//! Section segmentation for one BPT process slice.
//!
//! A process page is a two-column "Item / Details" table whose item cells
//! are the section titles. After text extraction those titles arrive as
//! ordinary lines, sometimes wrapped across two or three lines
//! (`Business` / `Process` / `Steps`). This module finds each title and the
//! line range its content covers.

use crate::config::HeuristicPolicy;
use crate::pipeline::normalize::{is_item_details, is_layout_artifact};
use std::fmt;

/// The ten fixed BPT section titles, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Description,
    TriggerEvent,
    Result,
    ProcessSteps,
    SharedData,
    Predecessor,
    Successor,
    Constraints,
    Failures,
    PerformanceMeasures,
}

impl SectionKind {
    pub const ALL: [SectionKind; 10] = [
        SectionKind::Description,
        SectionKind::TriggerEvent,
        SectionKind::Result,
        SectionKind::ProcessSteps,
        SectionKind::SharedData,
        SectionKind::Predecessor,
        SectionKind::Successor,
        SectionKind::Constraints,
        SectionKind::Failures,
        SectionKind::PerformanceMeasures,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Description => "Description",
            SectionKind::TriggerEvent => "Trigger Event",
            SectionKind::Result => "Result",
            SectionKind::ProcessSteps => "Business Process Steps",
            SectionKind::SharedData => "Shared Data",
            SectionKind::Predecessor => "Predecessor",
            SectionKind::Successor => "Successor",
            SectionKind::Constraints => "Constraints",
            SectionKind::Failures => "Failures",
            SectionKind::PerformanceMeasures => "Performance Measures",
        }
    }

    /// True when `line` is exactly one of the section titles.
    pub fn is_title(line: &str) -> bool {
        let line = line.trim();
        Self::ALL.iter().any(|k| k.title() == line)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Where a section title was found and how many lines it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch {
    pub line: usize,
    pub header_lines: usize,
}

/// One located section: its title line and the half-open body range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSlice {
    pub kind: SectionKind,
    pub title_line: usize,
    pub body_start: usize,
    pub end: usize,
}

impl SectionSlice {
    pub fn body<'a>(&self, lines: &'a [String]) -> &'a [String] {
        let end = self.end.min(lines.len());
        let start = self.body_start.min(end);
        &lines[start..end]
    }
}

/// Match `title` at line `i`, either whole or wrapped word-by-word.
///
/// Returns the number of lines the title occupies. A wrapped title's first
/// line must equal the first word; the following line must equal (or start
/// with) the remaining words, or hold only the second word with the rest on
/// a third line.
pub fn match_title_at(lines: &[String], i: usize, title: &str) -> Option<usize> {
    let line = lines.get(i)?.trim();
    if line == title {
        return Some(1);
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() < 2 || line != words[0] {
        return None;
    }
    let next = lines.get(i + 1)?.trim();
    let remaining = words[1..].join(" ");
    if next == remaining || next.starts_with(&remaining) {
        return Some(2);
    }
    if words.len() >= 3 && next == words[1] {
        let third = lines.get(i + 2)?.trim();
        if third == words[2..].join(" ") {
            return Some(3);
        }
    }
    None
}

/// First occurrence of `title` at or after `from`.
pub fn find_section_start(lines: &[String], title: &str, from: usize) -> Option<TitleMatch> {
    (from..lines.len()).find_map(|i| {
        match_title_at(lines, i, title).map(|header_lines| TitleMatch {
            line: i,
            header_lines,
        })
    })
}

/// Index where the section starting at `from` ends.
///
/// Stops at the next section title (other than `Description`), skipping
/// running headers and repeated process banners. A `Description` title
/// found more than `early_description_guard` lines in, with an
/// `Item`/`Details` cell just above it, marks the next process: the range
/// is cut two lines above that cell. Otherwise the range runs to the end.
pub fn find_next_section(lines: &[String], from: usize, policy: &HeuristicPolicy) -> usize {
    let guard = policy.early_description_guard;
    for i in from..lines.len() {
        let line = lines[i].trim();
        if is_layout_artifact(line) {
            continue;
        }
        let is_boundary = SectionKind::ALL[1..]
            .iter()
            .any(|k| match_title_at(lines, i, k.title()).is_some());
        if is_boundary {
            return i;
        }
        if line == SectionKind::Description.title() && i > from + guard {
            let floor = from.max(i.saturating_sub(guard));
            if let Some(j) = (floor + 1..i).rev().find(|&j| is_item_details(&lines[j])) {
                return j.saturating_sub(2).max(from);
            }
        }
    }
    lines.len()
}

/// Locate every section present in a process slice, ordered by position.
///
/// Performance Measures is the last section on the page, so its range is a
/// bounded window of `performance_window` lines from its title instead of
/// running to the next title.
pub fn segment_sections(lines: &[String], policy: &HeuristicPolicy) -> Vec<SectionSlice> {
    let mut slices: Vec<SectionSlice> = SectionKind::ALL
        .iter()
        .filter_map(|&kind| {
            let found = find_section_start(lines, kind.title(), 0)?;
            let body_start = (found.line + found.header_lines).min(lines.len());
            let end = match kind {
                SectionKind::PerformanceMeasures => {
                    lines.len().min(found.line + policy.performance_window).max(body_start)
                }
                _ => find_next_section(lines, body_start, policy),
            };
            Some(SectionSlice {
                kind,
                title_line: found.line,
                body_start,
                end,
            })
        })
        .collect();
    slices.sort_by_key(|s| s.title_line);
    slices
}
