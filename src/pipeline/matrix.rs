//! Capability-matrix question assembly.
//!
//! Position mode walks the [`TableRow`]s produced by column clustering and
//! builds one [`CapabilityQuestion`] per interrogative row, attaching level
//! text seen on that row and the rows after it. Text mode is the degraded
//! fallback for sources without positioned spans: every question gets its
//! following block of lines as `level_1` only.

use crate::area::{BusinessArea, CapabilityCategory};
use crate::config::HeuristicPolicy;
use crate::pipeline::boundary::{contains_code_word, is_title_case_name};
use crate::pipeline::columns::{assign_columns, group_rows, ColumnLayout, TableRow};
use crate::pipeline::normalize::{is_page_header, normalize};
use crate::pipeline::source::SourceDocument;
use crate::record::{CapabilityQuestion, ExtractionMode, MaturityLevels};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

const QUESTION_STARTERS: [&str; 7] = ["Is ", "How ", "What ", "Does ", "Are ", "Can ", "Will "];

const HEADER_SPANS: [&str; 11] = [
    "Level 1",
    "Level 2",
    "Level 3",
    "Level 4",
    "Level 5",
    "Capability",
    "Question",
    "Capability Question",
    "Details",
    "Item",
    "Item Details",
];

static RE_LEVEL_NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(NOTE:)").unwrap());
static RE_NOTE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^NOTE:\s*").unwrap());
static RE_EMBEDDED_NOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(.*?)(NOTE:.*?)(\s*(?:Is the|How |What |Does |Are ).*\?.*)").unwrap()
});

fn starts_interrogative(text: &str) -> bool {
    QUESTION_STARTERS.iter().any(|w| text.starts_with(w))
}

fn has_question_word(text: &str) -> bool {
    QUESTION_STARTERS
        .iter()
        .any(|w| text.starts_with(w) || text.contains(&format!(" {w}")))
}

fn is_note(text: &str) -> bool {
    text.starts_with("NOTE:") || text.starts_with("Note:")
}

/// Join level fragments; an inline `NOTE:` moves to its own line.
pub fn format_level_text(parts: &[String]) -> String {
    if parts.is_empty() {
        return String::new();
    }
    let joined = parts.join(" ");
    let text = RE_LEVEL_NOTE.replace_all(&joined, "\n$1");
    normalize(&text, false)
}

// ── Row collection ───────────────────────────────────────────────────────

/// The part of a document one BCM process occupies.
#[derive(Debug, Clone, Copy)]
pub struct MatrixScope<'a> {
    pub doc: &'a SourceDocument,
    pub area: BusinessArea,
    pub process_name: &'a str,
    /// 1-based inclusive page range.
    pub first_page: usize,
    pub last_page: usize,
}

/// Cluster the scope's spans into table rows, page by page.
///
/// On the first page, spans before the process name are skipped: they
/// belong to the previous process.
pub fn collect_rows(
    scope: &MatrixScope<'_>,
    layout: &dyn ColumnLayout,
    policy: &HeuristicPolicy,
) -> Vec<TableRow> {
    let name_lower = scope.process_name.to_lowercase();
    let mut found = false;
    let mut rows = Vec::new();

    for page in scope
        .doc
        .pages
        .iter()
        .filter(|p| p.number >= scope.first_page && p.number <= scope.last_page)
    {
        let mut kept = Vec::new();
        for span in &page.spans {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            if !found && text.to_lowercase().contains(&name_lower) {
                found = true;
            }
            if is_page_header(text) || HEADER_SPANS.contains(&text) {
                continue;
            }
            if page.number == scope.first_page && !found {
                continue;
            }
            kept.push(span.clone());
        }

        let page_rows = group_rows(assign_columns(&kept, layout), page.number, policy.row_proximity);
        debug!("Page {}: {} spans -> {} rows", page.number, kept.len(), page_rows.len());
        rows.extend(page_rows);
    }
    rows
}

// ── Question assembly ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct QuestionBuilder {
    category: CapabilityCategory,
    text_parts: Vec<String>,
    note_parts: Vec<String>,
    levels: [Vec<String>; 5],
    /// Level text seen before the question's `?` row.
    pending: [Vec<String>; 5],
    /// The `?` has been seen.
    marked: bool,
}

impl QuestionBuilder {
    fn new(category: CapabilityCategory) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    fn starting_with(category: CapabilityCategory, text: String) -> Self {
        Self {
            text_parts: vec![text],
            ..Self::new(category)
        }
    }

    fn add_levels(&mut self, row: &TableRow) {
        for (n, slot) in self.levels.iter_mut().enumerate() {
            slot.extend(row.level_parts(n + 1).iter().cloned());
        }
    }

    fn add_pending(&mut self, row: &TableRow) {
        for (n, slot) in self.pending.iter_mut().enumerate() {
            slot.extend(row.level_parts(n + 1).iter().cloned());
        }
    }

    fn mark(&mut self, text: String, row: &TableRow) {
        self.text_parts.push(text);
        self.marked = true;
        for (slot, pending) in self.levels.iter_mut().zip(self.pending.iter_mut()) {
            slot.append(pending);
        }
        self.add_levels(row);
    }

    /// The finished question, or `None` when no `?` was ever seen.
    fn finish(self) -> Option<CapabilityQuestion> {
        let joined = normalize(&self.text_parts.join(" "), false);
        let cut = joined.rfind('?')?;
        let (question, trailing) = joined.split_at(cut + 1);

        let mut note_parts = self.note_parts;
        let trailing = trailing.trim();
        if !trailing.is_empty() {
            note_parts.push(trailing.to_string());
        }
        let note = normalize(&note_parts.join(" "), false);

        let levels = MaturityLevels::from_texts(self.levels.iter().map(|p| format_level_text(p)));
        if levels.non_empty_count() == 0 {
            warn!("Capability question has no maturity levels: '{}'", question);
        }

        Some(CapabilityQuestion {
            category: self.category,
            question: question.to_string(),
            levels,
            note: (!note.is_empty()).then_some(note),
        })
    }
}

fn flush(builder: QuestionBuilder, questions: &mut Vec<CapabilityQuestion>) {
    if builder.marked {
        questions.extend(builder.finish());
    }
}

/// Build questions from clustered rows of one process.
pub fn assemble_questions(rows: &[TableRow], area: BusinessArea, process_name: &str) -> Vec<CapabilityQuestion> {
    let code = area.code();
    let name_lower = process_name.to_lowercase();
    let mut questions: Vec<CapabilityQuestion> = Vec::new();
    let mut current = QuestionBuilder::default();

    for row in rows {
        let mut text = row.question_text();
        let has_levels = row.has_level_content();

        // ── Repeating artifacts ──
        if text.contains('\u{2013}') && contains_code_word(&text, code) {
            continue;
        }
        if matches!(text.as_str(), "Capability" | "Question" | "Capability Question")
            || text.starts_with("Capability Question Level")
            || (text.contains("Level 1") && text.contains("Level 2"))
        {
            continue;
        }

        // ── Next process: stop ──
        if !questions.is_empty()
            && !text.is_empty()
            && !has_levels
            && !text.contains("Business Capability")
            && !text.contains('?')
            && !is_note(&text)
            && !starts_interrogative(&text)
            && !text.to_lowercase().contains(&name_lower)
            && is_title_case_name(&text)
        {
            debug!("Row '{}' on page {} starts another process; stopping", text, row.page);
            break;
        }

        // ── Category heading ──
        if text.contains("Business Capability") {
            let category = CapabilityCategory::from_heading(&text).unwrap_or(current.category);
            let done = std::mem::replace(&mut current, QuestionBuilder::new(category));
            flush(done, &mut questions);
            continue;
        }

        if let Some(rest) = text.strip_prefix("Capability Question") {
            let rest = rest.trim();
            if rest.is_empty() {
                continue;
            }
            text = rest.to_string();
        }

        // ── Notes ──
        if is_note(&text) {
            current.note_parts.push(RE_NOTE_PREFIX.replace(&text, "").into_owned());
            continue;
        }
        if !current.note_parts.is_empty()
            && current.text_parts.is_empty()
            && !has_levels
            && !starts_interrogative(&text)
            && !text.contains('?')
        {
            if !text.is_empty() {
                current.note_parts.push(text);
            }
            continue;
        }

        if is_page_header(&text) {
            continue;
        }

        if text.contains("NOTE:") && text.contains('?') {
            if let Some(caps) = RE_EMBEDDED_NOTE.captures(&text) {
                debug!("Dropping note embedded in question text on page {}", row.page);
                text = caps[3].trim().to_string();
            }
        }

        // ── Question boundaries ──
        if text.contains('?') {
            // Any `?` row after a marked question is the next question.
            if current.marked {
                let next = QuestionBuilder::new(current.category);
                flush(std::mem::replace(&mut current, next), &mut questions);
            }
            current.mark(text, row);
        } else if current.marked && !text.is_empty() && !has_levels {
            let next = QuestionBuilder::starting_with(current.category, text);
            flush(std::mem::replace(&mut current, next), &mut questions);
        } else if current.marked && !text.is_empty() {
            if starts_interrogative(&text) {
                let mut next = QuestionBuilder::starting_with(current.category, text);
                next.add_pending(row);
                flush(std::mem::replace(&mut current, next), &mut questions);
            } else {
                current.add_levels(row);
            }
        } else if current.marked && has_levels {
            current.add_levels(row);
        } else if !text.is_empty()
            && !current.marked
            && (!current.text_parts.is_empty() || has_question_word(&text))
        {
            current.text_parts.push(text);
            current.add_pending(row);
        }
    }

    flush(current, &mut questions);
    questions
}

// ── Text fallback ────────────────────────────────────────────────────────

fn fallback_level_text(lines: &[String], policy: &HeuristicPolicy) -> String {
    let mut content = Vec::new();
    for line in lines.iter().take(policy.fallback_level_lines).map(|l| l.trim()) {
        if line.is_empty() {
            continue;
        }
        if line.contains("Part I") || line.contains("Page") || line.contains("May 2014") {
            continue;
        }
        if line.contains("Business Capability") || line.ends_with('?') {
            break;
        }
        content.push(line);
    }
    let full = content.join(" ");
    let capped: String = full.chars().take(policy.fallback_level_max_chars).collect();
    normalize(&capped, false)
}

/// Degraded question recovery from plain lines.
///
/// Each question's following block (up to `fallback_level_lines` lines,
/// capped at `fallback_level_max_chars` characters) becomes `level_1`;
/// levels 2-5 stay empty.
pub fn extract_questions_fallback(lines: &[String], policy: &HeuristicPolicy) -> Vec<CapabilityQuestion> {
    let mut questions = Vec::new();
    let mut category = CapabilityCategory::default();
    let ends_q = |i: usize| lines.get(i).is_some_and(|l| l.trim().ends_with('?'));

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if line.contains("Business Capability") {
            category = CapabilityCategory::from_heading(line).unwrap_or(category);
            i += 1;
            continue;
        }

        if !(ends_q(i) || ends_q(i + 1)) {
            i += 1;
            continue;
        }

        let mut parts = vec![line.to_string()];
        let mut j = i + 1;
        if !line.ends_with('?') {
            while j < lines.len() && !ends_q(j) {
                let next = lines[j].trim();
                if next.is_empty() || next.contains("Level") {
                    break;
                }
                parts.push(next.to_string());
                j += 1;
            }
            if ends_q(j) {
                parts.push(lines[j].trim().to_string());
                j += 1;
            }
        }

        let joined = normalize(&parts.join(" "), false);
        if let Some(cut) = joined.rfind('?') {
            let level_1 = fallback_level_text(&lines[j.min(lines.len())..], policy);
            questions.push(CapabilityQuestion {
                category,
                question: joined[..=cut].to_string(),
                levels: MaturityLevels {
                    level_1,
                    ..MaturityLevels::default()
                },
                note: None,
            });
        }

        i = j + policy.fallback_skip_lines;
    }
    questions
}

/// Position-based extraction, falling back to text mode when it yields
/// nothing.
pub fn extract_capability_questions(
    scope: &MatrixScope<'_>,
    process_lines: &[String],
    layout: &dyn ColumnLayout,
    policy: &HeuristicPolicy,
) -> (Vec<CapabilityQuestion>, ExtractionMode) {
    let rows = collect_rows(scope, layout, policy);
    let questions = assemble_questions(&rows, scope.area, scope.process_name);
    if !questions.is_empty() {
        return (questions, ExtractionMode::Position);
    }

    warn!(
        "No positioned questions for '{}' (pages {}-{}); using text fallback",
        scope.process_name, scope.first_page, scope.last_page
    );
    (extract_questions_fallback(process_lines, policy), ExtractionMode::TextFallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::columns::FixedColumnLayout;
    use crate::pipeline::source::{SourcePage, TextSpan};

    const Q: f32 = 40.0;
    const L1: f32 = 170.0;
    const L2: f32 = 300.0;
    const L3: f32 = 400.0;
    const L5: f32 = 620.0;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan { text: text.into(), x, y }
    }

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn matrix_doc() -> SourceDocument {
        let page1 = vec![
            span("Earlier process leftovers?", Q, 20.0),
            span("Manage Provider Payables", Q, 50.0),
            span("FM \u{2013} Accounts Payable Management", Q, 70.0),
            span("Capability", Q, 90.0),
            span("Level 1", L1, 90.0),
            span("Business Capability Descriptions", Q, 110.0),
            span("Is the process automated?", Q, 140.0),
            span("Manual entry", L1, 140.0),
            span("Partial", L2, 140.0),
            span("NOTE: paper forms", L1, 160.0),
            span("Fully automated", L5, 160.0),
            span("Business Capability Quality: Timeliness of Process", Q, 190.0),
            span("How timely is", Q, 220.0),
        ];
        let page2 = vec![
            span("Part I, Appendix C - Page 7", Q, 10.0),
            span("the process?", Q, 40.0),
            span("Days", L1, 40.0),
            span("Hours", L3, 40.0),
            span("Prepare Remittance Advice", Q, 80.0),
            span("Is this skipped?", Q, 110.0),
            span("Ignored", L1, 110.0),
        ];
        SourceDocument {
            id: "fm.pdf".into(),
            pages: vec![
                SourcePage { number: 1, lines: Vec::new(), spans: page1 },
                SourcePage { number: 2, lines: Vec::new(), spans: page2 },
            ],
        }
    }

    fn scope(doc: &SourceDocument) -> MatrixScope<'_> {
        MatrixScope {
            doc,
            area: BusinessArea::FinancialManagement,
            process_name: "Manage Provider Payables",
            first_page: 1,
            last_page: 2,
        }
    }

    #[test]
    fn position_mode_builds_questions() {
        let doc = matrix_doc();
        let policy = HeuristicPolicy::default();
        let (questions, mode) =
            extract_capability_questions(&scope(&doc), &[], &FixedColumnLayout::default(), &policy);
        assert_eq!(mode, ExtractionMode::Position);
        assert_eq!(questions.len(), 2);

        let q1 = &questions[0];
        assert_eq!(q1.category, CapabilityCategory::Descriptions);
        assert_eq!(q1.question, "Is the process automated?");
        assert_eq!(q1.levels.level_1, "Manual entry\nNOTE: paper forms");
        assert_eq!(q1.levels.level_2, "Partial");
        assert_eq!(q1.levels.level_5, "Fully automated");
        assert_eq!(q1.note, None);

        let q2 = &questions[1];
        assert_eq!(q2.category, CapabilityCategory::Timeliness);
        assert_eq!(q2.question, "How timely is the process?");
        assert_eq!(q2.levels.level_1, "Days");
        assert_eq!(q2.levels.level_3, "Hours");
    }

    #[test]
    fn every_question_ends_with_mark() {
        let doc = matrix_doc();
        let policy = HeuristicPolicy::default();
        let rows = collect_rows(&scope(&doc), &FixedColumnLayout::default(), &policy);
        for q in assemble_questions(&rows, BusinessArea::FinancialManagement, "Manage Provider Payables") {
            assert!(q.question.ends_with('?'), "{}", q.question);
        }
    }

    #[test]
    fn first_page_skips_previous_process() {
        let doc = matrix_doc();
        let rows = collect_rows(&scope(&doc), &FixedColumnLayout::default(), &HeuristicPolicy::default());
        assert!(rows.iter().all(|r| !r.question_text().contains("leftovers")));
        assert!(rows.iter().all(|r| !r.question_text().contains("Page 7")));
    }

    fn row(y: f32, question: &str, levels: &[(usize, &str)]) -> TableRow {
        let mut r = TableRow { page: 1, y, ..TableRow::default() };
        if !question.is_empty() {
            r.cells[0].push(question.into());
        }
        for &(n, text) in levels {
            r.cells[n].push(text.into());
        }
        r
    }

    #[test]
    fn notes_attach_to_current_question() {
        let rows = vec![
            row(0.0, "Business Capability Quality: Cost Effectiveness", &[]),
            row(10.0, "Is the cost tracked?", &[(1, "No")]),
            row(20.0, "NOTE: Includes vendor cost", &[]),
            row(30.0, "Are costs shared?", &[(2, "Sometimes")]),
        ];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].category, CapabilityCategory::CostEffectiveness);
        assert_eq!(qs[0].note.as_deref(), Some("Includes vendor cost"));
        assert_eq!(qs[1].question, "Are costs shared?");
        assert_eq!(qs[1].levels.level_2, "Sometimes");
        assert_eq!(qs[1].note, None);
    }

    #[test]
    fn question_mark_row_starts_new_question_without_starter_word() {
        let rows = vec![
            row(0.0, "Is the goal documented?", &[(1, "Informal")]),
            row(10.0, "Has the agency adopted a plan?", &[(1, "No"), (5, "Yes")]),
            row(20.0, "To what extent are plans reviewed?", &[(3, "Yearly")]),
        ];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs.len(), 3);
        assert_eq!(qs[0].question, "Is the goal documented?");
        assert_eq!(qs[0].levels.level_1, "Informal");
        assert_eq!(qs[1].question, "Has the agency adopted a plan?");
        assert_eq!(qs[1].levels.level_1, "No");
        assert_eq!(qs[1].levels.level_5, "Yes");
        assert_eq!(qs[2].question, "To what extent are plans reviewed?");
        assert_eq!(qs[2].levels.level_3, "Yearly");
    }

    #[test]
    fn wrapped_question_is_joined() {
        let rows = vec![
            row(0.0, "Is the goal documented?", &[(1, "Informal")]),
            row(10.0, "Has the agency adopted", &[]),
            row(20.0, "a written plan?", &[(1, "No")]),
        ];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[1].question, "Has the agency adopted a written plan?");
        assert_eq!(qs[1].levels.level_1, "No");
    }

    #[test]
    fn trailing_text_after_mark_becomes_note() {
        let rows = vec![row(0.0, "Is it automated? See appendix", &[(1, "Manual")])];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs[0].question, "Is it automated?");
        assert_eq!(qs[0].note.as_deref(), Some("See appendix"));
    }

    #[test]
    fn embedded_note_is_split_from_question() {
        let rows = vec![row(
            0.0,
            "Intro NOTE: scope limited Is the data shared?",
            &[(1, "Never")],
        )];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs[0].question, "Is the data shared?");
    }

    #[test]
    fn question_without_levels_is_kept() {
        let rows = vec![row(0.0, "Is anything recorded?", &[])];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].levels.non_empty_count(), 0);
    }

    #[test]
    fn code_banner_rows_are_skipped() {
        let rows = vec![
            row(0.0, "Is it done?", &[(1, "Yes")]),
            row(10.0, "PL \u{2013} Plan Administration", &[]),
            row(20.0, "", &[(1, "more")]),
        ];
        let qs = assemble_questions(&rows, BusinessArea::PlanManagement, "Manage Plan");
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].levels.level_1, "Yes more");
    }

    #[test]
    fn level_text_note_on_own_line() {
        let parts = lines(&["Some text", "note: extra"]);
        assert_eq!(format_level_text(&parts), "Some text\nnote: extra");
        assert_eq!(format_level_text(&[]), "");
    }

    #[test]
    fn fallback_puts_block_in_level_one() {
        let policy = HeuristicPolicy::default();
        let l = lines(&[
            "Business Capability Quality: Timeliness of Process",
            "How quickly is the",
            "request processed?",
            "Level 1",
            "Manual and slow",
            "Part I, Appendix C - Page 3",
            "with backlog",
        ]);
        let qs = extract_questions_fallback(&l, &policy);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].category, CapabilityCategory::Timeliness);
        assert_eq!(qs[0].question, "How quickly is the request processed?");
        assert_eq!(qs[0].levels.level_1, "Level 1 Manual and slow with backlog");
        assert_eq!(qs[0].levels.level_2, "");
    }

    #[test]
    fn fallback_caps_level_text() {
        let policy = HeuristicPolicy {
            fallback_level_max_chars: 10,
            ..HeuristicPolicy::default()
        };
        let l = lines(&["Is it long?", "ééééééééééééééééé"]);
        let qs = extract_questions_fallback(&l, &policy);
        assert_eq!(qs[0].levels.level_1.chars().count(), 10);
    }

    #[test]
    fn no_spans_uses_text_fallback() {
        let doc = SourceDocument::from_page_texts("x.pdf", &["Is it tracked?\nYes"]);
        let s = MatrixScope {
            doc: &doc,
            area: BusinessArea::CareManagement,
            process_name: "Manage Case",
            first_page: 1,
            last_page: 1,
        };
        let flat = doc.flatten();
        let (qs, mode) = extract_capability_questions(
            &s,
            &flat.lines,
            &FixedColumnLayout::default(),
            &HeuristicPolicy::default(),
        );
        assert_eq!(mode, ExtractionMode::TextFallback);
        assert_eq!(qs[0].levels.level_1, "Yes");
    }
}
