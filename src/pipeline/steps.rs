//! Numbered-step reconstruction for the "Business Process Steps" section.
//!
//! Each input line is first classified ([`classify_step_line`], priority
//! ordered), then fed through the transition table ([`step_transition`]).
//! The table decides the next [`StepState`] and a [`StepAction`]; the
//! [`StepMachine`] applies actions to the step being built.
//!
//! | state \ line        | Artifact  | Numbered | Alt. path        | Lettered / Roman | Note    | Text               |
//! |---------------------|-----------|----------|------------------|------------------|---------|--------------------|
//! | OutsideItem         | Suspended | TopLevel | AlternatePending | (skip)           | (skip)  | (skip)             |
//! | InTopLevelItem      | Suspended | TopLevel | AlternatePending | InSubItem        | InNote  | append             |
//! | InSubItem           | Suspended | TopLevel | AlternatePending | InSubItem        | InNote  | append             |
//! | InNote              | Suspended | TopLevel | AlternatePending | InSubItem        | InNote  | append             |
//! | AlternatePending    | Suspended | TopLevel | AlternatePending | InSubItem        | InNote  | append             |
//! | Suspended           | Suspended | TopLevel | buffer, stay     | (skip)           | (skip)  | (skip)             |
//!
//! A section title stops the machine from any state; blank lines are
//! ignored everywhere.

use crate::pipeline::normalize::{clean_extracted, is_layout_artifact};
use crate::pipeline::sections::SectionKind;
use crate::record::{Step, StepEntry, StepLine};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").unwrap());
static RE_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(i{1,3}|iv|vi{0,3}|ix|x)\.\s*(.*)$").unwrap());
static RE_LETTERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z])\.\s*(.*)$").unwrap());
static RE_ALTERNATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Alternate Path[:\s\-\x{2013}\x{2014}]+(.+)$").unwrap());
static RE_ALTERNATE_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)\s*Alternate Path:\s*(.+)$").unwrap());
static RE_EMBEDDED_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(i{1,3}|iv|vi{0,3}|ix|x)\.\s+").unwrap());

// ── Classification ───────────────────────────────────────────────────────

/// One line of the steps section, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepLineClass {
    Blank,
    /// Page header, `Item`/`Details` cell or repeated process banner.
    Artifact,
    /// A section title: the steps section is over.
    SectionTitle,
    AlternatePath(String),
    Numbered { number: u32, text: String },
    Roman { key: String, text: String },
    Lettered { key: char, text: String },
    Note(String),
    /// Continuation text, possibly carrying an `Alternate Path:` label
    /// after some leading words.
    Text { text: String, alternate: Option<String> },
}

/// Classify a trimmed line. Roman numerals are tried before letters, so a
/// bare `i.`/`v.`/`x.` classifies as roman; [`StepMachine`] re-reads it as
/// a letter when it continues a lettered run (`h.` → `i.`).
pub fn classify_step_line(line: &str) -> StepLineClass {
    let line = line.trim();
    if is_layout_artifact(line) {
        return StepLineClass::Artifact;
    }
    if SectionKind::is_title(line) {
        return StepLineClass::SectionTitle;
    }
    if let Some(c) = RE_ALTERNATE.captures(line) {
        return StepLineClass::AlternatePath(c[1].trim().to_string());
    }
    if let Some(c) = RE_NUMBERED.captures(line) {
        if let Ok(number) = c[1].parse::<u32>() {
            return StepLineClass::Numbered {
                number,
                text: c[2].to_string(),
            };
        }
    }
    if line.is_empty() {
        return StepLineClass::Blank;
    }
    if let Some(c) = RE_ROMAN.captures(line) {
        return StepLineClass::Roman {
            key: c[1].to_string(),
            text: c[2].to_string(),
        };
    }
    if let Some(c) = RE_LETTERED.captures(line) {
        let key = c[1].chars().next().unwrap_or('a');
        return StepLineClass::Lettered {
            key,
            text: c[2].to_string(),
        };
    }
    if line.starts_with("NOTE:") || line.starts_with("Note:") {
        return StepLineClass::Note(line.to_string());
    }
    if let Some(c) = RE_ALTERNATE_INLINE.captures(line) {
        return StepLineClass::Text {
            text: c[1].to_string(),
            alternate: Some(c[2].trim().to_string()),
        };
    }
    StepLineClass::Text {
        text: line.to_string(),
        alternate: None,
    }
}

// ── Transition table ─────────────────────────────────────────────────────

/// Where the machine is between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// No numbered item seen yet.
    OutsideItem,
    /// The last line written is the step's own text.
    InTopLevelItem,
    /// The last line written is a lettered or roman sub-line.
    InSubItem,
    /// The last line written is a note.
    InNote,
    /// An alternate-path label is buffered for the next `1.` item.
    AlternatePathPending,
    /// An artifact interrupted the page; skip until the next numbered item.
    Suspended,
}

/// Effect of one transition on the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Skip,
    Stop,
    StartStep { number: u32, text: String },
    BufferAlternate(String),
    PushRoman { key: String, text: String },
    PushLettered { key: char, text: String },
    PushNote(String),
    Continue(String),
    ContinueThenBuffer { text: String, label: String },
}

/// The transition table.
pub fn step_transition(state: StepState, line: StepLineClass) -> (StepState, StepAction) {
    use StepLineClass as L;
    use StepState as S;

    match (state, line) {
        (_, L::SectionTitle) => (state, StepAction::Stop),
        (_, L::Blank) => (state, StepAction::Skip),
        (_, L::Artifact) => (S::Suspended, StepAction::Skip),
        (_, L::Numbered { number, text }) => {
            (S::InTopLevelItem, StepAction::StartStep { number, text })
        }
        (S::Suspended, L::AlternatePath(label)) => (S::Suspended, StepAction::BufferAlternate(label)),
        (_, L::AlternatePath(label)) => (S::AlternatePathPending, StepAction::BufferAlternate(label)),
        (S::Suspended | S::OutsideItem, _) => (state, StepAction::Skip),
        (_, L::Roman { key, text }) => (S::InSubItem, StepAction::PushRoman { key, text }),
        (_, L::Lettered { key, text }) => (S::InSubItem, StepAction::PushLettered { key, text }),
        (_, L::Note(text)) => (S::InNote, StepAction::PushNote(text)),
        (_, L::Text { text, alternate: Some(label) }) => (
            S::AlternatePathPending,
            StepAction::ContinueThenBuffer { text, label },
        ),
        (_, L::Text { text, alternate: None }) => (state, StepAction::Continue(text)),
    }
}

// ── Machine ──────────────────────────────────────────────────────────────

/// Applies transitions and owns the output under construction.
#[derive(Debug)]
pub struct StepMachine {
    state: StepState,
    entries: Vec<StepEntry>,
    current: Option<Step>,
    pending_alternate: Option<String>,
}

impl Default for StepMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepMachine {
    pub fn new() -> Self {
        Self {
            state: StepState::OutsideItem,
            entries: Vec::new(),
            current: None,
            pending_alternate: None,
        }
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Feed one raw line. Returns `false` once the section has ended.
    pub fn feed(&mut self, line: &str) -> bool {
        let class = self.disambiguate(classify_step_line(line));
        let (next, action) = step_transition(self.state, class);
        self.state = next;
        self.apply(action)
    }

    /// Close the last step and return the sequence.
    pub fn finish(mut self) -> Vec<StepEntry> {
        self.close_current();
        if let Some(label) = self.pending_alternate.take() {
            debug!("Alternate path '{}' never restarted numbering; dropped", label);
        }
        self.entries
    }

    // A bare `i.`, `v.` or `x.` that follows `h.`, `u.` or `w.` is a letter.
    fn disambiguate(&self, class: StepLineClass) -> StepLineClass {
        let StepLineClass::Roman { key, text } = class else {
            return class;
        };
        let single = match key.as_str() {
            "i" => Some(('h', 'i')),
            "v" => Some(('u', 'v')),
            "x" => Some(('w', 'x')),
            _ => None,
        };
        let last = self.current.as_ref().and_then(|s| s.children.last());
        match (single, last) {
            (Some((prev, letter)), Some(StepLine::Lettered { key: k, .. })) if *k == prev => {
                StepLineClass::Lettered { key: letter, text }
            }
            _ => StepLineClass::Roman { key, text },
        }
    }

    fn apply(&mut self, action: StepAction) -> bool {
        match action {
            StepAction::Skip => {}
            StepAction::Stop => return false,
            StepAction::StartStep { number, text } => {
                self.close_current();
                if number == 1 {
                    if let Some(label) = self.pending_alternate.take() {
                        self.entries.push(StepEntry::AlternatePath { label });
                    }
                }
                self.current = Some(Step {
                    number,
                    text,
                    children: Vec::new(),
                });
            }
            StepAction::BufferAlternate(label) => self.pending_alternate = Some(label),
            StepAction::PushRoman { key, text } => self.push_child(StepLine::Roman { key, text }),
            StepAction::PushLettered { key, text } => {
                let (head, romans) = split_embedded_roman(&text);
                self.push_child(StepLine::Lettered { key, text: head });
                for line in romans {
                    self.push_child(line);
                }
            }
            StepAction::PushNote(text) => self.push_child(StepLine::Note(text)),
            StepAction::Continue(text) => self.continue_text(&text),
            StepAction::ContinueThenBuffer { text, label } => {
                self.continue_text(&text);
                self.pending_alternate = Some(label);
            }
        }
        true
    }

    fn push_child(&mut self, line: StepLine) {
        if let Some(step) = self.current.as_mut() {
            step.children.push(line);
        }
    }

    fn continue_text(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let (head, romans) = split_embedded_roman(text);
        if let Some(step) = self.current.as_mut() {
            if !head.is_empty() {
                let last = match step.children.last_mut() {
                    Some(child) => child.text_mut(),
                    None => &mut step.text,
                };
                if !last.is_empty() {
                    last.push(' ');
                }
                last.push_str(&head);
            }
            step.children.extend(romans);
        }
    }

    fn close_current(&mut self) {
        if let Some(step) = self.current.take() {
            self.entries.push(StepEntry::Step(clean_step(step)));
        }
    }
}

/// Split `"text ii. more iii. rest"` into the leading text and roman lines.
fn split_embedded_roman(text: &str) -> (String, Vec<StepLine>) {
    let marks: Vec<_> = RE_EMBEDDED_ROMAN.captures_iter(text).collect();
    if marks.is_empty() {
        return (text.to_string(), Vec::new());
    }
    let mut romans = Vec::with_capacity(marks.len());
    let mut head_end = text.len();
    for (i, caps) in marks.iter().enumerate() {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if i == 0 {
            head_end = whole.start();
        }
        let body_end = marks
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        romans.push(StepLine::Roman {
            key: key.as_str().to_string(),
            text: text[whole.end()..body_end].trim().to_string(),
        });
    }
    (text[..head_end].trim().to_string(), romans)
}

/// Header-clean every line of a finished step; drop lines that empty out.
fn clean_step(step: Step) -> Step {
    let children = step
        .children
        .into_iter()
        .filter_map(|mut child| {
            let cleaned = clean_extracted(child.text_mut(), false);
            if cleaned.is_empty() && !matches!(child, StepLine::Lettered { .. } | StepLine::Roman { .. }) {
                return None;
            }
            *child.text_mut() = cleaned;
            Some(child)
        })
        .collect();
    Step {
        number: step.number,
        text: clean_extracted(&step.text, false),
        children,
    }
}

/// Rebuild the ordered step sequence from the steps section.
pub fn extract_numbered_list(lines: &[String]) -> Vec<StepEntry> {
    let mut machine = StepMachine::new();
    for line in lines {
        if !machine.feed(line) {
            break;
        }
    }
    machine.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn steps(entries: &[StepEntry]) -> Vec<&Step> {
        entries.iter().filter_map(StepEntry::as_step).collect()
    }

    #[test]
    fn two_steps_one_substep() {
        let out = extract_numbered_list(&lines(&["1. Do A", "a. sub one", "2. Do B"]));
        let s = steps(&out);
        assert_eq!(out.len(), 2);
        assert_eq!(s[0].number, 1);
        assert_eq!(s[0].children.len(), 1);
        assert_eq!(s[0].children[0].label(), "a. sub one");
        assert!(s[1].children.is_empty());
    }

    #[test]
    fn alternate_path_divider_precedes_restart() {
        let out = extract_numbered_list(&lines(&["Alternate Path: Manual Override", "1. Resume here"]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].render(), "--- Alternate Path: Manual Override ---");
        assert_eq!(out[1].render(), "1. Resume here");
    }

    #[test]
    fn alternate_path_waits_for_step_one() {
        let out = extract_numbered_list(&lines(&[
            "1. First",
            "Alternate Path: Fax",
            "2. Second",
            "1. Fax intake",
        ]));
        let rendered: Vec<String> = out.iter().map(StepEntry::render).collect();
        assert_eq!(
            rendered,
            vec!["1. First", "2. Second", "--- Alternate Path: Fax ---", "1. Fax intake"]
        );
    }

    #[test]
    fn inline_alternate_path_after_continuation() {
        let out = extract_numbered_list(&lines(&[
            "3. Send the notice",
            "to the member Alternate Path: Portal",
            "1. Post to portal",
        ]));
        let rendered: Vec<String> = out.iter().map(StepEntry::render).collect();
        assert_eq!(rendered[0], "3. Send the notice to the member");
        assert_eq!(rendered[1], "--- Alternate Path: Portal ---");
    }

    #[test]
    fn wrapped_lines_join_last_line() {
        let out = extract_numbered_list(&lines(&[
            "1. Receive the",
            "request",
            "a. Log the",
            "request",
        ]));
        assert_eq!(out[0].render(), "1. Receive the request\n  a. Log the request");
    }

    #[test]
    fn roman_lines_nest_two_levels() {
        let out = extract_numbered_list(&lines(&["1. Check", "a. Identity", "i. Name", "ii. Date of birth"]));
        assert_eq!(
            out[0].render(),
            "1. Check\n  a. Identity\n    i. Name\n    ii. Date of birth"
        );
    }

    #[test]
    fn letter_i_after_h_stays_lettered() {
        let out = extract_numbered_list(&lines(&["1. Many", "h. eighth", "i. ninth"]));
        let s = steps(&out);
        assert!(matches!(s[0].children[1], StepLine::Lettered { key: 'i', .. }));
    }

    #[test]
    fn embedded_roman_is_split_out() {
        let out = extract_numbered_list(&lines(&[
            "1. Verify",
            "a. Verify documents i. Passport ii. Licence",
        ]));
        assert_eq!(
            out[0].render(),
            "1. Verify\n  a. Verify documents\n    i. Passport\n    ii. Licence"
        );
    }

    #[test]
    fn embedded_roman_in_continuation() {
        let out = extract_numbered_list(&lines(&["1. Review", "a. Review file", "carefully ii. Archive it"]));
        assert_eq!(
            out[0].render(),
            "1. Review\n  a. Review file carefully\n    ii. Archive it"
        );
    }

    #[test]
    fn notes_attach_to_current_step() {
        let out = extract_numbered_list(&lines(&["1. Do it", "NOTE: Only on", "weekdays", "2. Next"]));
        assert_eq!(out[0].render(), "1. Do it\n  NOTE: Only on weekdays");
    }

    #[test]
    fn artifacts_suspend_until_next_number() {
        let out = extract_numbered_list(&lines(&[
            "1. Start",
            "Part I, Appendix D - Page 4",
            "CM Case Management",
            "Establish Case",
            "Item",
            "Details",
            "continues here",
            "2. Next step",
        ]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].render(), "1. Start");
    }

    #[test]
    fn section_title_stops_parsing() {
        let out = extract_numbered_list(&lines(&["1. Only", "Shared Data", "2. Not a step"]));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn text_before_first_step_is_ignored() {
        let out = extract_numbered_list(&lines(&["stray words", "1. Real"]));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].render(), "1. Real");
    }

    #[test]
    fn transition_table_rows() {
        use StepState::*;
        let text = |t: &str| StepLineClass::Text {
            text: t.into(),
            alternate: None,
        };
        assert_eq!(step_transition(OutsideItem, text("x")), (OutsideItem, StepAction::Skip));
        assert_eq!(step_transition(Suspended, text("x")), (Suspended, StepAction::Skip));
        assert_eq!(
            step_transition(InSubItem, text("x")),
            (InSubItem, StepAction::Continue("x".into()))
        );
        assert_eq!(
            step_transition(InTopLevelItem, StepLineClass::Note("NOTE: n".into())).0,
            InNote
        );
        assert_eq!(
            step_transition(InNote, StepLineClass::AlternatePath("B".into())).0,
            AlternatePathPending
        );
        assert_eq!(
            step_transition(Suspended, StepLineClass::AlternatePath("B".into())).0,
            Suspended
        );
        assert_eq!(
            step_transition(Suspended, StepLineClass::Numbered { number: 4, text: "t".into() }).0,
            InTopLevelItem
        );
        assert_eq!(step_transition(InSubItem, StepLineClass::Artifact).0, Suspended);
    }

    #[test]
    fn alternate_path_label_drops_dash_separator() {
        for line in ["Alternate Path - Web", "Alternate Path \u{2013} Web", "Alternate Path: Web", "Alternate Path:- Web"] {
            assert_eq!(classify_step_line(line), StepLineClass::AlternatePath("Web".into()), "{line}");
        }
        let out = extract_numbered_list(&lines(&["Alternate Path - Web", "1. Log in"]));
        assert_eq!(out[0].render(), "--- Alternate Path: Web ---");
    }

    #[test]
    fn classification_priority() {
        assert!(matches!(classify_step_line("12. Twelve"), StepLineClass::Numbered { number: 12, .. }));
        assert!(matches!(classify_step_line("iv. four"), StepLineClass::Roman { .. }));
        assert!(matches!(classify_step_line("c. three"), StepLineClass::Lettered { key: 'c', .. }));
        assert!(matches!(classify_step_line("Note: x"), StepLineClass::Note(_)));
        assert!(matches!(classify_step_line("alternate path - Web"), StepLineClass::AlternatePath(_)));
        assert_eq!(classify_step_line(""), StepLineClass::Blank);
        assert_eq!(classify_step_line("Item"), StepLineClass::Artifact);
    }
}
