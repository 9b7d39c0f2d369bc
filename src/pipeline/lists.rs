//! List and paragraph reconstruction for BPT sections.
//!
//! PDF text extraction emits bullet glyphs either inline (`• text`) or on a
//! line of their own with the item text on the following lines. Wrapped
//! lines arrive as separate lines too. The extractors here rebuild logical
//! items from that stream.
//!
//! [`extract_description`] is driven by a small state machine
//! ([`BlockState`] × [`DescLine`]) so each transition can be tested alone.

use crate::pipeline::normalize::{
    clean_extracted, is_page_header, is_process_header_artifact, normalize, BULLET_GLYPHS,
    NESTED_BULLET_GLYPHS, SUB_BULLET_GLYPHS,
};
use crate::pipeline::sections::SectionKind;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").unwrap());

fn is_stop_title(line: &str) -> bool {
    SectionKind::ALL.iter().any(|k| {
        let t = k.title();
        line == t || line.strip_prefix(t).is_some_and(|rest| rest.starts_with(' '))
    })
}

fn strip_inline_bullet(line: &str) -> Option<&str> {
    line.strip_prefix("• ").or_else(|| line.strip_prefix("- "))
}

// ── Bulleted list ────────────────────────────────────────────────────────

/// Rebuild a bulleted list (Result, Failures, Performance Measures).
///
/// A bullet glyph alone on a line, or a blank line, closes the current item
/// and opens a new one. Content seen before any bullet or blank line is
/// ignored. A numbered line or a section title ends the list.
pub fn extract_bulleted_list(lines: &[String]) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_bullet = false;

    let finish = |current: &mut String, items: &mut Vec<String>| {
        if !current.is_empty() {
            let cleaned = clean_extracted(current, false);
            if !cleaned.is_empty() {
                items.push(cleaned);
            }
            current.clear();
        }
    };

    for raw in lines {
        let line = raw.trim();
        if is_page_header(line) {
            continue;
        }
        if is_stop_title(line) || RE_NUMBERED_ITEM.is_match(line) {
            break;
        }
        if line.is_empty() || BULLET_GLYPHS.contains(&line) {
            finish(&mut current, &mut items);
            in_bullet = true;
            continue;
        }
        if let Some(rest) = strip_inline_bullet(line) {
            finish(&mut current, &mut items);
            current.push_str(rest);
            in_bullet = true;
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
            current.push_str(line);
        } else if in_bullet {
            current.push_str(line);
        }
    }
    finish(&mut current, &mut items);
    items
}

// ── Description / Constraints ────────────────────────────────────────────

/// Bullet depth in a description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletLevel {
    Main,
    Sub,
    Nested,
}

impl BulletLevel {
    fn prefix(self) -> &'static str {
        match self {
            BulletLevel::Main => "• ",
            BulletLevel::Sub => "  - ",
            BulletLevel::Nested => "    · ",
        }
    }
}

/// Classification of one description line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescLine<'a> {
    Blank,
    Header,
    SectionTitle,
    /// A bullet glyph alone on its line.
    Marker(BulletLevel),
    /// Glyph plus text on the same line.
    InlineBullet(BulletLevel, &'a str),
    Note(&'a str),
    Text(&'a str),
}

/// Classify a trimmed description line.
pub fn classify_desc_line(line: &str) -> DescLine<'_> {
    if is_page_header(line) {
        return DescLine::Header;
    }
    if SectionKind::is_title(line) {
        return DescLine::SectionTitle;
    }
    if line.is_empty() {
        return DescLine::Blank;
    }
    if BULLET_GLYPHS.contains(&line) {
        return DescLine::Marker(BulletLevel::Main);
    }
    if SUB_BULLET_GLYPHS.contains(&line) {
        return DescLine::Marker(BulletLevel::Sub);
    }
    if NESTED_BULLET_GLYPHS.contains(&line) {
        return DescLine::Marker(BulletLevel::Nested);
    }
    for (prefix, level) in [
        ("• ", BulletLevel::Main),
        ("- ", BulletLevel::Main),
        ("\u{f0b7} ", BulletLevel::Main),
        ("o ", BulletLevel::Sub),
        ("○ ", BulletLevel::Sub),
        ("\u{f0fc} ", BulletLevel::Nested),
        ("\u{f0a7} ", BulletLevel::Nested),
        ("▪ ", BulletLevel::Nested),
    ] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return DescLine::InlineBullet(level, rest);
        }
    }
    if line.starts_with("NOTE:") || line.starts_with("Note:") {
        return DescLine::Note(line);
    }
    DescLine::Text(line)
}

/// Reconstruction state between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// No block open.
    Idle,
    /// A paragraph, bullet item or note is accumulating text.
    Accumulating,
    /// A bullet glyph was seen; the next text line is its item.
    PendingBullet(BulletLevel),
}

/// What to do with the block buffer for one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAction {
    Skip,
    Stop,
    /// Close the open block.
    Close,
    /// Close the open block and start a new one with this text.
    Open(String),
    /// Append text to the open block (or open one).
    Append(String),
}

/// The description transition table.
pub fn desc_transition(state: BlockState, line: &DescLine<'_>) -> (BlockState, BlockAction) {
    match (state, line) {
        (_, DescLine::SectionTitle) => (state, BlockAction::Stop),
        (_, DescLine::Header) => (state, BlockAction::Skip),
        (_, DescLine::Blank) => (BlockState::Idle, BlockAction::Close),
        (_, DescLine::Marker(level)) => (BlockState::PendingBullet(*level), BlockAction::Close),
        (_, DescLine::InlineBullet(level, text)) => (
            BlockState::Accumulating,
            BlockAction::Open(format!("{}{}", level.prefix(), text)),
        ),
        (BlockState::PendingBullet(level), DescLine::Note(text) | DescLine::Text(text)) => (
            BlockState::Accumulating,
            BlockAction::Open(format!("{}{}", level.prefix(), text)),
        ),
        (_, DescLine::Note(text)) => (BlockState::Accumulating, BlockAction::Open(text.to_string())),
        (_, DescLine::Text(text)) => (BlockState::Accumulating, BlockAction::Append(text.to_string())),
    }
}

/// Rebuild a description (or constraints) block of paragraphs and a
/// three-level bullet hierarchy.
///
/// Blocks are emitted one per line: `• main`, `  - sub`, `    · nested`,
/// paragraphs and `NOTE:` blocks unprefixed.
pub fn extract_description(lines: &[String]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut state = BlockState::Idle;

    let close = |current: &mut String, blocks: &mut Vec<String>| {
        if !current.is_empty() {
            let cleaned = clean_extracted(current, true);
            if !cleaned.is_empty() {
                blocks.push(cleaned);
            }
            current.clear();
        }
    };

    for raw in lines {
        let line = raw.trim();
        let (next, action) = desc_transition(state, &classify_desc_line(line));
        state = next;
        match action {
            BlockAction::Skip => {}
            BlockAction::Stop => break,
            BlockAction::Close => close(&mut current, &mut blocks),
            BlockAction::Open(text) => {
                close(&mut current, &mut blocks);
                current = text;
            }
            BlockAction::Append(text) => {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&text);
            }
        }
    }
    close(&mut current, &mut blocks);
    blocks.join("\n")
}

// ── Trigger events ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerCategory {
    Environment,
    Interaction,
}

/// Split the Trigger Event section into environment-based and
/// interaction-based items.
///
/// Items seen before either heading fall back to interaction-based.
pub fn extract_trigger_events(lines: &[String]) -> (Vec<String>, Vec<String>) {
    let mut environment = Vec::new();
    let mut interaction = Vec::new();
    let mut category: Option<TriggerCategory> = None;
    let mut current = String::new();

    let mut flush = |current: &mut String, category: Option<TriggerCategory>| {
        if current.is_empty() {
            return;
        }
        let item = normalize(current, false);
        current.clear();
        if item.is_empty() {
            return;
        }
        match category {
            Some(TriggerCategory::Environment) => environment.push(item),
            _ => interaction.push(item),
        }
    };

    for raw in lines {
        let line = raw.trim();
        if is_page_header(line) {
            continue;
        }
        if line.contains("Environment-based") || line.contains("Environment based") {
            flush(&mut current, category);
            category = Some(TriggerCategory::Environment);
            continue;
        }
        if line.contains("Interaction-based") || line.contains("Interaction based") {
            flush(&mut current, category);
            category = Some(TriggerCategory::Interaction);
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if BULLET_GLYPHS.contains(&line) {
            flush(&mut current, category);
            continue;
        }
        if SectionKind::is_title(line) {
            break;
        }
        let text = strip_inline_bullet(line).unwrap_or(line);
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(text);
    }
    flush(&mut current, category);
    (environment, interaction)
}

// ── Simple list ──────────────────────────────────────────────────────────

/// One-item-per-line lists (Shared Data, Predecessor, Successor).
///
/// A blank line ends an item; a capitalised line starts a new one unless
/// the current item ends with a comma.
pub fn extract_simple_list(lines: &[String], code: &str, process_name: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();

    let push = |current: &mut String, items: &mut Vec<String>| {
        let item = normalize(current, false);
        if !item.is_empty() {
            items.push(item);
        }
        current.clear();
    };

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            push(&mut current, &mut items);
            continue;
        }
        if is_page_header(line) || is_process_header_artifact(line, code, process_name) {
            continue;
        }
        if SectionKind::is_title(line) {
            break;
        }
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        if !current.is_empty() && starts_upper && !current.ends_with(',') {
            push(&mut current, &mut items);
            current.push_str(line);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line);
        }
    }
    push(&mut current, &mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    // ── Bulleted list ────────────────────────────────────────────────────

    #[test]
    fn bullets_on_their_own_lines() {
        let l = lines(&["•", "First item", "•", "Second item"]);
        assert_eq!(extract_bulleted_list(&l), vec!["First item", "Second item"]);
    }

    #[test]
    fn wrapped_bullet_text_is_joined() {
        let l = lines(&["\u{f0b7}", "The claim is", "adjudicated", "\u{f0b7}", "Payment issued"]);
        assert_eq!(
            extract_bulleted_list(&l),
            vec!["The claim is adjudicated", "Payment issued"]
        );
    }

    #[test]
    fn inline_bullets_and_blank_lines() {
        let l = lines(&["• Alpha", "beta", "", "Gamma", "- Delta"]);
        assert_eq!(extract_bulleted_list(&l), vec!["Alpha beta", "Gamma", "Delta"]);
    }

    #[test]
    fn stops_at_numbered_item_and_section_title() {
        let l = lines(&["•", "Only item", "1. Step text"]);
        assert_eq!(extract_bulleted_list(&l), vec!["Only item"]);

        let l = lines(&["•", "Only item", "Shared Data", "•", "Not included"]);
        assert_eq!(extract_bulleted_list(&l), vec!["Only item"]);
    }

    #[test]
    fn skips_page_headers_inside_items() {
        let l = lines(&["•", "Report", "Part I, Appendix D - Page 9", "generated"]);
        assert_eq!(extract_bulleted_list(&l), vec!["Report generated"]);
    }

    #[test]
    fn leading_text_without_bullet_is_ignored() {
        let l = lines(&["stray", "•", "Kept"]);
        assert_eq!(extract_bulleted_list(&l), vec!["Kept"]);
    }

    // ── Description ──────────────────────────────────────────────────────

    #[test]
    fn description_transitions() {
        use BlockState::*;
        assert_eq!(
            desc_transition(Accumulating, &DescLine::Blank),
            (Idle, BlockAction::Close)
        );
        assert_eq!(
            desc_transition(Idle, &DescLine::Marker(BulletLevel::Sub)),
            (PendingBullet(BulletLevel::Sub), BlockAction::Close)
        );
        assert_eq!(
            desc_transition(PendingBullet(BulletLevel::Sub), &DescLine::Text("x")),
            (Accumulating, BlockAction::Open("  - x".into()))
        );
        assert_eq!(
            desc_transition(Accumulating, &DescLine::Note("NOTE: y")),
            (Accumulating, BlockAction::Open("NOTE: y".into()))
        );
        assert_eq!(
            desc_transition(Accumulating, &DescLine::SectionTitle).1,
            BlockAction::Stop
        );
    }

    #[test]
    fn classify_inline_levels() {
        assert_eq!(
            classify_desc_line("o sub item"),
            DescLine::InlineBullet(BulletLevel::Sub, "sub item")
        );
        assert_eq!(
            classify_desc_line("\u{f0fc} deep"),
            DescLine::InlineBullet(BulletLevel::Nested, "deep")
        );
        assert_eq!(classify_desc_line("▪"), DescLine::Marker(BulletLevel::Nested));
        assert_eq!(classify_desc_line("Trigger Event"), DescLine::SectionTitle);
    }

    #[test]
    fn description_mixes_paragraphs_and_bullets() {
        let l = lines(&[
            "The process receives",
            "a request.",
            "",
            "\u{f0b7}",
            "Main point",
            "o",
            "Sub point",
            "▪",
            "Nested point",
            "NOTE: See the manual.",
            "Trigger Event",
            "ignored",
        ]);
        assert_eq!(
            extract_description(&l),
            "The process receives a request.\n• Main point\n  - Sub point\n    · Nested point\nNOTE: See the manual."
        );
    }

    #[test]
    fn description_note_starts_new_block() {
        let l = lines(&["Paragraph text", "Note: separate", "continues"]);
        assert_eq!(extract_description(&l), "Paragraph text\nNote: separate continues");
    }

    #[test]
    fn empty_description() {
        assert_eq!(extract_description(&lines(&["", "Page 3"])), "");
    }

    // ── Trigger events ───────────────────────────────────────────────────

    #[test]
    fn trigger_events_by_category() {
        let l = lines(&[
            "Environment-based",
            "•",
            "Time to run",
            "the batch",
            "•",
            "End of month",
            "Interaction-based",
            "• Member calls",
        ]);
        let (env, inter) = extract_trigger_events(&l);
        assert_eq!(env, vec!["Time to run the batch", "End of month"]);
        assert_eq!(inter, vec!["Member calls"]);
    }

    #[test]
    fn uncategorised_triggers_fall_back_to_interaction() {
        let l = lines(&["Receipt of a request"]);
        let (env, inter) = extract_trigger_events(&l);
        assert!(env.is_empty());
        assert_eq!(inter, vec!["Receipt of a request"]);
    }

    // ── Simple list ──────────────────────────────────────────────────────

    #[test]
    fn simple_list_splits_on_capitals_and_blanks() {
        let l = lines(&[
            "Member data store",
            "Provider data store,",
            "Contractor data store",
            "",
            "Case data",
            "store",
        ]);
        assert_eq!(
            extract_simple_list(&l, "CM", "Establish Case"),
            vec![
                "Member data store",
                "Provider data store, Contractor data store",
                "Case data store"
            ]
        );
    }

    #[test]
    fn simple_list_skips_artifacts() {
        let l = lines(&["CM Case Management", "Establish Case", "Item", "Manage Case Information"]);
        assert_eq!(
            extract_simple_list(&l, "CM", "Establish Case"),
            vec!["Manage Case Information"]
        );
    }
}
