//! Text normalisation and running-header detection.
//!
//! Every extractor downstream works on lines that passed through these
//! predicates, so the rules here decide what counts as content at all.
//!
//! ## Rules
//!
//! [`normalize`] is a fixed point: `normalize(normalize(x)) == normalize(x)`.
//!
//! 1. Non-breaking spaces become ordinary spaces
//! 2. Hyphen, en-dash and em-dash variants become `-`
//! 3. Private-use bullet glyphs become their printable equivalents
//! 4. Runs of spaces/tabs collapse to one space
//! 5. Leading and trailing whitespace is trimmed (leading indentation is
//!    kept verbatim when `preserve_indent` is set)
//!
//! [`clean_extracted`] additionally strips the known running headers that
//! leak into joined text and collapses 3+ newlines to one blank line.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Glyph tables ─────────────────────────────────────────────────────────

/// Glyphs that mark a top-level bullet when they stand alone on a line.
pub const BULLET_GLYPHS: [&str; 3] = ["\u{f0b7}", "\u{f0fc}", "•"];

/// Glyphs that mark a second-level bullet when alone on a line.
pub const SUB_BULLET_GLYPHS: [&str; 4] = ["o", "O", "○", "◦"];

/// Glyphs that mark a third-level bullet when alone on a line.
pub const NESTED_BULLET_GLYPHS: [&str; 4] = ["\u{f0a7}", "▪", "■", "□"];

/// The nine process codes. A line starting with one of these followed by a
/// capitalised word is a repeated process-name banner, not content.
///
/// Only these codes count: any two capitals would also match content such
/// as `IT Staff Reviews ...` or `US Mail ...` and drop it.
const AREA_CODES: &str = "BR|CM|CO|EE|FM|OM|PE|PL|PM";

// ── Normaliser ───────────────────────────────────────────────────────────

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Normalise one piece of extracted text.
///
/// With `preserve_indent`, the leading run of spaces/tabs is kept as-is and
/// only the remainder is cleaned. A whitespace-only input yields `""`.
pub fn normalize(text: &str, preserve_indent: bool) -> String {
    let text = map_chars(text);
    if preserve_indent {
        let body = text.trim_start_matches([' ', '\t']);
        let indent = &text[..text.len() - body.len()];
        let body = collapse(body);
        if body.is_empty() {
            return String::new();
        }
        format!("{indent}{body}")
    } else {
        collapse(&text)
    }
}

fn map_chars(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{a0}' => ' ',
            '\u{2010}' | '\u{2013}' | '\u{2014}' => '-',
            '\u{f0b7}' => '•',
            '\u{f0fc}' | '\u{f0a7}' => '▪',
            other => other,
        })
        .collect()
}

fn collapse(text: &str) -> String {
    RE_HSPACE.replace_all(text, " ").trim().to_string()
}

// ── Header stripping ─────────────────────────────────────────────────────

static RE_HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)Part I\s*-?\s*Business Architecture.*?Details").unwrap(),
        Regex::new(r"(?i)Part I,?\s*Appendix [CD]\s*-?\s*Page\s*\d+").unwrap(),
        Regex::new(r"(?i)May 2014\s*Version 3\.0").unwrap(),
        // "CM Case Management Establish Case Item Details"
        Regex::new(r"[A-Z]{2}[ \t]+[A-Za-z \t]+?[ \t]+Item[ \t]+Details").unwrap(),
    ]
});

static RE_MANY_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip running-header substrings from joined text, then [`normalize`].
pub fn clean_extracted(text: &str, preserve_indent: bool) -> String {
    let text = map_chars(text);
    let body = if preserve_indent {
        text.trim_start_matches([' ', '\t'])
    } else {
        text.as_str()
    };
    let indent = &text[..text.len() - body.len()];

    let mut s = RE_HSPACE.replace_all(body, " ").into_owned();
    s = RE_MANY_NEWLINES.replace_all(&s, "\n\n").into_owned();
    for re in RE_HEADER_PATTERNS.iter() {
        s = re.replace_all(&s, "").into_owned();
    }
    let s = normalize(&s, false);
    if s.is_empty() {
        return s;
    }
    format!("{indent}{s}")
}

// ── Line predicates ──────────────────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"page\s*\d+").unwrap());

static RE_HEADER_LABELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpart\s+(i|1)\b|\bappendix\s+[cd]\b|may 2014|version 3\.0|matrix details|model details",
    )
    .unwrap()
});

static RE_CODE_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?:{AREA_CODES})\s+(?:[-\x{{2013}}]\s+)?[A-Z]")).unwrap());

/// True when `line` is a repeating page header or footer.
pub fn is_page_header(line: &str) -> bool {
    let lower = map_chars(line).to_lowercase();
    if lower.trim().is_empty() {
        return false;
    }
    if RE_PAGE_NUMBER.is_match(&lower) {
        return true;
    }
    if lower.contains("business architecture") && lower.contains("appendix") {
        return true;
    }
    RE_HEADER_LABELS.is_match(&lower)
}

/// True for the `Item` / `Details` table-header cells repeated on every page.
pub fn is_item_details(line: &str) -> bool {
    matches!(line.trim(), "Item" | "Details" | "Item Details")
}

/// True for a repeated `<CODE> [-] <Capitalised words>` process banner, where
/// `CODE` is one of the nine process codes.
pub fn is_code_banner(line: &str) -> bool {
    RE_CODE_BANNER.is_match(line.trim())
}

/// Any artifact line that must never be treated as content.
pub fn is_layout_artifact(line: &str) -> bool {
    is_page_header(line) || is_item_details(line) || is_code_banner(line)
}

static RE_TITLE_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}\s+[A-Z][a-z]+(\s+[A-Z][a-z]+)*$").unwrap());

/// Header artifacts that leak into the short list sections
/// (Shared Data, Predecessor, Successor).
pub fn is_process_header_artifact(line: &str, code: &str, process_name: &str) -> bool {
    let line = line.trim();
    if is_item_details(line) {
        return true;
    }
    if !process_name.is_empty() && line == process_name {
        return true;
    }
    if line.strip_prefix(code).is_some_and(|rest| rest.starts_with(' ')) {
        return true;
    }
    RE_TITLE_BANNER.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_spaces_and_dashes() {
        assert_eq!(normalize("a\u{a0}\u{a0}b \u{2013} c\u{2014}d", false), "a b - c-d");
    }

    #[test]
    fn normalize_collapses_tabs_and_trims() {
        assert_eq!(normalize("  alpha \t  beta  ", false), "alpha beta");
    }

    #[test]
    fn normalize_preserves_indent() {
        assert_eq!(normalize("    ii.  Check   it ", true), "    ii. Check it");
        assert_eq!(normalize("   ", true), "");
    }

    #[test]
    fn normalize_is_a_fixed_point() {
        let inputs = [
            "  x\u{a0} \u{2010} y  ",
            "\u{f0b7} First\t\titem",
            "   a.   nested \u{2013} text ",
            "line one  \nline  two",
            "",
        ];
        for input in inputs {
            for indent in [false, true] {
                let once = normalize(input, indent);
                assert_eq!(normalize(&once, indent), once, "input: {input:?}");
            }
        }
    }

    #[test]
    fn clean_extracted_strips_running_headers() {
        let text = "Verify eligibility May 2014 Version 3.0 before enrolment";
        assert_eq!(clean_extracted(text, false), "Verify eligibility before enrolment");

        let text = "Step text Part I, Appendix D - Page 12 continues";
        assert_eq!(clean_extracted(text, false), "Step text continues");

        let text = "CM Case Management Establish Case Item Details";
        assert_eq!(clean_extracted(text, false), "");
    }

    #[test]
    fn clean_extracted_collapses_blank_lines() {
        assert_eq!(clean_extracted("a\n\n\n\nb", false), "a\n\nb");
    }

    #[test]
    fn page_header_detection() {
        assert!(is_page_header("Part I, Appendix C - Page 34"));
        assert!(is_page_header("May 2014 Version 3.0"));
        assert!(is_page_header("Business Architecture Appendix"));
        assert!(is_page_header("Page 7"));
        assert!(!is_page_header("The member is part of a household"));
        assert!(!is_page_header("Describes the partial payment"));
        assert!(!is_page_header(""));
    }

    #[test]
    fn artifact_predicates() {
        assert!(is_item_details("Item"));
        assert!(is_item_details(" Details "));
        assert!(!is_item_details("Item count"));
        assert!(is_code_banner("CM Case Management"));
        assert!(is_code_banner("PL - Plan Administration"));
        assert!(is_code_banner("PL \u{2013} Plan Administration"));
        assert!(!is_code_banner("IT staff reviews the request"));
        assert!(!is_code_banner("IT Staff Reviews The Request"));
        assert!(!is_code_banner("US Mail Delivery"));
        assert!(!is_code_banner("NOTE: see below"));
    }

    #[test]
    fn process_header_artifacts() {
        assert!(is_process_header_artifact("OM Claims Adjudication", "OM", "Edit Claim"));
        assert!(is_process_header_artifact("Edit Claim", "OM", "Edit Claim"));
        assert!(is_process_header_artifact("Details", "OM", "Edit Claim"));
        assert!(!is_process_header_artifact("Member data store", "OM", "Edit Claim"));
    }
}
