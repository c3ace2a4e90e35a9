//! Heuristic section and clause segmentation.
//!
//! Splits extracted document text into an ordered sequence of [`Section`]s.
//! A non-blank line either opens a new section (when a header or clause rule
//! matches) or is appended to the section that is currently open. A line seen
//! while no section is open becomes a one-line `General Content` paragraph.
//!
//! The detection rules live in the [`HEADER_RULES`] and [`CLAUSE_RULES`]
//! tables so they can be tested and extended without touching the scanner.
//!
//! Page numbers are an approximation: the counter advances every
//! [`LINES_PER_PAGE`] non-blank lines and has no relation to the real page
//! breaks of the source document.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Section, SectionKind};

/// Non-blank lines per approximate page.
pub const LINES_PER_PAGE: usize = 50;

/// Title given to text that appears outside any detected header or clause.
pub const GENERAL_CONTENT_TITLE: &str = "General Content";

/// Header lines must be strictly longer than this many characters...
const HEADER_MIN_LEN: usize = 3;
/// ...and strictly shorter than this many.
const HEADER_MAX_LEN: usize = 80;

static NUMBERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s").expect("valid regex"));
static CAPS_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z\s]{5,}$").expect("valid regex"));
static CLAUSE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.|\([a-z]\)|\([0-9]+\))\s").expect("valid regex"));
static CLAUSE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(CLAUSE|ARTICLE|SECTION)\s+\d+").expect("valid regex"));

/// A named predicate over a single trimmed line.
#[derive(Clone, Copy)]
pub struct LineRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

impl std::fmt::Debug for LineRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineRule").field("name", &self.name).finish()
    }
}

/// Any of these marks a header, subject to the length bounds.
pub const HEADER_RULES: &[LineRule] = &[
    LineRule {
        name: "upper_case",
        matches: |line| line.to_uppercase() == line,
    },
    LineRule {
        name: "numbered",
        matches: |line| NUMBERED_PREFIX.is_match(line),
    },
    LineRule {
        name: "caps_run",
        matches: |line| CAPS_RUN.is_match(line),
    },
];

/// Any of these marks a clause; clause wins over header.
pub const CLAUSE_RULES: &[LineRule] = &[
    LineRule {
        name: "enumerated",
        matches: |line| CLAUSE_MARKER.is_match(line),
    },
    LineRule {
        name: "keyword",
        matches: |line| CLAUSE_KEYWORD.is_match(line),
    },
];

pub fn is_header_line(line: &str) -> bool {
    let len = line.chars().count();
    len > HEADER_MIN_LEN && len < HEADER_MAX_LEN && HEADER_RULES.iter().any(|r| (r.matches)(line))
}

pub fn is_clause_line(line: &str) -> bool {
    CLAUSE_RULES.iter().any(|r| (r.matches)(line))
}

/// Section kind opened by `line`, or `None` if it is body text.
pub fn classify_line(line: &str) -> Option<SectionKind> {
    if is_clause_line(line) {
        Some(SectionKind::Clause)
    } else if is_header_line(line) {
        Some(SectionKind::Header)
    } else {
        None
    }
}

/// Split text into sections. Returns an empty vector only for blank input.
///
/// Every non-blank line ends up in exactly one section, either as its title
/// or as one line of its content. A blank line closes the open section once
/// that section has content, so a header separated from its body by blank
/// lines still keeps the body. Body lines with no open section each become
/// their own `General Content` paragraph.
pub fn segment_text(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    let mut page: u32 = 1;
    let mut line_index = 0usize;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            if current.as_ref().is_some_and(|s| !s.content.is_empty()) {
                sections.extend(current.take());
            }
            continue;
        }

        match classify_line(line) {
            Some(kind) => {
                sections.extend(current.take());
                current = Some(Section {
                    title: line.to_string(),
                    content: String::new(),
                    page,
                    kind,
                });
            }
            None => match current.as_mut() {
                Some(section) => {
                    if !section.content.is_empty() {
                        section.content.push('\n');
                    }
                    section.content.push_str(line);
                }
                // Loose body text becomes a one-line paragraph; nothing stays open.
                None => sections.push(Section {
                    title: GENERAL_CONTENT_TITLE.to_string(),
                    content: line.to_string(),
                    page,
                    kind: SectionKind::Paragraph,
                }),
            },
        }

        if line_index > 0 && line_index % LINES_PER_PAGE == 0 {
            page += 1;
        }
        line_index += 1;
    }

    sections.extend(current);
    sections
}
