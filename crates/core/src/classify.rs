//! Paragraph role detection from surface text features.
//!
//! Classification is a pure function of a paragraph's text, run boldness and
//! current style. It never mutates; [`crate::normalize`] applies the result.
//!
//! Precedence is list > header > body: a line carrying a list marker is a list
//! item no matter how short or bold it is.

use crate::style::{StyleMap, StyleRole};
use crate::types::{Paragraph, Run};
use regex::Regex;
use std::sync::LazyLock;

/// Leading list marker: a hyphen, asterisk or bullet, or digits followed by
/// `.` or `)`, then at least one whitespace character.
static LIST_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(?P<symbol>[-*•])|\d+[.)])\s+").unwrap());

/// Lines shorter than this (in characters) without a final period are headers.
pub const HEADER_MAX_CHARS: usize = 60;

/// Headers shorter than this (in characters) are major headings.
pub const MAJOR_HEADING_MAX_CHARS: usize = 30;

/// Leading spaces that mark a paragraph as badly indented.
const INDENT_ANOMALY_SPACES: &str = "     ";

/// Kind of list a marker introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    pub fn role(self) -> StyleRole {
        match self {
            Self::Bullet => StyleRole::BulletList,
            Self::Number => StyleRole::NumberList,
        }
    }

    fn from_role(role: StyleRole) -> Option<Self> {
        match role {
            StyleRole::BulletList => Some(Self::Bullet),
            StyleRole::NumberList => Some(Self::Number),
            _ => None,
        }
    }
}

/// Heading level chosen from header length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    Major,
    Minor,
}

impl HeadingLevel {
    pub fn role(self) -> StyleRole {
        match self {
            Self::Major => StyleRole::HeadingMajor,
            Self::Minor => StyleRole::HeadingMinor,
        }
    }
}

/// The role detected for a non-blank paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A list item. `marker_len` is the byte length of the marker and the
    /// whitespace after it, measured on the trimmed text; zero when the
    /// paragraph already carries a list style and has no marker.
    List { kind: ListKind, marker_len: usize },

    /// A heading.
    Header(HeadingLevel),

    /// Body text. `reindent` is set when the raw text starts with an
    /// indentation anomaly that should be stripped.
    Body { reindent: bool },
}

impl Classification {
    /// The style role this classification assigns.
    pub fn role(&self) -> StyleRole {
        match self {
            Self::List { kind, .. } => kind.role(),
            Self::Header(level) => level.role(),
            Self::Body { .. } => StyleRole::Body,
        }
    }
}

/// Classify a paragraph. Returns `None` for blank paragraphs.
pub fn classify(paragraph: &Paragraph, styles: &StyleMap) -> Option<Classification> {
    if paragraph.is_blank() {
        return None;
    }
    let raw = paragraph.text();
    let trimmed = raw.trim();

    if let Some((kind, marker_len)) = match_list_marker(trimmed) {
        return Some(Classification::List { kind, marker_len });
    }

    let styled_list = paragraph
        .style
        .as_deref()
        .and_then(|id| styles.role_of(id))
        .and_then(ListKind::from_role);
    if let Some(kind) = styled_list {
        return Some(Classification::List {
            kind,
            marker_len: 0,
        });
    }

    if looks_like_header(trimmed, &paragraph.runs) {
        let level = if trimmed.chars().count() < MAJOR_HEADING_MAX_CHARS {
            HeadingLevel::Major
        } else {
            HeadingLevel::Minor
        };
        return Some(Classification::Header(level));
    }

    Some(Classification::Body {
        reindent: has_indent_anomaly(&raw),
    })
}

/// Match a list marker at the start of already-trimmed text.
///
/// Returns the list kind and the byte length of the marker plus the
/// whitespace following it.
pub fn match_list_marker(text: &str) -> Option<(ListKind, usize)> {
    let caps = LIST_MARKER_REGEX.captures(text)?;
    let kind = if caps.name("symbol").is_some() {
        ListKind::Bullet
    } else {
        ListKind::Number
    };
    Some((kind, caps.get(0)?.end()))
}

/// Whether every run with non-blank text is explicitly bold.
///
/// Vacuously true when no run has non-blank text.
pub fn all_runs_bold(runs: &[Run]) -> bool {
    runs.iter()
        .filter(|r| !r.text.trim().is_empty())
        .all(|r| r.format.is_bold())
}

fn looks_like_header(trimmed: &str, runs: &[Run]) -> bool {
    let short_unterminated =
        trimmed.chars().count() < HEADER_MAX_CHARS && !trimmed.ends_with('.');
    short_unterminated || all_runs_bold(runs)
}

/// Whether raw text starts with five spaces or a tab.
pub fn has_indent_anomaly(raw: &str) -> bool {
    raw.starts_with(INDENT_ANOMALY_SPACES) || raw.starts_with('\t')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunFormat;

    fn styles() -> StyleMap {
        StyleMap::resolve(|name| Some(name.replace(' ', "")))
    }

    fn plain(text: &str) -> Paragraph {
        Paragraph::with_runs(vec![Run::new(text)])
    }

    fn bold(text: &str) -> Run {
        Run::new(text).with_format(RunFormat::new().with_bold(true))
    }

    #[test]
    fn test_list_markers() {
        assert_eq!(match_list_marker("- Buy milk"), Some((ListKind::Bullet, 2)));
        assert_eq!(match_list_marker("* item"), Some((ListKind::Bullet, 2)));
        assert_eq!(match_list_marker("• item"), Some((ListKind::Bullet, 4)));
        assert_eq!(match_list_marker("3) Review"), Some((ListKind::Number, 3)));
        assert_eq!(match_list_marker("12.   Twelve"), Some((ListKind::Number, 6)));
    }

    #[test]
    fn test_non_markers() {
        assert_eq!(match_list_marker("-dash"), None);
        assert_eq!(match_list_marker("3.14 is pi"), None);
        assert_eq!(match_list_marker("--"), None);
        assert_eq!(match_list_marker("a) lettered"), None);
    }

    #[test]
    fn test_list_beats_header() {
        let p = Paragraph::with_runs(vec![bold("1. Intro")]);
        assert_eq!(
            classify(&p, &styles()),
            Some(Classification::List {
                kind: ListKind::Number,
                marker_len: 3
            })
        );
    }

    #[test]
    fn test_existing_list_style_stays_list() {
        let p = plain("Review draft").with_style("ListNumber");
        assert_eq!(
            classify(&p, &styles()),
            Some(Classification::List {
                kind: ListKind::Number,
                marker_len: 0
            })
        );
    }

    #[test]
    fn test_blank_is_unclassified() {
        assert_eq!(classify(&Paragraph::new(), &styles()), None);
        assert_eq!(classify(&plain("   \t "), &styles()), None);
    }

    #[test]
    fn test_header_length_boundary() {
        let text = "a".repeat(59);
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Header(HeadingLevel::Minor))
        );

        let text = "a".repeat(29);
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Header(HeadingLevel::Major))
        );

        let text = "a".repeat(30);
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Header(HeadingLevel::Minor))
        );

        let text = "a".repeat(60);
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Body { reindent: false })
        );
    }

    #[test]
    fn test_short_sentence_with_period_is_body() {
        assert_eq!(
            classify(&plain("Short."), &styles()),
            Some(Classification::Body { reindent: false })
        );
    }

    #[test]
    fn test_all_bold_long_sentence_is_header() {
        let text = format!("{}.", "b".repeat(80));
        let p = Paragraph::with_runs(vec![bold(&text), Run::new("  ")]);
        assert_eq!(
            classify(&p, &styles()),
            Some(Classification::Header(HeadingLevel::Minor))
        );
    }

    #[test]
    fn test_length_counts_characters() {
        // 29 characters but 58 bytes
        let text = "é".repeat(29);
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Header(HeadingLevel::Major))
        );
    }

    #[test]
    fn test_all_runs_bold_is_vacuous_without_text() {
        // Known edge case: nothing falsifies the check.
        assert!(all_runs_bold(&[]));
        assert!(all_runs_bold(&[Run::new("   "), Run::new("\t")]));
        assert!(!all_runs_bold(&[bold("a"), Run::new("b")]));
    }

    #[test]
    fn test_indent_anomaly() {
        let text = format!("     {}.", "x".repeat(70));
        assert_eq!(
            classify(&plain(&text), &styles()),
            Some(Classification::Body { reindent: true })
        );
        assert!(has_indent_anomaly("\tTabbed"));
        assert!(!has_indent_anomaly("    four spaces"));
    }
}
