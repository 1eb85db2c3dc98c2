//! Reference annotator.
//!
//! Splits a trailing or embedded parenthetical off a question's text and
//! classifies it as an image pointer, a scripture citation, or neither.
//! Only the first qualifying parenthetical is processed; anything shorter
//! than the noise threshold (a stray footnote digit, for instance) is left
//! in place and ignored.

use crate::model::{ContentType, Question};
use crate::segment::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Parenthetical content at or below this many characters is noise.
pub const MIN_PARENTHESIS_LEN: usize = 3;

/// A parenthesized group immediately following a question mark.
static AFTER_QUESTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?(\s*\(([^)]+)\))").expect("valid regex"));

/// Any parenthesized group.
static ANY_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));

/// A "see (also) the illustration/box/photo/drawing" phrasing.
static IMAGE_LEAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^vea\b").expect("valid regex"));
static IMAGE_NOUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)también|imagen|imágenes|ilustraci|recuadro|foto|dibujo|portada")
        .expect("valid regex")
});

/// A citation-shaped token: one or more words then `chapter:verse`.
static SCRIPTURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[1-3]\s+)?\p{L}[\p{L}.]*(?:\s+\p{L}[\p{L}.]*)*\s+\d+:\d+").expect("valid regex")
});

/// Result of splitting a parenthetical off a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    /// Visible text with the extracted parenthetical removed.
    pub text: String,
    /// Extracted content, empty when nothing qualified.
    pub parenthesis_content: String,
    /// Classification of the extracted content.
    pub content_type: ContentType,
}

/// Split off and classify the first qualifying parenthetical.
pub fn extract_parenthesis(raw: &str) -> AnnotatedText {
    let raw = raw.trim();

    // Prefer a group right after a question mark; otherwise the first
    // group anywhere, noise-filtered either way.
    let located = AFTER_QUESTION_RE
        .captures(raw)
        .and_then(|caps| {
            let content = caps.get(2).map(|m| m.as_str().trim().to_string())?;
            let removal = caps.get(1)?;
            Some((removal.range(), content))
        })
        .or_else(|| {
            ANY_PAREN_RE.captures(raw).and_then(|caps| {
                let content = caps.get(1).map(|m| m.as_str().trim().to_string())?;
                let removal = caps.get(0)?;
                Some((removal.range(), content))
            })
        })
        .filter(|(_, content)| content.chars().count() > MIN_PARENTHESIS_LEN);

    let Some((range, content)) = located else {
        return AnnotatedText {
            text: collapse_whitespace(raw),
            parenthesis_content: String::new(),
            content_type: ContentType::None,
        };
    };

    let mut remaining = String::with_capacity(raw.len());
    remaining.push_str(&raw[..range.start]);
    remaining.push_str(&raw[range.end..]);

    AnnotatedText {
        text: collapse_whitespace(remaining.trim()),
        content_type: classify_content(&content),
        parenthesis_content: content,
    }
}

/// Classification rules, in order: image phrasing, then citation shape,
/// else unclassified with the content preserved verbatim.
pub fn classify_content(content: &str) -> ContentType {
    if IMAGE_LEAD_RE.is_match(content) && IMAGE_NOUN_RE.is_match(content) {
        ContentType::Image
    } else if SCRIPTURE_RE.is_match(content) {
        ContentType::Scripture
    } else {
        ContentType::None
    }
}

/// Build a [`Question`] from raw text, running the annotator.
pub fn build_question(raw: &str, answer_time: u32, is_final: bool) -> Question {
    let annotated = extract_parenthesis(raw);
    Question {
        text: annotated.text,
        answer_time,
        is_final_question: is_final,
        parenthesis_content: annotated.parenthesis_content,
        content_type: annotated.content_type,
    }
}
