//! Line classifier.
//!
//! Normalizes a raw text span into a typed token using document-wide font
//! statistics plus the span's own content. The statistics are computed once
//! per document into an immutable [`FontProfile`] and passed into every
//! classification call; there is no global state.
//!
//! The classifier never fails: unrecognized content degrades to the most
//! permissive tag so no input is silently dropped.

use crate::extract::TextUnit;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Tolerance band around a discovered size tier (points).
pub const SIZE_TOLERANCE: f32 = 0.6;

/// Minimum separation between size tiers for them to count as distinct.
pub const TIER_GAP: f32 = 0.75;

/// Reserved ornament glyph; discarded from all downstream logic.
pub const ORNAMENT_GLYPH: &str = "◆";

/// A marker line introducing one or more questions: `5.` or `1, 2.` with
/// nothing else on the line.
static QUESTION_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,3}(?:\s*,\s*\d{1,3})*)\.\s*$").expect("valid regex"));

/// Classification tag for one text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTag {
    /// A short numeric token at paragraph-number size; opens a paragraph.
    ParagraphMarker(u32),
    /// Body text at the dominant size.
    ParagraphText,
    /// A numeric (possibly comma-grouped) token at question size. The first
    /// number is the primary target; the question attaches to the last.
    QuestionMarker(Vec<u32>),
    /// Question text at question size.
    QuestionText,
    /// The reserved ornament glyph; dropped entirely.
    Ornament,
    /// A fully upper-case banner containing a question mark; candidate
    /// section boundary.
    SectionMarkerText,
}

/// A span together with its classification.
#[derive(Debug, Clone)]
pub struct LineToken {
    pub unit: TextUnit,
    pub tag: LineTag,
}

/// Document-wide font-size statistics, computed once per analysis run.
#[derive(Debug, Clone, Copy)]
pub struct FontProfile {
    /// Modal font size; treated as paragraph body size.
    pub body_size: f32,
    /// Discovered question-text size tier, if distinct from the body.
    pub question_size: Option<f32>,
    /// Discovered paragraph-number size tier, if distinct from both.
    pub number_size: Option<f32>,
}

impl FontProfile {
    /// Derive the profile from all spans of a document.
    ///
    /// Sizes are bucketed to a tenth of a point and weighted by character
    /// count, so a handful of footnote glyphs cannot outvote the body text.
    /// Ties break toward the larger size.
    pub fn from_units(units: &[TextUnit]) -> Option<FontProfile> {
        let mut weights: HashMap<i32, usize> = HashMap::new();
        for unit in units {
            let chars = unit.content.chars().filter(|c| !c.is_whitespace()).count();
            if chars > 0 {
                *weights.entry(bucket(unit.font_size)).or_insert(0) += chars;
            }
        }
        if weights.is_empty() {
            return None;
        }

        let body = mode_of(&weights, f32::MAX)?;
        let question = mode_of(&weights, body - TIER_GAP);
        let number = question.and_then(|q| mode_of(&weights, q - TIER_GAP));

        Some(FontProfile {
            body_size: body,
            question_size: question,
            number_size: number,
        })
    }

    /// Whether the span path has enough tiers to be worth using.
    pub fn has_question_tier(&self) -> bool {
        self.question_size.is_some()
    }

    pub fn in_body_band(&self, size: f32) -> bool {
        (size - self.body_size).abs() <= SIZE_TOLERANCE
    }

    pub fn in_question_band(&self, size: f32) -> bool {
        self.question_size
            .is_some_and(|q| (size - q).abs() <= SIZE_TOLERANCE)
    }

    pub fn in_number_band(&self, size: f32) -> bool {
        self.number_size
            .is_some_and(|n| (size - n).abs() <= SIZE_TOLERANCE)
    }
}

fn bucket(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

/// Heaviest bucket strictly below `below`, as a size in points.
fn mode_of(weights: &HashMap<i32, usize>, below: f32) -> Option<f32> {
    weights
        .iter()
        .filter(|(k, _)| (**k as f32) / 10.0 < below)
        .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))
        .map(|(k, _)| (*k as f32) / 10.0)
}

/// Classify one span. Rules apply in priority order; the last rule is a
/// permissive fallback, so every span gets a tag.
pub fn classify_unit(unit: &TextUnit, profile: &FontProfile) -> LineTag {
    let text = unit.content.trim();

    if text == ORNAMENT_GLYPH {
        return LineTag::Ornament;
    }

    if !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit())
        && profile.in_number_band(unit.font_size)
    {
        if let Ok(number) = text.parse::<u32>() {
            return LineTag::ParagraphMarker(number);
        }
    }

    if profile.in_question_band(unit.font_size) {
        if let Some(caps) = QUESTION_MARKER_RE.captures(text) {
            let numbers = parse_number_list(&caps[1]);
            if !numbers.is_empty() {
                return LineTag::QuestionMarker(numbers);
            }
        }
        if text.contains('?') || text.contains('¿') {
            return LineTag::QuestionText;
        }
    }

    if profile.in_body_band(unit.font_size) {
        return LineTag::ParagraphText;
    }

    if is_upper_banner(text) {
        LineTag::SectionMarkerText
    } else {
        LineTag::ParagraphText
    }
}

/// Classify every span of a document against one shared profile.
pub fn classify_all(units: &[TextUnit], profile: &FontProfile) -> Vec<LineToken> {
    units
        .iter()
        .map(|unit| LineToken {
            unit: unit.clone(),
            tag: classify_unit(unit, profile),
        })
        .collect()
}

/// A fully upper-case line containing a question mark, e.g. a printed
/// section banner.
pub fn is_upper_banner(text: &str) -> bool {
    let has_letters = text.chars().any(|c| c.is_alphabetic());
    has_letters
        && text.contains('?')
        && text
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| c.is_uppercase())
}

fn parse_number_list(list: &str) -> Vec<u32> {
    list.split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect()
}
