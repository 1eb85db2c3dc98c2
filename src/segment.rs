//! Paragraph segmenter.
//!
//! Assembles ordered paragraphs from raw text using an ordered list of
//! strategies, tried until one produces a non-degenerate split:
//!
//! 1. numbered-marker: a leading `<digits>.` or `<digits> ` opens a new
//!    paragraph, unless the trailing content is itself a question;
//! 2. blank-line: split on runs of blank lines;
//! 3. whole-text: the entire text as a single paragraph.
//!
//! Paragraphs keep their internal line structure in `raw` (question
//! recognition is line-anchored) and expose a whitespace-collapsed,
//! hyphenation-repaired `display_text` for output.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A line that opens a numbered paragraph: `5 Texto...` or `5. Texto...`.
static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})[.\s]\s*(.*)$").expect("valid regex"));

/// A line that is nothing but a paragraph number.
static BARE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})\.?\s*$").expect("valid regex"));

/// A run of blank lines separating paragraphs.
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// One segmented paragraph with its source lines preserved.
#[derive(Debug, Clone)]
pub struct RawParagraph {
    /// Paragraph number, from a detected marker or defaulted.
    pub number: u32,
    /// Trimmed source lines joined by `\n`.
    pub raw: String,
}

impl RawParagraph {
    fn new(number: u32) -> Self {
        Self {
            number,
            raw: String::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if !self.raw.is_empty() {
            self.raw.push('\n');
        }
        self.raw.push_str(line);
    }

    /// Source lines of the paragraph.
    pub fn lines(&self) -> Vec<&str> {
        if self.raw.is_empty() {
            Vec::new()
        } else {
            self.raw.lines().collect()
        }
    }

    /// Hyphenation-repaired, whitespace-collapsed text for display and
    /// word counting.
    pub fn display_text(&self) -> String {
        collapse_whitespace(&join_lines(self.raw.lines()))
    }
}

/// A segmentation strategy: `Some` on a non-degenerate split, `None` to
/// fall through to the next tier.
type Strategy = fn(&str) -> Option<Vec<RawParagraph>>;

/// Strategy tiers in precedence order. Kept as data so a new heuristic is
/// one more entry, not new control flow.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("numbered-marker", split_numbered),
    ("blank-line", split_blank_runs),
];

/// Segment text into ordered paragraphs, falling back through the strategy
/// tiers. Never returns an empty list for non-empty input.
pub fn split_paragraphs(text: &str) -> Vec<RawParagraph> {
    for (name, strategy) in STRATEGIES {
        if let Some(paragraphs) = strategy(text) {
            debug!(strategy = name, count = paragraphs.len(), "segmented paragraphs");
            return paragraphs;
        }
    }

    // Both strategies degenerate: the whole text is one paragraph.
    let mut para = RawParagraph::new(1);
    for line in text.lines() {
        para.push_line(line);
    }
    vec![para]
}

/// Primary strategy: paragraph-number markers open paragraphs.
fn split_numbered(text: &str) -> Option<Vec<RawParagraph>> {
    let mut paragraphs: Vec<RawParagraph> = Vec::new();
    let mut current: Option<RawParagraph> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match leading_number(line) {
            // A number-led line whose content is itself a question stays a
            // question line of the current paragraph.
            Some((number, rest)) if !is_question_content(&rest) => {
                let same_number = current.as_ref().is_some_and(|p| p.number == number);
                if same_number {
                    if let Some(para) = current.as_mut() {
                        para.push_line(&rest);
                    }
                } else {
                    if let Some(para) = current.take() {
                        push_merged(&mut paragraphs, para);
                    }
                    let mut para = RawParagraph::new(number);
                    para.push_line(&rest);
                    current = Some(para);
                }
            }
            _ => {
                // Wrapped continuation; text before the first marker
                // defaults to paragraph 1.
                current.get_or_insert_with(|| RawParagraph::new(1)).push_line(line);
            }
        }
    }

    if let Some(para) = current {
        push_merged(&mut paragraphs, para);
    }

    if paragraphs.len() > 1 { Some(paragraphs) } else { None }
}

/// Fallback strategy: split on runs of blank lines.
fn split_blank_runs(text: &str) -> Option<Vec<RawParagraph>> {
    if !BLANK_RUN_RE.is_match(text) {
        return None;
    }

    let paragraphs: Vec<RawParagraph> = BLANK_RUN_RE
        .split(text.trim())
        .filter(|part| !part.trim().is_empty())
        .enumerate()
        .map(|(i, part)| {
            let mut para = RawParagraph::new(i as u32 + 1);
            for line in part.lines() {
                para.push_line(line);
            }
            para
        })
        .collect();

    if paragraphs.len() > 1 { Some(paragraphs) } else { None }
}

/// Merge a paragraph into the list, folding a duplicate of the previous
/// number into it so numbers stay unique keys.
fn push_merged(paragraphs: &mut Vec<RawParagraph>, para: RawParagraph) {
    if para.raw.is_empty() && para.number == 1 && paragraphs.is_empty() {
        return;
    }
    if let Some(last) = paragraphs.last_mut() {
        if last.number == para.number {
            for line in para.raw.lines() {
                last.push_line(line);
            }
            return;
        }
    }
    paragraphs.push(para);
}

/// Split a leading paragraph number off a line: `5 Texto`, `5. Texto` or a
/// bare `5`.
pub fn leading_number(line: &str) -> Option<(u32, String)> {
    BARE_NUMBER_RE
        .captures(line)
        .map(|c| (c[1].parse::<u32>().unwrap_or(0), String::new()))
        .or_else(|| {
            NUMBERED_LINE_RE
                .captures(line)
                .map(|c| (c[1].parse::<u32>().unwrap_or(0), c[2].to_string()))
        })
        .filter(|(number, _)| *number > 0)
}

/// Whether number-trailing content reads as a question line rather than
/// paragraph body.
pub fn is_question_content(rest: &str) -> bool {
    let rest = rest.trim();
    rest.contains('¿') || rest.ends_with('?')
}

/// Join lines into running text, repairing end-of-line hyphenation:
/// a fragment ending in `-` is glued to the next line without a space.
pub fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if out.ends_with('-') {
            out.pop();
            out.push_str(line);
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(line);
        }
    }
    out
}

/// Collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
