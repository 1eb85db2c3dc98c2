//! Final-section locator.
//!
//! Finds the boundary between body paragraphs and the trailing review
//! block. The preferred evidence is page geometry: the last wide, thin
//! horizontal stroke low enough on a page. When no qualifying stroke
//! exists the locator falls back to the textual banner phrase. Geometry
//! failure is logged and degrades; it never fails the analysis.

use crate::annotate;
use crate::classify::is_upper_banner;
use crate::extract::ExtractedDocument;
use crate::model::Question;
use crate::questions::matches_ignore_list;
use crate::segment::{RawParagraph, join_lines};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Minimum stroke width (points) to qualify as a section separator.
pub const WIDE_LINE_MIN_WIDTH: f32 = 150.0;

/// Maximum stroke thickness for a "horizontal line" primitive.
pub const MAX_STROKE_THICKNESS: f32 = 2.5;

/// Separator strokes must sit below this fraction of the page height.
pub const MIN_Y_PAGE_FRACTION: f32 = 0.30;

/// Maximum length of a bullet-style final item.
pub const MAX_BULLET_LEN: usize = 150;

/// Keywords that terminate final-question scanning for a page.
pub const SONG_KEYWORDS: &[&str] = &["CANCIÓN", "Canción", "canción"];

/// A numbered final question: `12. ¿Pregunta?`.
static FINAL_NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2})\.\s*(.+\?)\s*$").expect("valid regex"));

/// Start of a numbered final item, used to group wrapped lines.
static FINAL_NUM_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,2}\.").expect("valid regex"));

/// The trailing review block.
#[derive(Debug, Clone, Default)]
pub struct FinalSection {
    /// Display title captured from the section heading, if any.
    pub title: Option<String>,
    /// Review questions in document order.
    pub questions: Vec<Question>,
}

/// Geometry-based boundary: the separator stroke plus the section below it.
#[derive(Debug, Clone)]
pub struct GeometrySplit {
    /// Page holding the separator stroke.
    pub boundary_page: usize,
    /// Vertical position of the stroke on that page.
    pub boundary_y: f32,
    pub section: FinalSection,
}

/// Marker-based boundary: the banner line inside the segmented paragraphs.
#[derive(Debug, Clone)]
pub struct MarkerSplit {
    /// Index of the paragraph holding the banner line.
    pub paragraph_index: usize,
    /// Line index of the banner inside that paragraph.
    pub line_index: usize,
    pub section: FinalSection,
}

/// Preferred path: locate the section below the last qualifying separator
/// stroke. Returns `None` when geometry gives no usable boundary.
pub fn locate_by_geometry(doc: &ExtractedDocument, answer_time: u32) -> Option<GeometrySplit> {
    if doc.drawings.is_empty() || doc.units.is_empty() {
        return None;
    }

    let stroke = doc
        .drawings
        .iter()
        .filter(|d| {
            d.width > WIDE_LINE_MIN_WIDTH
                && d.height.abs() <= MAX_STROKE_THICKNESS
                && d.y > MIN_Y_PAGE_FRACTION * doc.page_height(d.page_index)
        })
        .next_back();

    let Some(stroke) = stroke else {
        warn!(
            drawings = doc.drawings.len(),
            "no qualifying separator stroke; falling back to textual marker"
        );
        return None;
    };

    let mut section = FinalSection::default();
    let mut lines: Vec<String> = Vec::new();
    let mut stopped_pages: HashSet<usize> = HashSet::new();

    for unit in &doc.units {
        let below = unit.page_index > stroke.page_index
            || (unit.page_index == stroke.page_index && unit.y_position > stroke.y);
        if !below || stopped_pages.contains(&unit.page_index) {
            continue;
        }

        let text = unit.content.trim();
        if text.is_empty() {
            continue;
        }

        if SONG_KEYWORDS.iter().any(|k| text.starts_with(k)) {
            stopped_pages.insert(unit.page_index);
            continue;
        }

        // The section's display title is the first bold question span;
        // it is excluded from the question list.
        if section.title.is_none() && unit.is_bold && text.contains('?') {
            section.title = Some(text.to_string());
            continue;
        }

        if is_upper_banner(text) {
            continue;
        }

        lines.push(text.to_string());
    }

    section.questions = parse_final_items(&lines, answer_time);
    if section.questions.is_empty() {
        debug!("separator stroke found but no final questions below it");
        return None;
    }

    Some(GeometrySplit {
        boundary_page: stroke.page_index,
        boundary_y: stroke.y,
        section,
    })
}

/// Fallback path: locate the banner phrase inside the segmented paragraphs
/// and treat everything after its line as the final section.
pub fn locate_by_marker(paragraphs: &[RawParagraph], answer_time: u32) -> Option<MarkerSplit> {
    let (paragraph_index, line_index, banner) = paragraphs.iter().enumerate().find_map(|(pi, para)| {
        para.lines()
            .iter()
            .position(|line| matches_ignore_list(line))
            .map(|li| (pi, li, para.lines()[li].trim().to_string()))
    })?;

    let mut lines: Vec<String> = Vec::new();
    for (pi, para) in paragraphs.iter().enumerate().skip(paragraph_index) {
        for (li, line) in para.lines().iter().enumerate() {
            if pi == paragraph_index && li <= line_index {
                continue;
            }
            lines.push(line.trim().to_string());
        }
    }

    let section = FinalSection {
        title: Some(banner),
        questions: parse_final_items(&lines, answer_time),
    };

    Some(MarkerSplit {
        paragraph_index,
        line_index,
        section,
    })
}

/// Parse candidate lines into final questions: numbered items preferred,
/// bullet-style short lines accepted only when no numbered item exists.
pub fn parse_final_items(lines: &[String], answer_time: u32) -> Vec<Question> {
    let clusters = cluster_wrapped_lines(lines);

    let numbered: Vec<Question> = clusters
        .iter()
        .filter_map(|cluster| {
            let caps = FINAL_NUMBERED_RE.captures(cluster)?;
            let text = caps[2].trim().to_string();
            (!matches_ignore_list(&text))
                .then(|| annotate::build_question(&text, answer_time, true))
        })
        .collect();

    if !numbered.is_empty() {
        return numbered;
    }

    // Bullet items are single lines; wrapped-line clustering only applies
    // to numbered questions.
    lines
        .iter()
        .filter(|line| looks_like_bullet_item(line))
        .filter(|line| !matches_ignore_list(line))
        .map(|line| annotate::build_question(line.trim(), answer_time, true))
        .collect()
}

/// Group wrapped lines: a new numbered item starts a cluster, every other
/// line continues the previous one. Hyphenation is repaired on join.
fn cluster_wrapped_lines(lines: &[String]) -> Vec<String> {
    let mut clusters: Vec<Vec<&str>> = Vec::new();
    for line in lines {
        if FINAL_NUM_START_RE.is_match(line) || clusters.is_empty() {
            clusters.push(vec![line.as_str()]);
        } else {
            clusters.last_mut().expect("non-empty").push(line.as_str());
        }
    }
    clusters
        .into_iter()
        .map(|cluster| join_lines(cluster.into_iter()))
        .filter(|c| !c.is_empty())
        .collect()
}

/// A short non-numeric line that reads as a question or a capitalized
/// topic phrase.
fn looks_like_bullet_item(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.chars().count() >= MAX_BULLET_LEN {
        return false;
    }
    if line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    if line.contains('?') {
        return true;
    }
    let capitalized = line
        .chars()
        .find(|c| c.is_alphabetic())
        .is_some_and(|c| c.is_uppercase());
    capitalized && !line.ends_with('.')
}
