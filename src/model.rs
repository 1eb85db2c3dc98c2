//! Result data model.
//!
//! Field names mirror the stored analysis records, so anything persisted by
//! earlier deployments stays readable: `answer_time`, `is_final_question`,
//! `parenthesis_content`, `content_type`, `cumulative_time_seconds` and the
//! document-level totals all keep their wire spelling.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of a question's extracted parenthetical reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum ContentType {
    /// No parenthetical, or content that matched no classification rule.
    #[default]
    #[serde(rename = "")]
    None,
    /// A "see the illustration/box/photo" pointer.
    #[serde(rename = "image")]
    Image,
    /// A citation-shaped token such as `Juan 3:16`.
    #[serde(rename = "scripture")]
    Scripture,
}

/// A single discussion question.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Question {
    /// Visible question text, with the extracted parenthetical removed.
    pub text: String,

    /// Seconds allotted to answer this question.
    pub answer_time: u32,

    /// Whether the question belongs to the trailing review block.
    #[serde(default)]
    pub is_final_question: bool,

    /// Raw parenthetical content split off the text, if any.
    #[serde(default)]
    pub parenthesis_content: String,

    /// Classification of the parenthetical content.
    #[serde(default)]
    pub content_type: ContentType,
}

/// One segmented body paragraph with its timing and questions.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Paragraph {
    /// Paragraph number; unique key within the ordered sequence.
    pub number: u32,

    /// Display text (capped at 500 characters).
    pub text: String,

    /// Word count of the full paragraph text.
    pub word_count: usize,

    /// Seconds to read the paragraph at the configured pace.
    pub reading_time_seconds: f64,

    /// Questions attached to this paragraph.
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Reading time plus question time for this paragraph.
    pub total_time_seconds: f64,

    /// Running total up to and including this paragraph. Monotonically
    /// non-decreasing in document order.
    pub cumulative_time_seconds: f64,

    /// Full set of paragraph numbers a shared question marker addresses
    /// (e.g. a "1, 2." marker links paragraphs 1 and 2). Empty for
    /// paragraphs with only single-target questions.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub grouped_with: BTreeSet<u32>,
}

/// The complete analysis of one document.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct AnalysisResult {
    /// Source document name.
    pub filename: String,

    /// Word count across all body paragraphs.
    pub total_words: usize,

    /// Number of body paragraphs.
    pub total_paragraphs: usize,

    /// Number of questions, body and final combined.
    pub total_questions: usize,

    /// Sum of paragraph reading times.
    pub total_reading_time_seconds: f64,

    /// Sum of answer time across all questions.
    pub total_question_time_seconds: f64,

    /// Advertised session length. Always the fixed 60-minute slot, never a
    /// recomputed sum; the true subtotals stay in the two fields above.
    pub total_time_seconds: f64,

    /// Marks `total_time_seconds` as the fixed slot rather than a sum.
    pub fixed_duration: bool,

    /// Cumulative seconds at which the final-question block starts.
    pub final_questions_start_time: f64,

    /// Display title of the final-question block, when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_questions_title: Option<String>,

    /// Body paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,

    /// Trailing review questions in document order.
    #[serde(default)]
    pub final_questions: Vec<Question>,
}

impl AnalysisResult {
    /// Format the analysis as a readable outline for terminal display.
    pub fn format(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.filename));
        out.push_str(&format!(
            "  {} paragraphs, {} questions, {} words\n\n",
            self.total_paragraphs, self.total_questions, self.total_words
        ));

        for para in &self.paragraphs {
            out.push_str(&format!(
                "  {:>2}. [{} | at {}] {}\n",
                para.number,
                format_mmss(para.total_time_seconds),
                format_mmss(para.cumulative_time_seconds),
                preview(&para.text, 60)
            ));
            for q in &para.questions {
                out.push_str(&format!("        ? {}\n", preview(&q.text, 70)));
            }
        }

        if !self.final_questions.is_empty() {
            let title = self
                .final_questions_title
                .as_deref()
                .unwrap_or("Final questions");
            out.push_str(&format!(
                "\n  {} (from {})\n",
                title,
                format_mmss(self.final_questions_start_time)
            ));
            for q in &self.final_questions {
                out.push_str(&format!("        ? {}\n", preview(&q.text, 70)));
            }
        }

        out.push_str(&format!(
            "\n  reading {} + questions {} / session {}\n",
            format_mmss(self.total_reading_time_seconds),
            format_mmss(self.total_question_time_seconds),
            format_mmss(self.total_time_seconds)
        ));
        out
    }

    /// Serialize the result as pretty JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Format seconds as `mm:ss`.
pub fn format_mmss(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_wire_names() {
        assert_eq!(serde_json::to_string(&ContentType::None).unwrap(), r#""""#);
        assert_eq!(
            serde_json::to_string(&ContentType::Image).unwrap(),
            r#""image""#
        );
        assert_eq!(
            serde_json::to_string(&ContentType::Scripture).unwrap(),
            r#""scripture""#
        );
    }

    #[test]
    fn test_question_defaults_on_deserialize() {
        let q: Question = serde_json::from_str(r#"{"text": "¿Por qué?", "answer_time": 35}"#).unwrap();
        assert!(!q.is_final_question);
        assert_eq!(q.parenthesis_content, "");
        assert_eq!(q.content_type, ContentType::None);
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0.0), "00:00");
        assert_eq!(format_mmss(65.4), "01:05");
        assert_eq!(format_mmss(3600.0), "60:00");
    }

    #[test]
    fn test_grouped_with_omitted_when_empty() {
        let para = Paragraph {
            number: 1,
            text: "Texto".to_string(),
            word_count: 1,
            reading_time_seconds: 0.33,
            questions: Vec::new(),
            total_time_seconds: 0.33,
            cumulative_time_seconds: 0.33,
            grouped_with: BTreeSet::new(),
        };
        let json = serde_json::to_string(&para).unwrap();
        assert!(!json.contains("grouped_with"));
    }
}
