//! Timing aggregator.
//!
//! Walks the segmented paragraphs and final questions in document order,
//! computing per-unit and cumulative durations and the document totals.
//!
//! The advertised `total_time_seconds` is always [`SESSION_SECONDS`]: the
//! result models a fixed meeting slot, not the sum of its parts. The true
//! sums stay available in the reading/question subtotal fields.

use crate::finals::FinalSection;
use crate::model::{AnalysisResult, Paragraph, Question};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Fixed session length advertised on every result.
pub const SESSION_SECONDS: f64 = 3600.0;

/// Default reading pace.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 180;

/// Default seconds allotted per question.
pub const DEFAULT_ANSWER_TIME_SECONDS: u32 = 35;

/// Stored paragraph text is capped at this many characters.
pub const PARAGRAPH_TEXT_CAP: usize = 500;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid regex"));

/// The two tunable inputs crossing the analyzer boundary. Range checking
/// belongs to the boundary layer; the core accepts any positive values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingOptions {
    pub words_per_minute: u32,
    pub answer_time_seconds: u32,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            answer_time_seconds: DEFAULT_ANSWER_TIME_SECONDS,
        }
    }
}

/// A paragraph ready for timing: segmentation and question extraction are
/// done, durations are not yet assigned.
#[derive(Debug, Clone)]
pub struct ParagraphDraft {
    pub number: u32,
    /// Full display text; word counting runs on this before capping.
    pub text: String,
    pub questions: Vec<Question>,
    pub grouped_with: BTreeSet<u32>,
}

/// Count word-boundary tokens.
pub fn count_words(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Seconds to read `word_count` words at the given pace.
pub fn reading_time_seconds(word_count: usize, words_per_minute: u32) -> f64 {
    word_count as f64 / words_per_minute as f64 * 60.0
}

/// Round to two decimal places, matching the stored record precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Assemble the final result from timed paragraphs and the final section.
pub fn aggregate(
    filename: &str,
    drafts: Vec<ParagraphDraft>,
    final_section: Option<FinalSection>,
    options: &TimingOptions,
) -> AnalysisResult {
    let answer_time = options.answer_time_seconds as f64;

    let mut paragraphs = Vec::with_capacity(drafts.len());
    let mut total_words = 0usize;
    let mut total_questions = 0usize;
    let mut total_reading_time = 0.0;
    let mut total_question_time = 0.0;
    let mut cumulative = 0.0;

    for draft in drafts {
        let word_count = count_words(&draft.text);
        let reading_time = reading_time_seconds(word_count, options.words_per_minute);
        let question_time = draft.questions.len() as f64 * answer_time;
        // Stored times carry two decimals; the cumulative column must equal
        // the running sum of the stored totals, so round before accumulating.
        let total_time = round2(reading_time + question_time);
        cumulative += total_time;

        total_words += word_count;
        total_questions += draft.questions.len();
        total_reading_time += reading_time;
        total_question_time += question_time;

        paragraphs.push(Paragraph {
            number: draft.number,
            text: cap_text(&draft.text),
            word_count,
            reading_time_seconds: round2(reading_time),
            questions: draft.questions,
            total_time_seconds: total_time,
            cumulative_time_seconds: round2(cumulative),
            grouped_with: draft.grouped_with,
        });
    }

    // The review block starts right after the last body paragraph.
    let final_questions_start_time = round2(cumulative);

    let (final_questions_title, final_questions) = match final_section {
        Some(section) => (section.title, section.questions),
        None => (None, Vec::new()),
    };

    total_questions += final_questions.len();
    total_question_time += final_questions.len() as f64 * answer_time;

    AnalysisResult {
        filename: filename.to_string(),
        total_words,
        total_paragraphs: paragraphs.len(),
        total_questions,
        total_reading_time_seconds: round2(total_reading_time),
        total_question_time_seconds: round2(total_question_time),
        total_time_seconds: SESSION_SECONDS,
        fixed_duration: true,
        final_questions_start_time,
        final_questions_title,
        paragraphs,
        final_questions,
    }
}

fn cap_text(text: &str) -> String {
    if text.chars().count() <= PARAGRAPH_TEXT_CAP {
        text.to_string()
    } else {
        let capped: String = text.chars().take(PARAGRAPH_TEXT_CAP).collect();
        format!("{}...", capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::build_question;

    fn draft(number: u32, text: &str, questions: Vec<Question>) -> ParagraphDraft {
        ParagraphDraft {
            number,
            text: text.to_string(),
            questions,
            grouped_with: BTreeSet::new(),
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("Este es un párrafo de seis"), 6);
        assert_eq!(count_words("número 3:16 cuenta tres"), 5);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_faster_pace_reads_sooner() {
        let words = 300;
        assert!(reading_time_seconds(words, 150) > reading_time_seconds(words, 180));
        assert!(reading_time_seconds(words, 180) > reading_time_seconds(words, 210));
    }

    #[test]
    fn test_reading_time_at_default_pace() {
        // 180 wpm is exactly 3 words per second.
        assert_eq!(reading_time_seconds(180, 180), 60.0);
        assert_eq!(reading_time_seconds(90, 180), 30.0);
    }

    #[test]
    fn test_question_time_exact_product() {
        let options = TimingOptions {
            words_per_minute: 180,
            answer_time_seconds: 35,
        };
        let questions = vec![
            build_question("¿Primera pregunta de prueba?", 35, false),
            build_question("¿Segunda pregunta de prueba?", 35, false),
            build_question("¿Tercera pregunta de prueba?", 35, false),
        ];
        let result = aggregate("doc", vec![draft(1, "tres palabras aquí", questions)], None, &options);
        assert_eq!(result.total_question_time_seconds, 3.0 * 35.0);
    }

    #[test]
    fn test_cumulative_monotonic_and_running_sum() {
        let options = TimingOptions::default();
        let drafts = vec![
            draft(1, &"palabra ".repeat(90), vec![]),
            draft(2, &"palabra ".repeat(45), vec![build_question("¿Una pregunta de ejemplo?", 35, false)]),
            draft(3, &"palabra ".repeat(30), vec![]),
        ];
        let result = aggregate("doc", drafts, None, &options);

        let mut running = 0.0;
        let mut previous = 0.0;
        for para in &result.paragraphs {
            running = round2(running + para.total_time_seconds);
            assert!(para.cumulative_time_seconds >= previous);
            assert_eq!(para.cumulative_time_seconds, running);
            previous = para.cumulative_time_seconds;
        }
    }

    #[test]
    fn test_cumulative_equals_sum_of_stored_totals() {
        let options = TimingOptions::default();
        // One word at 180 wpm rounds to 0.33 s; the stored cumulative must
        // be the sum of the stored totals, not of the unrounded times.
        let drafts = vec![draft(1, "palabra", vec![]), draft(2, "palabra", vec![])];
        let result = aggregate("doc", drafts, None, &options);

        assert_eq!(result.paragraphs[0].total_time_seconds, 0.33);
        assert_eq!(result.paragraphs[1].total_time_seconds, 0.33);
        assert_eq!(result.paragraphs[1].cumulative_time_seconds, 0.66);
    }

    #[test]
    fn test_total_time_is_fixed_session() {
        let options = TimingOptions::default();
        let result = aggregate("doc", vec![draft(1, "un texto corto", vec![])], None, &options);
        assert_eq!(result.total_time_seconds, SESSION_SECONDS);
        assert!(result.fixed_duration);
        // The true sum stays in the subtotals, not in the advertised total.
        assert!(result.total_reading_time_seconds < SESSION_SECONDS);
    }

    #[test]
    fn test_final_questions_start_after_last_paragraph() {
        let options = TimingOptions::default();
        let section = FinalSection {
            title: Some("¿QUÉ RESPONDERÍAS?".to_string()),
            questions: vec![
                build_question("¿Primera final de repaso?", 35, true),
                build_question("¿Segunda final de repaso?", 35, true),
            ],
        };
        let drafts = vec![
            draft(1, &"palabra ".repeat(60), vec![]),
            draft(2, &"palabra ".repeat(60), vec![]),
        ];
        let result = aggregate("doc", drafts, Some(section), &options);

        assert_eq!(
            result.final_questions_start_time,
            result.paragraphs.last().unwrap().cumulative_time_seconds
        );
        assert_eq!(result.final_questions.len(), 2);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.total_question_time_seconds, 70.0);
    }

    #[test]
    fn test_text_cap() {
        let options = TimingOptions::default();
        let long = "palabra ".repeat(200);
        let result = aggregate("doc", vec![draft(1, &long, vec![])], None, &options);
        let stored = &result.paragraphs[0].text;
        assert!(stored.ends_with("..."));
        assert_eq!(stored.chars().count(), PARAGRAPH_TEXT_CAP + 3);
        // Word count reflects the full text, not the capped copy.
        assert_eq!(result.paragraphs[0].word_count, 200);
    }
}
