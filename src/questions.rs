//! Question extractor.
//!
//! Recognizes question lines inside a paragraph's raw text. Recognition is
//! keyed to the paragraph's own number and tries three line patterns in
//! strict priority order; the tiers live in a table so adding a pattern is
//! data, not control flow. A reserved rhetorical banner is filtered out by
//! an ignore list — it marks the final-section boundary and is never a
//! countable question.

use crate::annotate;
use crate::model::Question;
use once_cell::sync::Lazy;
use regex::Regex;

/// The reserved banner phrase. Never counted as a question; signals the
/// start of the final review block in marker-based detection.
pub const BANNER_PHRASE: &str = "¿QUÉ RESPONDERÍAS?";

/// Rhetorical lines suppressed from question counting.
pub const IGNORED_QUESTIONS: &[&str] = &[BANNER_PHRASE];

/// Minimum length of an anchored question after trimming.
pub const MIN_ANCHORED_LEN: usize = 5;

/// Minimum length of a fallback-extracted question.
pub const MIN_FALLBACK_LEN: usize = 10;

/// Per-number line patterns, tried in order; `{n}` is replaced with the
/// paragraph number. First match wins per line.
const LINE_PATTERN_TIERS: &[&str] = &[
    r"^\s*{n}\.\s*(.+\?)\s*$",
    r"^\s*{n}\s+(.+\?)\s*$",
    r"^\s*{n}[)\-:]\s*(.+\?)\s*$",
];

/// A shared question marker inside running text: `1, 2. ¿Pregunta?`.
static GROUPED_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2}(?:\s*,\s*\d{1,2})+)\.\s*(.+\?)\s*$").expect("valid regex")
});

/// An interrogation-bounded clause with an optional trailing parenthetical.
static CLAUSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"¿[^¿?]*\?(?:\s*\([^)]*\))?").expect("valid regex"));

/// A sentence ending in `?` for sources without `¿` punctuation.
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?\n¿]+\?").expect("valid regex"));

/// Extract questions anchored to the paragraph number from raw lines.
pub fn extract_from_lines(number: u32, lines: &[&str], answer_time: u32) -> Vec<Question> {
    let patterns = patterns_for(number);
    let mut questions = Vec::new();

    for line in lines {
        let captured = patterns
            .iter()
            .find_map(|re| re.captures(line).map(|c| c[1].trim().to_string()));

        let Some(rest) = captured else { continue };
        if rest.chars().count() <= MIN_ANCHORED_LEN {
            continue;
        }

        for clause in split_clauses(&rest) {
            if matches_ignore_list(&clause) {
                continue;
            }
            questions.push(annotate::build_question(&clause, answer_time, false));
        }
    }

    questions
}

/// Fallback for sources without numeric anchors: any interrogation-bounded
/// span, or failing that any sentence ending in `?`.
pub fn fallback_questions(text: &str, answer_time: u32) -> Vec<Question> {
    let mut candidates: Vec<String> = CLAUSE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    if candidates.is_empty() {
        candidates = SENTENCE_RE
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .collect();
    }

    candidates
        .into_iter()
        .filter(|c| c.chars().count() > MIN_FALLBACK_LEN)
        .filter(|c| !matches_ignore_list(c))
        .map(|c| annotate::build_question(&c, answer_time, false))
        .collect()
}

/// A shared marker line addressing several paragraphs, with its questions.
#[derive(Debug, Clone)]
pub struct GroupedQuestion {
    /// All paragraph numbers the marker addresses, in written order.
    pub targets: Vec<u32>,
    /// One entry per interrogative clause under the marker.
    pub questions: Vec<Question>,
}

/// Whether a line carries a shared `1, 2.` question marker.
pub fn is_grouped_line(line: &str) -> bool {
    GROUPED_LINE_RE.is_match(line)
}

/// Scan raw lines for shared `1, 2.` question markers.
pub fn extract_grouped(lines: &[&str], answer_time: u32) -> Vec<GroupedQuestion> {
    let mut grouped = Vec::new();
    for line in lines {
        let Some(caps) = GROUPED_LINE_RE.captures(line) else {
            continue;
        };
        let targets: Vec<u32> = caps[1]
            .split(',')
            .filter_map(|part| part.trim().parse::<u32>().ok())
            .collect();
        if targets.len() < 2 {
            continue;
        }
        let questions: Vec<Question> = split_clauses(caps[2].trim())
            .into_iter()
            .filter(|clause| !matches_ignore_list(clause))
            .map(|clause| annotate::build_question(&clause, answer_time, false))
            .collect();
        if questions.is_empty() {
            continue;
        }
        grouped.push(GroupedQuestion { targets, questions });
    }
    grouped
}

/// Split a captured line into independent interrogative clauses. A line
/// with two `¿…?` pairs yields two questions; anything else stays whole.
/// Trailing parentheticals stay attached to their clause.
pub fn split_clauses(text: &str) -> Vec<String> {
    let clauses: Vec<String> = CLAUSE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect();
    if clauses.len() >= 2 {
        clauses
    } else {
        vec![text.trim().to_string()]
    }
}

/// Case-insensitive, punctuation-normalized, substring-symmetric match
/// against the ignore list.
pub fn matches_ignore_list(text: &str) -> bool {
    let norm = normalize(text);
    if norm.is_empty() {
        return false;
    }
    IGNORED_QUESTIONS.iter().any(|entry| {
        let entry = normalize(entry);
        norm.contains(&entry) || entry.contains(&norm)
    })
}

fn normalize(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_uppercase();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn patterns_for(number: u32) -> Vec<Regex> {
    LINE_PATTERN_TIERS
        .iter()
        .map(|tier| {
            let pattern = tier.replace("{n}", &number.to_string());
            Regex::new(&pattern).expect("valid tier pattern")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentType;

    #[test]
    fn test_dot_anchor() {
        let qs = extract_from_lines(5, &["5. ¿Qué nos enseña este relato?"], 35);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "¿Qué nos enseña este relato?");
        assert_eq!(qs[0].answer_time, 35);
        assert!(!qs[0].is_final_question);
    }

    #[test]
    fn test_space_anchor() {
        let qs = extract_from_lines(2, &["2 ¿Cuál es la velocidad de lectura utilizada?"], 35);
        assert_eq!(qs.len(), 1);
    }

    #[test]
    fn test_bracket_anchors() {
        for line in ["3) ¿Por qué oramos cada día?", "3- ¿Por qué oramos cada día?", "3: ¿Por qué oramos cada día?"] {
            let qs = extract_from_lines(3, &[line], 35);
            assert_eq!(qs.len(), 1, "failed for {line}");
        }
    }

    #[test]
    fn test_wrong_number_no_match() {
        let qs = extract_from_lines(4, &["5. ¿Qué nos enseña este relato?"], 35);
        assert!(qs.is_empty());
    }

    #[test]
    fn test_short_capture_rejected() {
        let qs = extract_from_lines(1, &["1. ¿Ya?"], 35);
        assert!(qs.is_empty());
    }

    #[test]
    fn test_two_clauses_split() {
        let qs = extract_from_lines(
            3,
            &["3 ¿Esta es una pregunta final importante? ¿Otra pregunta antes de la sección?"],
            35,
        );
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].text, "¿Esta es una pregunta final importante?");
    }

    #[test]
    fn test_clause_keeps_trailing_parenthetical() {
        let qs = extract_from_lines(
            2,
            &["2 ¿Qué dice la Biblia? (Juan 3:16) ¿Cómo lo aplicamos nosotros?"],
            35,
        );
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].parenthesis_content, "Juan 3:16");
        assert_eq!(qs[0].content_type, ContentType::Scripture);
        assert_eq!(qs[1].parenthesis_content, "");
    }

    #[test]
    fn test_banner_never_counted() {
        let qs = extract_from_lines(4, &["4 ¿QUÉ RESPONDERÍAS?"], 35);
        assert!(qs.is_empty());
    }

    #[test]
    fn test_ignore_list_symmetric_and_normalized() {
        assert!(matches_ignore_list("¿QUÉ RESPONDERÍAS?"));
        assert!(matches_ignore_list("qué responderías"));
        assert!(matches_ignore_list("  ¿QUÉ   RESPONDERÍAS?...  "));
        assert!(!matches_ignore_list("¿Qué aprendemos?"));
    }

    #[test]
    fn test_fallback_interrogation_pairs() {
        let qs = fallback_questions(
            "Texto sin anclas. ¿Cómo mostramos humildad cada día? Más texto.",
            35,
        );
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].text, "¿Cómo mostramos humildad cada día?");
    }

    #[test]
    fn test_fallback_bare_question_mark() {
        let qs = fallback_questions("Texto plano. Como mostramos humildad cada dia? Fin.", 35);
        assert_eq!(qs.len(), 1);
        assert!(qs[0].text.ends_with('?'));
    }

    #[test]
    fn test_fallback_filters_banner_and_short() {
        let qs = fallback_questions("¿QUÉ RESPONDERÍAS? ¿Ya vimos?", 35);
        assert!(qs.is_empty());
    }

    #[test]
    fn test_grouped_marker() {
        let grouped = extract_grouped(&["1, 2. ¿Qué aprendemos de los dos párrafos?"], 35);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].targets, vec![1, 2]);
        assert_eq!(grouped[0].questions.len(), 1);
        assert_eq!(grouped[0].questions[0].text, "¿Qué aprendemos de los dos párrafos?");
    }

    #[test]
    fn test_is_grouped_line() {
        assert!(is_grouped_line("1, 2. ¿Qué aprendemos de los dos párrafos?"));
        assert!(!is_grouped_line("2. ¿Qué aprendemos del párrafo?"));
    }

    #[test]
    fn test_single_number_not_grouped() {
        let grouped = extract_grouped(&["2. ¿Qué aprendemos del párrafo?"], 35);
        assert!(grouped.is_empty());
    }
}
