//! Analysis orchestrator.
//!
//! Wires the pipeline together: raw input → classified lines → paragraphs
//! and question clusters → annotated questions → final-section split →
//! timed result. Two paths exist: the span path, used when the extractor
//! provided layout data with a usable question-size tier, and the
//! plain-text path for everything else. Geometry-based final-section
//! detection is preferred on both paths; when it succeeds, the textual
//! banner scan is suppressed to avoid double counting.

use crate::annotate;
use crate::classify::{self, FontProfile, LineTag};
use crate::error::{AnalyzerError, Result};
use crate::extract::ExtractedDocument;
use crate::finals::{self, FinalSection, GeometrySplit};
use crate::model::{AnalysisResult, Question};
use crate::questions::{self, GroupedQuestion, MIN_ANCHORED_LEN, matches_ignore_list, split_clauses};
use crate::segment::{self, collapse_whitespace, join_lines};
use crate::timing::{self, ParagraphDraft, TimingOptions};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// The segmentation and timing engine. Holds only the timing tunables;
/// every run derives its own document-wide statistics, so concurrent
/// analyses share nothing mutable.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    timing: TimingOptions,
}

impl Analyzer {
    /// Create an analyzer with default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with explicit timing options.
    pub fn with_timing(timing: TimingOptions) -> Self {
        Self { timing }
    }

    /// Analyze one extracted document.
    ///
    /// Fatal only when there is no usable text at all; every structural
    /// ambiguity degrades through the per-stage fallbacks instead.
    pub fn analyze(&self, doc: &ExtractedDocument) -> Result<AnalysisResult> {
        if doc.is_empty() {
            return Err(AnalyzerError::EmptyDocument(doc.name.clone()));
        }

        let answer_time = self.timing.answer_time_seconds;
        let geometry = finals::locate_by_geometry(doc, answer_time);

        let profile = FontProfile::from_units(&doc.units);
        let (drafts, final_section) = match profile.filter(|p| p.has_question_tier()) {
            Some(p) => {
                debug!("using span path");
                self.analyze_spans(doc, &p, geometry)
            }
            None => {
                debug!("using plain-text path");
                self.analyze_text(doc, geometry)
            }
        };

        let result = timing::aggregate(&doc.name, drafts, final_section, &self.timing);
        info!(
            paragraphs = result.total_paragraphs,
            questions = result.total_questions,
            final_questions = result.final_questions.len(),
            "analysis complete"
        );
        Ok(result)
    }

    /// Plain-text path: line-based segmentation over the flat text blob.
    fn analyze_text(
        &self,
        doc: &ExtractedDocument,
        geometry: Option<GeometrySplit>,
    ) -> (Vec<ParagraphDraft>, Option<FinalSection>) {
        let answer_time = self.timing.answer_time_seconds;

        // With a geometry boundary and spans available, the body text is
        // rebuilt from the spans above the separator so final questions
        // are not re-segmented as body paragraphs.
        let body_text = match (&geometry, doc.has_layout()) {
            (Some(split), true) => doc
                .units
                .iter()
                .filter(|u| above_boundary(u.page_index, u.y_position, split))
                .map(|u| u.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            _ => doc.text.clone(),
        };

        let raw_paragraphs = segment::split_paragraphs(&body_text);

        // Geometry success suppresses the textual marker scan.
        let marker = if geometry.is_none() {
            finals::locate_by_marker(&raw_paragraphs, answer_time)
        } else {
            None
        };

        let mut drafts = Vec::with_capacity(raw_paragraphs.len());
        let mut grouped: Vec<GroupedQuestion> = Vec::new();

        for (index, paragraph) in raw_paragraphs.iter().enumerate() {
            let lines = paragraph.lines();
            let limit = match &marker {
                Some(m) if index > m.paragraph_index => 0,
                Some(m) if index == m.paragraph_index => m.line_index,
                _ => lines.len(),
            };
            let scanned = &lines[..limit];

            grouped.extend(questions::extract_grouped(scanned, answer_time));

            // Shared-marker lines are handled above; keep them away from
            // the per-number patterns and the sentence fallback.
            let own_lines: Vec<&str> = scanned
                .iter()
                .copied()
                .filter(|line| !questions::is_grouped_line(line))
                .collect();

            let mut qs = questions::extract_from_lines(paragraph.number, &own_lines, answer_time);
            if qs.is_empty() && !own_lines.is_empty() {
                // Tolerates sources that omit numeric anchors entirely.
                let scanned_text = collapse_whitespace(&join_lines(own_lines.iter().copied()));
                qs = questions::fallback_questions(&scanned_text, answer_time);
            }

            drafts.push(ParagraphDraft {
                number: paragraph.number,
                text: paragraph.display_text(),
                questions: qs,
                grouped_with: BTreeSet::new(),
            });
        }

        attach_grouped(&mut drafts, grouped);

        let final_section = geometry
            .map(|g| g.section)
            .or(marker.map(|m| m.section));
        (drafts, final_section)
    }

    /// Span path: classified tokens drive segmentation and question
    /// clustering; font-size tiers separate markers from body text.
    fn analyze_spans(
        &self,
        doc: &ExtractedDocument,
        profile: &FontProfile,
        geometry: Option<GeometrySplit>,
    ) -> (Vec<ParagraphDraft>, Option<FinalSection>) {
        let answer_time = self.timing.answer_time_seconds;

        let body_units: Vec<_> = match &geometry {
            Some(split) => doc
                .units
                .iter()
                .filter(|u| above_boundary(u.page_index, u.y_position, split))
                .cloned()
                .collect(),
            None => doc.units.clone(),
        };

        let tokens = classify::classify_all(&body_units, profile);

        let mut assembly = SpanAssembly::new(geometry.is_some());
        for token in &tokens {
            assembly.feed(token.unit.content.trim(), &token.tag);
        }
        let assembled = assembly.finish();

        let mut drafts: Vec<ParagraphDraft> = assembled
            .paragraphs
            .into_iter()
            .map(|(number, lines)| {
                let refs: Vec<&str> = lines.iter().map(|l| l.as_str()).collect();
                ParagraphDraft {
                    number,
                    text: collapse_whitespace(&join_lines(refs.iter().copied())),
                    questions: questions::extract_from_lines(number, &refs, answer_time),
                    grouped_with: BTreeSet::new(),
                }
            })
            .collect();

        let grouped = assembled
            .clusters
            .into_iter()
            .filter_map(|cluster| cluster_to_question(cluster, answer_time))
            .collect();
        attach_grouped(&mut drafts, grouped);

        let marker_section = if assembled.finals_title.is_some() || !assembled.final_lines.is_empty()
        {
            Some(FinalSection {
                title: assembled.finals_title,
                questions: finals::parse_final_items(&assembled.final_lines, answer_time),
            })
        } else {
            None
        };

        let final_section = geometry.map(|g| g.section).or(marker_section);
        (drafts, final_section)
    }
}

/// Convenience: load a document from a file and analyze it. `.json` files
/// are read as extractor span dumps, anything else as plain text.
pub fn analyze_file(path: &Path, timing: TimingOptions) -> Result<AnalysisResult> {
    if !path.exists() {
        return Err(AnalyzerError::DocumentNotFound(path.to_path_buf()));
    }
    let doc = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => ExtractedDocument::from_span_file(path)?,
        _ => ExtractedDocument::from_text_file(path)?,
    };
    Analyzer::with_timing(timing).analyze(&doc)
}

/// Collect the analyzable documents (`.txt` and `.json`) under a
/// directory, recursively, in stable path order.
pub fn collect_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AnalyzerError::InvalidInputDir(dir.to_path_buf()));
    }

    let mut documents: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("json")
            )
        })
        .collect();
    documents.sort();
    Ok(documents)
}

fn above_boundary(page_index: usize, y_position: f32, split: &GeometrySplit) -> bool {
    page_index < split.boundary_page
        || (page_index == split.boundary_page && y_position <= split.boundary_y)
}

/// A question-marker-headed group of question lines from the span path.
struct QuestionCluster {
    /// Paragraph numbers the marker addresses; the question attaches to
    /// the last one.
    targets: Vec<u32>,
    lines: Vec<String>,
}

/// Output of the span-path assembly pass.
struct Assembled {
    paragraphs: Vec<(u32, Vec<String>)>,
    clusters: Vec<QuestionCluster>,
    finals_title: Option<String>,
    final_lines: Vec<String>,
}

/// Incremental state for token-driven paragraph assembly on the span path.
struct SpanAssembly {
    paragraphs: Vec<(u32, Vec<String>)>,
    clusters: Vec<QuestionCluster>,
    finals_title: Option<String>,
    final_lines: Vec<String>,
    current: Option<(u32, Vec<String>)>,
    open_cluster: Option<QuestionCluster>,
    in_finals: bool,
    geometry_found: bool,
}

impl SpanAssembly {
    fn new(geometry_found: bool) -> Self {
        Self {
            paragraphs: Vec::new(),
            clusters: Vec::new(),
            finals_title: None,
            final_lines: Vec::new(),
            current: None,
            open_cluster: None,
            in_finals: false,
            geometry_found,
        }
    }

    fn feed(&mut self, text: &str, tag: &LineTag) {
        if text.is_empty() {
            return;
        }
        if self.in_finals {
            if !matches!(tag, LineTag::Ornament) {
                self.final_lines.push(text.to_string());
            }
            return;
        }

        match tag {
            LineTag::Ornament => {}
            LineTag::SectionMarkerText => {
                self.close_cluster();
                // The banner is a boundary only when geometry gave none.
                if !self.geometry_found && matches_ignore_list(text) {
                    self.in_finals = true;
                    self.finals_title = Some(text.to_string());
                }
            }
            LineTag::ParagraphMarker(number) => {
                self.close_cluster();
                self.open_paragraph(*number, String::new());
            }
            LineTag::ParagraphText => {
                self.close_cluster();
                // Inline markers still open paragraphs when the dedicated
                // marker spans are missing.
                match segment::leading_number(text) {
                    Some((number, rest)) if !segment::is_question_content(&rest) => {
                        self.open_paragraph(number, rest);
                    }
                    _ => self.push_body_line(text),
                }
            }
            LineTag::QuestionMarker(numbers) => {
                self.close_cluster();
                self.open_cluster = Some(QuestionCluster {
                    targets: numbers.clone(),
                    lines: Vec::new(),
                });
            }
            LineTag::QuestionText => match self.open_cluster.as_mut() {
                Some(cluster) => cluster.lines.push(text.to_string()),
                None => {
                    // Marker-less question line attaches to the current
                    // paragraph.
                    let target = self.current.as_ref().map(|(n, _)| *n).unwrap_or(1);
                    self.open_cluster = Some(QuestionCluster {
                        targets: vec![target],
                        lines: vec![text.to_string()],
                    });
                }
            },
        }
    }

    fn finish(mut self) -> Assembled {
        self.close_cluster();
        if let Some(done) = self.current.take() {
            self.paragraphs.push(done);
        }
        Assembled {
            paragraphs: self.paragraphs,
            clusters: self.clusters,
            finals_title: self.finals_title,
            final_lines: self.final_lines,
        }
    }

    fn open_paragraph(&mut self, number: u32, first_line: String) {
        if self.current.as_ref().is_some_and(|(n, _)| *n == number) {
            if !first_line.is_empty() {
                self.push_body_line(&first_line);
            }
            return;
        }
        if let Some(done) = self.current.take() {
            self.paragraphs.push(done);
        }
        let mut lines = Vec::new();
        if !first_line.is_empty() {
            lines.push(first_line);
        }
        self.current = Some((number, lines));
    }

    fn push_body_line(&mut self, line: &str) {
        self.current
            .get_or_insert_with(|| (1, Vec::new()))
            .1
            .push(line.to_string());
    }

    fn close_cluster(&mut self) {
        if let Some(cluster) = self.open_cluster.take() {
            if !cluster.lines.is_empty() {
                self.clusters.push(cluster);
            }
        }
    }
}

/// Parse a span-path cluster into one grouped question, joining wrapped
/// lines and splitting independent clauses.
fn cluster_to_question(cluster: QuestionCluster, answer_time: u32) -> Option<GroupedQuestion> {
    let text = collapse_whitespace(&join_lines(cluster.lines.iter().map(|l| l.as_str())));
    let questions: Vec<Question> = split_clauses(&text)
        .into_iter()
        .filter(|c| c.chars().count() > MIN_ANCHORED_LEN)
        .filter(|c| !matches_ignore_list(c))
        .map(|c| annotate::build_question(&c, answer_time, false))
        .collect();

    (!questions.is_empty()).then(|| GroupedQuestion {
        targets: cluster.targets,
        questions,
    })
}

/// Attach grouped questions to their target paragraph (the last number in
/// the marker set) and record the full set on every addressed paragraph.
fn attach_grouped(drafts: &mut [ParagraphDraft], grouped: Vec<GroupedQuestion>) {
    let index: HashMap<u32, usize> = drafts
        .iter()
        .enumerate()
        .map(|(i, d)| (d.number, i))
        .collect();

    for entry in grouped {
        let Some(&last) = entry.targets.last() else {
            continue;
        };
        let Some(&target_index) = index.get(&last) else {
            continue;
        };
        drafts[target_index].questions.extend(entry.questions);

        if entry.targets.len() > 1 {
            let group: BTreeSet<u32> = entry.targets.iter().copied().collect();
            for number in &entry.targets {
                if let Some(&i) = index.get(number) {
                    drafts[i].grouped_with.extend(group.iter().copied());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DrawPrimitive, TextUnit};

    fn analyzer() -> Analyzer {
        Analyzer::new()
    }

    #[test]
    fn test_empty_document_is_fatal() {
        let doc = ExtractedDocument::from_text("vacío", "   ");
        let err = analyzer().analyze(&doc).unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyDocument(_)));
    }

    #[test]
    fn test_plain_text_three_paragraphs() {
        let doc = ExtractedDocument::from_text(
            "articulo",
            "1 Primer párrafo del artículo de estudio.\n\
             2 Segundo párrafo con más contenido.\n\
             2 ¿Qué aprendemos del segundo párrafo?\n\
             3 Tercer párrafo de cierre.",
        );
        let result = analyzer().analyze(&doc).unwrap();

        assert_eq!(result.total_paragraphs, 3);
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.paragraphs[1].questions.len(), 1);
        assert!(result.final_questions.is_empty());
    }

    #[test]
    fn test_banner_marks_final_section_in_plain_text() {
        let doc = ExtractedDocument::from_text(
            "articulo",
            "1 Primer párrafo del artículo de estudio.\n\
             2 Segundo párrafo con más contenido.\n\
             2 ¿QUÉ RESPONDERÍAS?\n\
             1. ¿Primera pregunta final del repaso?\n\
             2. ¿Segunda pregunta final del repaso?",
        );
        let result = analyzer().analyze(&doc).unwrap();

        assert_eq!(result.final_questions.len(), 2);
        assert!(result.final_questions.iter().all(|q| q.is_final_question));
        // The banner itself is never a counted question, and paragraphs at
        // or after the banner keep no question entries.
        for para in &result.paragraphs {
            assert!(para.questions.is_empty());
        }
        assert_eq!(result.total_questions, 2);
    }

    #[test]
    fn test_grouped_marker_attaches_to_last_target() {
        let doc = ExtractedDocument::from_text(
            "articulo",
            "1 Primer párrafo del artículo.\n\
             1, 2. ¿Qué aprendemos de estos dos párrafos?\n\
             2 Segundo párrafo del artículo.\n\
             3 Tercer párrafo del artículo.",
        );
        let result = analyzer().analyze(&doc).unwrap();

        assert!(result.paragraphs[0].questions.is_empty());
        assert_eq!(result.paragraphs[1].questions.len(), 1);

        let expected: BTreeSet<u32> = [1, 2].into_iter().collect();
        assert_eq!(result.paragraphs[0].grouped_with, expected);
        assert_eq!(result.paragraphs[1].grouped_with, expected);
        assert!(result.paragraphs[2].grouped_with.is_empty());
    }

    fn span_document() -> ExtractedDocument {
        let units = vec![
            // Paragraph 1: marker + body.
            TextUnit::new("1", 6.5, 0, 90.0),
            TextUnit::new("Primer párrafo del artículo de estudio con", 10.0, 0, 100.0),
            TextUnit::new("texto suficiente para pesar el modo tipográfico.", 10.0, 0, 110.0),
            // Paragraph 2: marker + body, then its question cluster.
            TextUnit::new("2", 6.5, 0, 190.0),
            TextUnit::new("Segundo párrafo del artículo de estudio.", 10.0, 0, 200.0),
            TextUnit::new("2.", 8.5, 0, 210.0),
            TextUnit::new("¿Qué aprendemos del segundo párrafo?", 8.5, 0, 220.0),
            // Paragraph 3.
            TextUnit::new("3", 6.5, 0, 290.0),
            TextUnit::new("Tercer párrafo de cierre del artículo.", 10.0, 0, 300.0),
            // Final section below the separator stroke.
            TextUnit::new("¿QUÉ RESPONDERÍAS?", 11.0, 0, 560.0).bold(),
            TextUnit::new("1. ¿Primera pregunta final del repaso?", 8.5, 0, 580.0),
            TextUnit::new("2. ¿Segunda pregunta final del repaso?", 8.5, 0, 600.0),
        ];
        let mut doc = ExtractedDocument::from_units("articulo", units);
        doc.drawings = vec![DrawPrimitive {
            page_index: 0,
            x: 50.0,
            y: 540.0,
            width: 500.0,
            height: 0.5,
        }];
        doc
    }

    #[test]
    fn test_span_path_with_geometry_final_section() {
        let result = analyzer().analyze(&span_document()).unwrap();

        assert_eq!(result.total_paragraphs, 3);
        assert_eq!(result.final_questions.len(), 2);
        assert_eq!(result.total_questions, 3);
        assert_eq!(
            result.final_questions_title.as_deref(),
            Some("¿QUÉ RESPONDERÍAS?")
        );

        // One inline question on paragraph 2, none elsewhere.
        assert_eq!(result.paragraphs[1].questions.len(), 1);
        assert!(result.paragraphs[0].questions.is_empty());
        assert!(result.paragraphs[2].questions.is_empty());

        // The review block starts exactly where paragraph 3 ends.
        assert_eq!(
            result.final_questions_start_time,
            result.paragraphs[2].cumulative_time_seconds
        );
    }

    #[test]
    fn test_span_path_grouped_marker() {
        let units = vec![
            TextUnit::new("1", 6.5, 0, 90.0),
            TextUnit::new("Primer párrafo del artículo de estudio con peso.", 10.0, 0, 100.0),
            TextUnit::new("2", 6.5, 0, 190.0),
            TextUnit::new("Segundo párrafo del artículo de estudio.", 10.0, 0, 200.0),
            TextUnit::new("1, 2.", 8.5, 0, 210.0),
            TextUnit::new("¿Qué aprendemos de los dos párrafos?", 8.5, 0, 220.0),
        ];
        let doc = ExtractedDocument::from_units("articulo", units);
        let result = analyzer().analyze(&doc).unwrap();

        assert!(result.paragraphs[0].questions.is_empty());
        assert_eq!(result.paragraphs[1].questions.len(), 1);
        let expected: BTreeSet<u32> = [1, 2].into_iter().collect();
        assert_eq!(result.paragraphs[0].grouped_with, expected);
        assert_eq!(result.paragraphs[1].grouped_with, expected);
    }

    #[test]
    fn test_span_path_banner_without_geometry() {
        let units = vec![
            TextUnit::new("1", 6.5, 0, 90.0),
            TextUnit::new("Primer párrafo del artículo de estudio con peso.", 10.0, 0, 100.0),
            TextUnit::new("2", 6.5, 0, 190.0),
            TextUnit::new("Segundo párrafo del artículo de estudio aquí.", 10.0, 0, 200.0),
            TextUnit::new("¿QUÉ RESPONDERÍAS?", 12.0, 0, 500.0),
            TextUnit::new("1. ¿Primera pregunta final del repaso?", 8.5, 0, 520.0),
            TextUnit::new("2. ¿Segunda pregunta final del repaso?", 8.5, 0, 540.0),
        ];
        let doc = ExtractedDocument::from_units("articulo", units);
        let result = analyzer().analyze(&doc).unwrap();

        assert_eq!(result.total_paragraphs, 2);
        assert_eq!(result.final_questions.len(), 2);
        assert!(result.final_questions.iter().all(|q| q.is_final_question));
        assert_eq!(
            result.final_questions_title.as_deref(),
            Some("¿QUÉ RESPONDERÍAS?")
        );
    }

    #[test]
    fn test_cumulative_times_non_decreasing() {
        let doc = ExtractedDocument::from_text(
            "articulo",
            "1 Primer párrafo del artículo.\n\
             2 Segundo párrafo algo más largo que el anterior.\n\
             3 Tercer párrafo de cierre con todavía más palabras dentro.",
        );
        let result = analyzer().analyze(&doc).unwrap();

        let mut previous = 0.0;
        for para in &result.paragraphs {
            assert!(para.cumulative_time_seconds >= previous);
            previous = para.cumulative_time_seconds;
        }
    }

    #[test]
    fn test_collect_documents_filters_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "1 Texto.").unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "").unwrap();

        let docs = collect_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("json")
            )
        }));
    }

    #[test]
    fn test_collect_documents_rejects_missing_dir() {
        let err = collect_documents(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidInputDir(_)));
    }

    #[test]
    fn test_analyze_file_missing() {
        let err = analyze_file(Path::new("/nonexistent/articulo.txt"), TimingOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::DocumentNotFound(_)));
    }
}
