//! Input contract with the extraction collaborator.
//!
//! The analyzer never decodes PDFs itself. An upstream extractor hands it
//! one of three things, in decreasing order of precision:
//!
//! 1. an ordered sequence of [`TextUnit`] spans with font size and page
//!    position,
//! 2. page-level vector primitives ([`DrawPrimitive`]) used only for
//!    final-section detection,
//! 3. a flat text blob.
//!
//! All three travel together in an [`ExtractedDocument`]. The analyzer must
//! work with the text blob alone and improves when spans and primitives are
//! available.

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page height (in points) assumed when the extractor reports none.
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// A positioned text span produced by the extraction collaborator.
///
/// Units are ordered by natural reading order: page first, then vertical
/// position. [`ExtractedDocument`] re-sorts on construction so downstream
/// stages can rely on that ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    /// Text content of the span.
    pub content: String,
    /// Font size in points.
    pub font_size: f32,
    /// 0-indexed page the span appears on.
    pub page_index: usize,
    /// Vertical position on the page (top-down).
    pub y_position: f32,
    /// Whether the span is rendered bold.
    #[serde(default)]
    pub is_bold: bool,
}

impl TextUnit {
    /// Create a span with the given layout data.
    pub fn new(content: impl Into<String>, font_size: f32, page_index: usize, y_position: f32) -> Self {
        Self {
            content: content.into(),
            font_size,
            page_index,
            y_position,
            is_bold: false,
        }
    }

    /// Mark the span as bold.
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }
}

/// A vector-graphics primitive: a stroked segment or filled rectangle.
///
/// Only used by the final-section locator, which looks for wide, thin
/// horizontal strokes acting as section separators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DrawPrimitive {
    /// 0-indexed page the primitive appears on.
    pub page_index: usize,
    /// Left edge.
    pub x: f32,
    /// Vertical position (top-down).
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent (near zero for a horizontal stroke).
    pub height: f32,
}

/// Everything the upstream extractor produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Document name (usually the source file stem).
    pub name: String,
    /// Flat extracted text. May be empty when only spans were produced.
    #[serde(default)]
    pub text: String,
    /// Positioned text spans, if the extractor provides layout data.
    #[serde(default)]
    pub units: Vec<TextUnit>,
    /// Vector primitives, if the extractor provides them.
    #[serde(default)]
    pub drawings: Vec<DrawPrimitive>,
    /// Per-page heights; pages beyond the list assume [`DEFAULT_PAGE_HEIGHT`].
    #[serde(default)]
    pub page_heights: Vec<f32>,
}

impl ExtractedDocument {
    /// Create a document from a flat text blob.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            units: Vec::new(),
            drawings: Vec::new(),
            page_heights: Vec::new(),
        }
    }

    /// Create a document from positioned spans (text blob synthesized).
    pub fn from_units(name: impl Into<String>, units: Vec<TextUnit>) -> Self {
        let mut doc = Self {
            name: name.into(),
            text: String::new(),
            units,
            drawings: Vec::new(),
            page_heights: Vec::new(),
        };
        doc.normalize();
        doc
    }

    /// Load a plain-text file as a span-less document.
    pub fn from_text_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalyzerError::io(path, e))?;
        Ok(Self::from_text(file_stem(path), text))
    }

    /// Load a span dump (JSON) produced by the extraction collaborator.
    ///
    /// The file holds a serialized `ExtractedDocument`; missing fields
    /// default to empty so a units-only dump is accepted.
    pub fn from_span_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| AnalyzerError::io(path, e))?;
        let mut doc: ExtractedDocument = serde_json::from_str(&data).map_err(|e| {
            AnalyzerError::Extraction(format!("'{}' is not a span dump: {}", path.display(), e))
        })?;
        if doc.name.is_empty() {
            doc.name = file_stem(path);
        }
        doc.normalize();
        Ok(doc)
    }

    /// Restore reading order and synthesize the text blob from spans when
    /// the extractor did not provide one.
    pub fn normalize(&mut self) {
        self.units.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then(a.y_position.total_cmp(&b.y_position))
        });
        self.drawings.sort_by(|a, b| {
            a.page_index
                .cmp(&b.page_index)
                .then(a.y.total_cmp(&b.y))
        });
        if self.text.trim().is_empty() && !self.units.is_empty() {
            self.text = self
                .units
                .iter()
                .map(|u| u.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
        }
    }

    /// Whether the extractor provided positioned spans.
    pub fn has_layout(&self) -> bool {
        !self.units.is_empty()
    }

    /// Whether there is any usable text at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.units.iter().all(|u| u.content.trim().is_empty())
    }

    /// Height of the given page.
    pub fn page_height(&self, page_index: usize) -> f32 {
        self.page_heights
            .get(page_index)
            .copied()
            .unwrap_or(DEFAULT_PAGE_HEIGHT)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text() {
        let doc = ExtractedDocument::from_text("article", "1 Primer párrafo.");
        assert_eq!(doc.name, "article");
        assert!(!doc.has_layout());
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_units_sorted_and_text_synthesized() {
        let doc = ExtractedDocument::from_units(
            "spans",
            vec![
                TextUnit::new("segunda", 10.0, 0, 200.0),
                TextUnit::new("primera", 10.0, 0, 100.0),
                TextUnit::new("tercera", 10.0, 1, 50.0),
            ],
        );
        assert_eq!(doc.units[0].content, "primera");
        assert_eq!(doc.units[2].content, "tercera");
        assert_eq!(doc.text, "primera\nsegunda\ntercera");
    }

    #[test]
    fn test_page_height_default() {
        let mut doc = ExtractedDocument::from_text("d", "x");
        doc.page_heights = vec![600.0];
        assert_eq!(doc.page_height(0), 600.0);
        assert_eq!(doc.page_height(3), DEFAULT_PAGE_HEIGHT);
    }

    #[test]
    fn test_empty_detection() {
        let doc = ExtractedDocument::from_text("d", "   \n  ");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_span_file_rejects_malformed_dump() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(&path, "esto no es un volcado de spans").unwrap();

        let err = ExtractedDocument::from_span_file(&path).unwrap_err();
        assert!(matches!(err, AnalyzerError::Extraction(_)));
    }

    #[test]
    fn test_span_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dump.json");
        let doc = ExtractedDocument::from_units(
            "dump",
            vec![TextUnit::new("hola", 9.5, 0, 10.0).bold()],
        );
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let loaded = ExtractedDocument::from_span_file(&path).unwrap();
        assert_eq!(loaded.units.len(), 1);
        assert!(loaded.units[0].is_bold);
        assert_eq!(loaded.text, "hola");
    }
}
