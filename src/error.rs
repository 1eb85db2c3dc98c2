//! Error types for the reading-time analyzer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur in the analyzer.
///
/// Only the total absence of usable text is fatal; structural ambiguity
/// inside the heuristics degrades to fallback strategies instead of
/// surfacing here.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The document path does not exist.
    #[error("Document not found at '{0}'")]
    DocumentNotFound(PathBuf),

    /// The upstream extractor could not produce any text.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Extraction succeeded but there is nothing to analyze.
    #[error("Document '{0}' contains no usable text")]
    EmptyDocument(String),

    /// The saved analysis file does not exist.
    #[error("Analysis file not found at '{0}'")]
    ResultNotFound(PathBuf),

    /// The batch input directory does not exist or is not a directory.
    #[error("Input path '{0}' does not exist or is not a directory")]
    InvalidInputDir(PathBuf),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnalyzerError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        AnalyzerError::Serialization(err.to_string())
    }
}
