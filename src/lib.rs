//! Reading Timer - segmentation and reading-time estimation for Spanish
//! study articles.
//!
//! The analyzer takes the output of an upstream text extractor (a flat text
//! blob, or positioned spans with page geometry) and produces a timed
//! outline of the article: numbered paragraphs with per-paragraph reading
//! times, the discussion questions attached to each paragraph, and the
//! trailing review block with its own question list.
//!
//! # Quick Start
//!
//! ```no_run
//! use reading_timer::{
//!     analyzer::Analyzer,
//!     config::Config,
//!     extract::ExtractedDocument,
//!     persistence::{load_result, save_result},
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     // Load a document
//!     let document = ExtractedDocument::from_text_file(Path::new("articulo.txt"))?;
//!
//!     // Analyze it
//!     let analyzer = Analyzer::with_timing(config.timing_options());
//!     let result = analyzer.analyze(&document)?;
//!
//!     // Save the analysis for later use
//!     save_result(&result, Path::new("analysis.json"))?;
//!
//!     println!("{}", result.format());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **ExtractedDocument**: input contract with the extraction collaborator
//! - **FontProfile / classify**: font-size tier discovery and span tagging
//! - **segment**: strategy-tiered paragraph segmentation
//! - **questions**: per-number question extraction with fallbacks
//! - **annotate**: parenthetical reference extraction and classification
//! - **finals**: final-section boundary detection (geometry, then marker)
//! - **timing**: per-paragraph and cumulative duration aggregation
//! - **Analyzer**: the pipeline orchestrator

pub mod analyzer;
pub mod annotate;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod finals;
pub mod model;
pub mod persistence;
pub mod questions;
pub mod segment;
pub mod timing;

// Re-export commonly used types
pub use analyzer::{Analyzer, analyze_file};
pub use config::Config;
pub use error::{AnalyzerError, Result};
pub use extract::{DrawPrimitive, ExtractedDocument, TextUnit};
pub use model::{AnalysisResult, ContentType, Paragraph, Question};
pub use persistence::{load_result, save_result};
pub use timing::TimingOptions;
