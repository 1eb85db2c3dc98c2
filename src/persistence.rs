//! Saving and loading analysis files.
//!
//! An analysis travels as pretty JSON by default (the wire format, readable
//! and diff-friendly) or as bincode when a compact archive matters. The
//! extension picks the format on both ends, so a path is all a caller
//! supplies.

use crate::error::{AnalyzerError, Result};
use crate::model::AnalysisResult;
use std::fs;
use std::path::Path;

/// Storage format for one analysis file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    Bincode,
}

impl SaveFormat {
    /// `.bin` and `.bincode` are binary; every other extension is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json,
        }
    }

    fn encode(self, result: &AnalysisResult) -> Result<Vec<u8>> {
        match self {
            SaveFormat::Json => Ok(serde_json::to_string_pretty(result)?.into_bytes()),
            SaveFormat::Bincode => bincode::encode_to_vec(result, bincode::config::standard())
                .map_err(|e| AnalyzerError::Serialization(e.to_string())),
        }
    }

    fn decode(self, data: &[u8]) -> Result<AnalysisResult> {
        match self {
            SaveFormat::Json => Ok(serde_json::from_slice(data)?),
            SaveFormat::Bincode => {
                let (result, _) =
                    bincode::decode_from_slice(data, bincode::config::standard())
                        .map_err(|e| AnalyzerError::Serialization(e.to_string()))?;
                Ok(result)
            }
        }
    }
}

/// Write an analysis to `path`, creating parent directories as needed.
pub fn save_result(result: &AnalysisResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AnalyzerError::io(parent, e))?;
    }
    let data = SaveFormat::from_path(path).encode(result)?;
    fs::write(path, data).map_err(|e| AnalyzerError::io(path, e))
}

/// Read an analysis back from `path`.
pub fn load_result(path: &Path) -> Result<AnalysisResult> {
    if !path.exists() {
        return Err(AnalyzerError::ResultNotFound(path.to_path_buf()));
    }
    let data = fs::read(path).map_err(|e| AnalyzerError::io(path, e))?;
    SaveFormat::from_path(path).decode(&data)
}

/// Whether an analysis file exists at the given path.
pub fn result_exists(path: &Path) -> bool {
    path.is_file()
}

/// Size of an analysis file in bytes.
pub fn result_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| AnalyzerError::io(path, e))?;
    Ok(metadata.len())
}
