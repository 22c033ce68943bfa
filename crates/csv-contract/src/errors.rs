//! Error types for contract validation
//!
//! Every failure carries enough context for a caller to branch on kind
//! and report precisely; none is a bare message string.

use std::path::PathBuf;

use csvpilot_core_types::ImportType;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ContractError {
    /// No candidate file exists for the import type
    #[error("No input file found for '{import_type}' under {searched}")]
    FileNotFound {
        import_type: ImportType,
        searched: PathBuf,
    },

    /// The resolved file exists but is zero bytes
    #[error("Input file is empty: {path}")]
    EmptyInput { path: PathBuf },

    /// Fewer than a header plus one data row
    #[error("Input file has {line_count} non-blank line(s), need at least 2: {path}")]
    InsufficientRows { path: PathBuf, line_count: usize },

    /// Required header tokens with no containing header cell
    #[error("Missing required headers {missing:?} in {path} (observed: {observed:?})")]
    MissingHeaders {
        path: PathBuf,
        missing: Vec<String>,
        observed: Vec<String>,
    },

    /// The file could not be read or parsed at all
    #[error("Unreadable input {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

impl ContractError {
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::FileNotFound { .. } => "file-not-found",
            ContractError::EmptyInput { .. } => "empty-input",
            ContractError::InsufficientRows { .. } => "insufficient-rows",
            ContractError::MissingHeaders { .. } => "missing-headers",
            ContractError::Unreadable { .. } => "unreadable",
        }
    }
}
