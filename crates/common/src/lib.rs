//! Common types and utilities for apiscope
//!
//! This crate contains the normalized contract model, the diagnostics
//! taxonomy and the error type shared by the parser, analyzer, generator
//! and CLI components.

mod diagnostics;
mod model;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use model::*;

use thiserror::Error;

/// Fatal errors that abort a whole analysis run
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Unparseable document: {0}")]
    UnparseableDocument(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for contract operations
pub type Result<T> = std::result::Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ContractError::UnparseableDocument("neither JSON nor YAML".to_string());
        assert_eq!(err.to_string(), "Unparseable document: neither JSON nor YAML");

        let err = ContractError::Fetch("connection refused".to_string());
        assert_eq!(err.to_string(), "Fetch error: connection refused");
    }
}
