//! Detect error-taxonomy codes in response descriptions
//!
//! Best-effort only: any `XXX-NNN` token in free text is picked up, whether
//! or not the author meant it as an error code.

use apiscope_common::{Contract, HttpMethod};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Codes found in the description of one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCodeAnnotation {
    pub path: String,
    pub method: HttpMethod,
    pub status: String,
    pub codes: Vec<String>,
}

fn code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b[A-Z]{3}-\d{3}\b").ok())
        .as_ref()
}

/// Scan every response description of the contract
pub fn scan_error_codes(contract: &Contract) -> Vec<ErrorCodeAnnotation> {
    let mut annotations = Vec::new();

    for endpoint in &contract.endpoints {
        for (status, response) in &endpoint.responses {
            let Some(description) = &response.description else {
                continue;
            };

            let codes = extract_codes(description);
            if codes.is_empty() {
                continue;
            }

            annotations.push(ErrorCodeAnnotation {
                path: endpoint.path.clone(),
                method: endpoint.method,
                status: status.clone(),
                codes,
            });
        }
    }

    annotations
}

/// Distinct codes in first-seen order
pub fn extract_codes(text: &str) -> Vec<String> {
    let Some(pattern) = code_pattern() else {
        return Vec::new();
    };

    let mut codes: Vec<String> = Vec::new();
    for found in pattern.find_iter(text) {
        if !codes.iter().any(|c| c == found.as_str()) {
            codes.push(found.as_str().to_string());
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_codes() {
        assert_eq!(
            extract_codes("Not found (PET-404). Also see PET-404 and ORD-001."),
            vec!["PET-404", "ORD-001"]
        );
    }

    #[test]
    fn test_word_boundaries() {
        assert!(extract_codes("XPET-404").is_empty());
        assert!(extract_codes("PET-4041").is_empty());
        assert!(extract_codes("pet-404").is_empty());
        assert_eq!(extract_codes("(ABC-123)"), vec!["ABC-123"]);
    }

    #[test]
    fn test_no_codes() {
        assert!(extract_codes("Everything is fine").is_empty());
        assert!(extract_codes("").is_empty());
    }
}
