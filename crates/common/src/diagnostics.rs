//! Non-fatal analysis diagnostics
//!
//! Conditions that degrade the output without aborting the run. They are
//! accumulated during parsing, building and analysis and surfaced in both
//! generated artifacts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single non-fatal condition
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("No swagger/openapi version marker found; extracted with OpenAPI 3.x field names")]
    UnknownDialect,

    #[error("Skipped endpoint {method} {path}: operation is not a mapping")]
    MalformedEndpoint { path: String, method: String },

    #[error("Unresolved reference {reference} at {location}")]
    UnresolvedReference { reference: String, location: String },

    #[error("Cyclic reference to {schema} ({chain})")]
    CyclicReference { schema: String, chain: String },

    #[error("Ignored response {status} of {method} {path}: not a status code between 100 and 599")]
    InvalidStatusCode {
        path: String,
        method: String,
        status: String,
    },

    #[error("Ignored security scheme {name}: unsupported type {scheme_type}")]
    UnsupportedSecurityScheme { name: String, scheme_type: String },
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of endpoints excluded from the model
    pub fn skipped_endpoints(&self) -> usize {
        self.0
            .iter()
            .filter(|d| matches!(d, Diagnostic::MalformedEndpoint { .. }))
            .count()
    }

    pub fn has_unknown_dialect(&self) -> bool {
        self.0.iter().any(|d| matches!(d, Diagnostic::UnknownDialect))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_endpoints_count() {
        let diagnostics: Diagnostics = vec![
            Diagnostic::UnknownDialect,
            Diagnostic::MalformedEndpoint {
                path: "/a".to_string(),
                method: "GET".to_string(),
            },
            Diagnostic::UnresolvedReference {
                reference: "#/definitions/Missing".to_string(),
                location: "definitions.Pet.owner".to_string(),
            },
            Diagnostic::MalformedEndpoint {
                path: "/b".to_string(),
                method: "POST".to_string(),
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(diagnostics.skipped_endpoints(), 2);
        assert!(diagnostics.has_unknown_dialect());
    }

    #[test]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::MalformedEndpoint {
            path: "/pets".to_string(),
            method: "GET".to_string(),
        };
        let value = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(value["kind"], "malformed_endpoint");
        assert_eq!(value["path"], "/pets");
        assert_eq!(
            diagnostic.to_string(),
            "Skipped endpoint GET /pets: operation is not a mapping"
        );
    }
}
