//! Raw document parsing
//!
//! Turns YAML or JSON text into an untyped node tree and detects the
//! specification dialect.

use crate::dialect::detect_dialect;
use apiscope_common::{ContractError, Dialect, Result};
use serde_json::{Map, Number, Value};

/// Concrete syntax of the raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Json,
    Yaml,
}

/// Untyped document tree plus the detected dialect
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Top-level mapping, keys in document order
    pub root: Value,

    /// Syntax that successfully parsed the text
    pub syntax: Syntax,

    pub dialect: Dialect,

    /// Raw value of the `swagger` / `openapi` marker
    pub spec_version: Option<String>,
}

impl ParsedDocument {
    /// Parse raw text into a document
    ///
    /// The hint only picks which syntax is tried first; the other one is
    /// still tried when it fails. With no hint JSON goes first.
    ///
    /// # Example
    /// ```rust
    /// use apiscope_parser::ParsedDocument;
    /// use apiscope_common::Dialect;
    ///
    /// let doc = ParsedDocument::parse("swagger: '2.0'\npaths: {}\n", None).unwrap();
    /// assert_eq!(doc.dialect, Dialect::Swagger2);
    /// ```
    pub fn parse(text: &str, hint: Option<Syntax>) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContractError::UnparseableDocument(
                "document is empty".to_string(),
            ));
        }

        let (first, second) = match hint {
            Some(Syntax::Yaml) => (Syntax::Yaml, Syntax::Json),
            Some(Syntax::Json) | None => (Syntax::Json, Syntax::Yaml),
        };

        let (root, syntax) = match parse_as(text, first) {
            Ok(root) => (root, first),
            Err(first_err) => {
                tracing::debug!(error = %first_err, ?second, "first syntax failed, trying the other");
                match parse_as(text, second) {
                    Ok(root) => (root, second),
                    Err(second_err) => {
                        return Err(ContractError::UnparseableDocument(format!(
                            "neither JSON nor YAML: {}; {}",
                            first_err, second_err
                        )))
                    }
                }
            }
        };

        if !root.is_object() {
            return Err(ContractError::UnparseableDocument(
                "top-level node is not a mapping".to_string(),
            ));
        }

        let (dialect, spec_version) = detect_dialect(&root);
        tracing::debug!(?syntax, %dialect, "parsed document");

        Ok(Self {
            root,
            syntax,
            dialect,
            spec_version,
        })
    }
}

fn parse_as(text: &str, syntax: Syntax) -> std::result::Result<Value, String> {
    match syntax {
        Syntax::Json => serde_json::from_str(text).map_err(|e| format!("invalid JSON: {}", e)),
        Syntax::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
            .map(yaml_to_node)
            .map_err(|e| format!("invalid YAML: {}", e)),
    }
}

/// Convert a YAML value into the JSON node tree used everywhere else
fn yaml_to_node(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_node).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let map: Map<String, Value> = mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_node(v)))
                .collect();
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_node(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Mapping keys such as `200:` arrive as numbers; the tree only has string keys
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => yaml_to_node(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_document() {
        let doc = ParsedDocument::parse(
            r#"{"openapi": "3.0.1", "info": {"title": "T", "version": "1"}, "paths": {}}"#,
            None,
        )
        .unwrap();

        assert_eq!(doc.syntax, Syntax::Json);
        assert_eq!(doc.dialect, Dialect::OpenApi3);
        assert_eq!(doc.spec_version.as_deref(), Some("3.0.1"));
    }

    #[test]
    fn test_parse_yaml_with_numeric_keys() {
        let yaml = r#"
swagger: "2.0"
paths:
  /pets:
    get:
      responses:
        200:
          description: OK
"#;
        let doc = ParsedDocument::parse(yaml, None).unwrap();

        assert_eq!(doc.syntax, Syntax::Yaml);
        assert_eq!(doc.dialect, Dialect::Swagger2);
        assert_eq!(
            doc.root["paths"]["/pets"]["get"]["responses"]["200"]["description"],
            "OK"
        );
    }

    #[test]
    fn test_yaml_preserves_key_order() {
        let yaml = "openapi: 3.0.0\npaths:\n  /z: {}\n  /a: {}\n  /m: {}\n";
        let doc = ParsedDocument::parse(yaml, Some(Syntax::Yaml)).unwrap();

        let keys: Vec<&String> = doc.root["paths"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn test_unparseable_document() {
        let result = ParsedDocument::parse("{ not: [valid", None);
        assert!(matches!(result, Err(ContractError::UnparseableDocument(_))));

        let result = ParsedDocument::parse("   ", None);
        assert!(matches!(result, Err(ContractError::UnparseableDocument(_))));
    }

    #[test]
    fn test_scalar_root_is_rejected() {
        let result = ParsedDocument::parse("just a string", None);
        assert!(matches!(result, Err(ContractError::UnparseableDocument(_))));
    }

    #[test]
    fn test_json_hint_falls_back_to_yaml() {
        let doc = ParsedDocument::parse("openapi: 3.0.0\npaths: {}\n", Some(Syntax::Json)).unwrap();
        assert_eq!(doc.syntax, Syntax::Yaml);
        assert_eq!(doc.dialect, Dialect::OpenApi3);
    }

    #[test]
    fn test_yaml_hint_tries_yaml_first() {
        let doc = ParsedDocument::parse(r#"{"swagger": "2.0", "paths": {}}"#, Some(Syntax::Yaml)).unwrap();
        assert_eq!(doc.syntax, Syntax::Yaml);
        assert_eq!(doc.dialect, Dialect::Swagger2);
    }

    #[test]
    fn test_both_syntaxes_fail() {
        let err = ParsedDocument::parse("{ not: [valid", Some(Syntax::Json)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid JSON"));
        assert!(message.contains("invalid YAML"));
    }

    #[test]
    fn test_unknown_dialect() {
        let doc = ParsedDocument::parse(r#"{"info": {"title": "x"}, "paths": {}}"#, None).unwrap();
        assert_eq!(doc.dialect, Dialect::Unknown);
        assert_eq!(doc.spec_version, None);
    }
}
