//! Dialect detection and field-location profiles
//!
//! Swagger 2.0 and OpenAPI 3.x keep the same concepts in different places.
//! A [`DialectProfile`] is selected once per document and passed to the
//! builder, which is the only place that branches on these differences.

use apiscope_common::Dialect;
use serde_json::Value;

/// Detect the dialect from the top-level version markers
///
/// Returns the dialect and the raw marker value.
pub fn detect_dialect(root: &Value) -> (Dialect, Option<String>) {
    if let Some(version) = root.get("swagger").and_then(scalar_text) {
        if version == "2.0" || version == "2" {
            return (Dialect::Swagger2, Some(version));
        }
    }

    if let Some(version) = root.get("openapi").and_then(scalar_text) {
        if version.starts_with('3') {
            return (Dialect::OpenApi3, Some(version));
        }
    }

    (Dialect::Unknown, None)
}

/// Render a scalar node as text (`2.0` parsed as a YAML float included)
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Where the request body of an operation is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    /// `parameters` entries with `in: body` / `in: formData`
    BodyParameter,
    /// Dedicated `requestBody` with a content map
    RequestBodyField,
}

/// Where media types are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    /// `consumes` / `produces` lists on the operation or document
    ConsumesProduces,
    /// `content` maps keyed by media type
    ContentMap,
}

/// Where servers are declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSource {
    /// `schemes` x `host` + `basePath`
    HostBasePath,
    /// `servers` list
    ServerList,
}

/// Field-location rules for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    pub dialect: Dialect,
    pub schema_table: &'static [&'static str],
    pub schema_ref_prefix: &'static str,
    pub parameter_table: &'static [&'static str],
    pub parameter_ref_prefix: &'static str,
    pub response_table: &'static [&'static str],
    pub response_ref_prefix: &'static str,
    pub request_body_table: &'static [&'static str],
    pub request_body_ref_prefix: &'static str,
    pub security_table: &'static [&'static str],
    pub body_source: BodySource,
    pub media_source: MediaSource,
    pub server_source: ServerSource,
}

const SWAGGER2: DialectProfile = DialectProfile {
    dialect: Dialect::Swagger2,
    schema_table: &["definitions"],
    schema_ref_prefix: "#/definitions/",
    parameter_table: &["parameters"],
    parameter_ref_prefix: "#/parameters/",
    response_table: &["responses"],
    response_ref_prefix: "#/responses/",
    request_body_table: &[],
    request_body_ref_prefix: "",
    security_table: &["securityDefinitions"],
    body_source: BodySource::BodyParameter,
    media_source: MediaSource::ConsumesProduces,
    server_source: ServerSource::HostBasePath,
};

const OPENAPI3: DialectProfile = DialectProfile {
    dialect: Dialect::OpenApi3,
    schema_table: &["components", "schemas"],
    schema_ref_prefix: "#/components/schemas/",
    parameter_table: &["components", "parameters"],
    parameter_ref_prefix: "#/components/parameters/",
    response_table: &["components", "responses"],
    response_ref_prefix: "#/components/responses/",
    request_body_table: &["components", "requestBodies"],
    request_body_ref_prefix: "#/components/requestBodies/",
    security_table: &["components", "securitySchemes"],
    body_source: BodySource::RequestBodyField,
    media_source: MediaSource::ContentMap,
    server_source: ServerSource::ServerList,
};

impl DialectProfile {
    /// Profile for a detected dialect; unknown documents use OpenAPI 3.x locations
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Swagger2 => SWAGGER2,
            Dialect::OpenApi3 => OPENAPI3,
            Dialect::Unknown => DialectProfile {
                dialect: Dialect::Unknown,
                ..OPENAPI3
            },
        }
    }

    /// Look up a reusable-table entry addressed by a local `$ref`
    ///
    /// Returns the entry name when `reference` points into the table
    /// behind `prefix`.
    pub fn local_ref_name(reference: &str, prefix: &str) -> Option<String> {
        if prefix.is_empty() {
            return None;
        }
        reference
            .strip_prefix(prefix)
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .map(unescape_pointer)
    }
}

/// Follow a path of mapping keys from the root
pub(crate) fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// JSON pointer token unescaping (`~1` is `/`, `~0` is `~`)
fn unescape_pointer(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_swagger2() {
        let (dialect, version) = detect_dialect(&json!({"swagger": "2.0"}));
        assert_eq!(dialect, Dialect::Swagger2);
        assert_eq!(version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_detect_swagger2_numeric_marker() {
        let (dialect, _) = detect_dialect(&json!({"swagger": 2.0}));
        assert_eq!(dialect, Dialect::Swagger2);
    }

    #[test]
    fn test_detect_openapi3() {
        for version in ["3.0.0", "3.0.3", "3.1.0"] {
            let (dialect, raw) = detect_dialect(&json!({ "openapi": version }));
            assert_eq!(dialect, Dialect::OpenApi3);
            assert_eq!(raw.as_deref(), Some(version));
        }
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_dialect(&json!({"openapi": "2.5"})).0, Dialect::Unknown);
        assert_eq!(detect_dialect(&json!({"swagger": "1.2"})).0, Dialect::Unknown);
        assert_eq!(detect_dialect(&json!({})).0, Dialect::Unknown);
    }

    #[test]
    fn test_unknown_profile_uses_openapi3_locations() {
        let profile = DialectProfile::for_dialect(Dialect::Unknown);
        assert_eq!(profile.dialect, Dialect::Unknown);
        assert_eq!(profile.schema_ref_prefix, "#/components/schemas/");
        assert_eq!(profile.body_source, BodySource::RequestBodyField);
    }

    #[test]
    fn test_local_ref_name() {
        assert_eq!(
            DialectProfile::local_ref_name("#/definitions/Pet", "#/definitions/"),
            Some("Pet".to_string())
        );
        assert_eq!(
            DialectProfile::local_ref_name("#/definitions/a~1b", "#/definitions/"),
            Some("a/b".to_string())
        );
        assert_eq!(
            DialectProfile::local_ref_name("other.yaml#/definitions/Pet", "#/definitions/"),
            None
        );
        assert_eq!(
            DialectProfile::local_ref_name("#/definitions/Pet/properties/id", "#/definitions/"),
            None
        );
    }

    #[test]
    fn test_lookup() {
        let root = json!({"components": {"schemas": {"Pet": {}}}});
        assert!(lookup(&root, &["components", "schemas"]).is_some());
        assert!(lookup(&root, &["definitions"]).is_none());
        assert!(lookup(&root, &[]).is_none());
    }
}
