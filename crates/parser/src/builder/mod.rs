//! Converts a parsed document into the normalized [`Contract`]
//!
//! All dialect-specific branching lives here, driven by the
//! [`DialectProfile`] selected after detection. Structural problems local to
//! one endpoint or reference are recorded as diagnostics instead of failing
//! the build.

mod endpoint;
mod schema;

use crate::dialect::{lookup, scalar_text, DialectProfile, ServerSource};
use crate::document::ParsedDocument;
use apiscope_common::{
    Contract, Diagnostic, Diagnostics, Dialect, ExternalDocs, Schema, SecurityRequirement,
    SecurityScheme, SecuritySchemeKind, Server, Tag,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_TITLE: &str = "Untitled API";
const DEFAULT_VERSION: &str = "unversioned";

/// Result of a build: the contract plus everything that was skipped or degraded
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub contract: Contract,
    pub diagnostics: Diagnostics,
}

/// Build the contract model for a parsed document
pub fn build_contract(document: &ParsedDocument) -> BuildOutput {
    ContractBuilder::new(document).build()
}

/// Single-use builder walking the untyped tree of one document
pub struct ContractBuilder<'a> {
    document: &'a ParsedDocument,
    root: &'a Value,
    profile: DialectProfile,
    schema_names: HashSet<String>,
    diagnostics: Diagnostics,
}

impl<'a> ContractBuilder<'a> {
    pub fn new(document: &'a ParsedDocument) -> Self {
        let root = &document.root;
        let profile = DialectProfile::for_dialect(document.dialect);
        let schema_names = lookup(root, profile.schema_table)
            .and_then(Value::as_object)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            document,
            root,
            profile,
            schema_names,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Consume the builder and produce the contract
    pub fn build(mut self) -> BuildOutput {
        if self.profile.dialect == Dialect::Unknown {
            self.record(Diagnostic::UnknownDialect);
        }

        let root = self.root;
        let info = root.get("info");
        let title = info
            .and_then(|i| i.get("title"))
            .and_then(scalar_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let version = info
            .and_then(|i| i.get("version"))
            .and_then(scalar_text)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let description = info.and_then(|i| string_field(i, "description"));

        let servers = self.build_servers();
        let schemas = self.build_schema_table();
        let endpoints = self.build_endpoints();
        let security_schemes = self.build_security_schemes();

        let contract = Contract {
            title,
            version,
            description,
            dialect: self.document.dialect,
            spec_version: self.document.spec_version.clone(),
            servers,
            endpoints,
            schemas,
            security_schemes,
            security: security_requirements(root.get("security")),
            tags: build_tags(root),
            external_docs: root.get("externalDocs").and_then(external_docs),
        };

        tracing::debug!(
            endpoints = contract.endpoints.len(),
            schemas = contract.schemas.len(),
            diagnostics = self.diagnostics.len(),
            "built contract"
        );

        BuildOutput {
            contract,
            diagnostics: self.diagnostics,
        }
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn build_servers(&self) -> Vec<Server> {
        let root = self.root;
        match self.profile.server_source {
            ServerSource::ServerList => root
                .get("servers")
                .and_then(Value::as_array)
                .map(|servers| {
                    servers
                        .iter()
                        .filter_map(|server| {
                            Some(Server {
                                url: string_field(server, "url")?,
                                description: string_field(server, "description"),
                                variables: server
                                    .get("variables")
                                    .and_then(Value::as_object)
                                    .map(|vars| {
                                        vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
                                    })
                                    .unwrap_or_default(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
            ServerSource::HostBasePath => {
                let Some(host) = string_field(root, "host") else {
                    return Vec::new();
                };
                let base_path = string_field(root, "basePath").unwrap_or_default();
                let mut schemes = string_list(root, "schemes");
                if schemes.is_empty() {
                    schemes.push("http".to_string());
                }

                schemes
                    .into_iter()
                    .map(|scheme| Server {
                        url: format!("{}://{}{}", scheme, host, base_path),
                        description: None,
                        variables: IndexMap::new(),
                    })
                    .collect()
            }
        }
    }

    fn build_schema_table(&mut self) -> IndexMap<String, Schema> {
        let profile = self.profile;
        let Some(table) = lookup(self.root, profile.schema_table).and_then(Value::as_object) else {
            return IndexMap::new();
        };

        let mut schemas = IndexMap::new();
        for (name, node) in table {
            let schema = self.build_schema(node, &format!("schemas.{}", name));
            schemas.insert(name.clone(), schema);
        }
        schemas
    }

    fn build_security_schemes(&mut self) -> Vec<SecurityScheme> {
        let profile = self.profile;
        let Some(table) = lookup(self.root, profile.security_table).and_then(Value::as_object)
        else {
            return Vec::new();
        };

        let mut schemes = Vec::new();
        for (name, node) in table {
            let Some(fields) = node.as_object() else {
                continue;
            };

            let mut attributes: IndexMap<String, Value> = fields
                .iter()
                .filter(|(key, _)| key.as_str() != "type" && key.as_str() != "description")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            let raw_type = string_field(node, "type").unwrap_or_default();
            let kind = match raw_type.as_str() {
                "apiKey" => SecuritySchemeKind::ApiKey,
                "http" => SecuritySchemeKind::Http,
                "oauth2" => SecuritySchemeKind::OAuth2,
                "openIdConnect" => SecuritySchemeKind::OpenIdConnect,
                "mutualTLS" => SecuritySchemeKind::MutualTls,
                // Swagger 2.0 basic auth is HTTP basic in OpenAPI 3.x terms
                "basic" => {
                    attributes.insert("scheme".to_string(), Value::from("basic"));
                    SecuritySchemeKind::Http
                }
                other => {
                    self.record(Diagnostic::UnsupportedSecurityScheme {
                        name: name.clone(),
                        scheme_type: other.to_string(),
                    });
                    continue;
                }
            };

            schemes.push(SecurityScheme {
                name: name.clone(),
                kind,
                description: string_field(node, "description"),
                attributes,
            });
        }
        schemes
    }
}

fn build_tags(root: &Value) -> Vec<Tag> {
    root.get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|tag| {
                    Some(Tag {
                        name: string_field(tag, "name")?,
                        description: string_field(tag, "description"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn external_docs(node: &Value) -> Option<ExternalDocs> {
    Some(ExternalDocs {
        url: string_field(node, "url")?,
        description: string_field(node, "description"),
    })
}

fn security_requirements(node: Option<&Value>) -> Vec<SecurityRequirement> {
    node.and_then(Value::as_array)
        .map(|requirements| {
            requirements
                .iter()
                .filter_map(Value::as_object)
                .map(|requirement| {
                    requirement
                        .iter()
                        .map(|(scheme, scopes)| (scheme.clone(), string_items(scopes)))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn bool_field(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn string_list(node: &Value, key: &str) -> Vec<String> {
    node.get(key).map(string_items).unwrap_or_default()
}

fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParsedDocument;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> BuildOutput {
        build_contract(&ParsedDocument::parse(text, None).unwrap())
    }

    #[test]
    fn test_swagger2_servers_from_host() {
        let output = build(
            r#"{
                "swagger": "2.0",
                "info": {"title": "Pets", "version": "1.0"},
                "host": "api.example.com",
                "basePath": "/v1",
                "schemes": ["https", "http"],
                "paths": {}
            }"#,
        );

        let urls: Vec<&str> = output
            .contract
            .servers
            .iter()
            .map(|s| s.url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://api.example.com/v1", "http://api.example.com/v1"]);
    }

    #[test]
    fn test_openapi3_servers_keep_order() {
        let output = build(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "Pets", "version": "1.0"},
                "servers": [
                    {"url": "https://prod.example.com", "description": "Production"},
                    {"url": "https://{env}.example.com", "variables": {"env": {"default": "staging"}}}
                ],
                "paths": {}
            }"#,
        );

        let servers = &output.contract.servers;
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].url, "https://prod.example.com");
        assert_eq!(servers[0].description.as_deref(), Some("Production"));
        assert!(servers[1].variables.contains_key("env"));
    }

    #[test]
    fn test_info_defaults() {
        let output = build(r#"{"openapi": "3.0.0", "paths": {}}"#);
        assert_eq!(output.contract.title, DEFAULT_TITLE);
        assert_eq!(output.contract.version, DEFAULT_VERSION);
    }

    #[test]
    fn test_unknown_dialect_is_recorded() {
        let output = build(
            r#"{
                "info": {"title": "Mystery", "version": "0.1"},
                "paths": {"/things": {"get": {"responses": {"200": {"description": "ok"}}}}},
                "components": {"schemas": {"Thing": {"type": "object"}}}
            }"#,
        );

        assert!(output.diagnostics.has_unknown_dialect());
        assert_eq!(output.contract.dialect, Dialect::Unknown);
        assert_eq!(output.contract.endpoints.len(), 1);
        assert!(output.contract.schemas.contains_key("Thing"));
    }

    #[test]
    fn test_security_schemes_normalized() {
        let output = build(
            r#"{
                "swagger": "2.0",
                "info": {"title": "Pets", "version": "1.0"},
                "paths": {},
                "securityDefinitions": {
                    "basicAuth": {"type": "basic", "description": "HTTP basic"},
                    "apiKey": {"type": "apiKey", "name": "X-API-Key", "in": "header"},
                    "weird": {"type": "kerberos"}
                },
                "security": [{"apiKey": []}]
            }"#,
        );

        let schemes = &output.contract.security_schemes;
        assert_eq!(schemes.len(), 2);
        assert_eq!(schemes[0].kind, SecuritySchemeKind::Http);
        assert_eq!(schemes[0].attributes["scheme"], "basic");
        assert_eq!(schemes[1].kind, SecuritySchemeKind::ApiKey);
        assert_eq!(schemes[1].attributes["in"], "header");
        assert_eq!(output.contract.security.len(), 1);
        assert!(output.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnsupportedSecurityScheme { name, .. } if name == "weird"
        )));
    }

    #[test]
    fn test_tags_and_external_docs() {
        let output = build(
            r#"{
                "openapi": "3.0.0",
                "info": {"title": "Pets", "version": "1.0"},
                "paths": {},
                "tags": [{"name": "pets", "description": "Pet operations"}, {"description": "nameless"}],
                "externalDocs": {"url": "https://docs.example.com"}
            }"#,
        );

        assert_eq!(output.contract.tags.len(), 1);
        assert_eq!(output.contract.tags[0].name, "pets");
        assert_eq!(
            output.contract.external_docs.as_ref().map(|d| d.url.as_str()),
            Some("https://docs.example.com")
        );
    }
}
