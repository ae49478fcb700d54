//! Markdown API reference rendering
//!
//! The contract and its analysis are flattened into a view model first; the
//! template only lays it out. Anchors are assigned in the exact order the
//! headings appear in the rendered document so duplicate headings get the
//! same `-N` suffixes a GitHub renderer would give them.

use crate::templates::{self, API_REFERENCE};
use apiscope_analyzer::{Analysis, PropertyRow};
use apiscope_common::{
    Constraints, Contract, ContractError, Diagnostics, Dialect, Endpoint, Result, Schema,
    SchemaType, SecurityScheme, SecuritySchemeKind,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tera::Tera;

/// Renders the Markdown API reference
pub struct MarkdownGenerator {
    tera: Tera,
}

impl MarkdownGenerator {
    pub fn new() -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { tera })
    }

    /// Render the reference document
    ///
    /// Identical inputs always produce byte-identical output.
    pub fn render(
        &self,
        contract: &Contract,
        analysis: &Analysis,
        diagnostics: &Diagnostics,
        ui_url: Option<&str>,
    ) -> Result<String> {
        let view = ReferenceView::build(contract, analysis, diagnostics, ui_url);
        let context = tera::Context::from_serialize(&view)
            .map_err(|e| ContractError::Render(format!("Failed to build context: {}", e)))?;

        let rendered = self
            .tera
            .render(API_REFERENCE, &context)
            .map_err(|e| ContractError::Render(format!("Template error: {:?}", e)))?;

        tracing::debug!(bytes = rendered.len(), "rendered markdown reference");
        Ok(rendered)
    }
}

/// GitHub-style heading slugs with `-N` suffixes for repeats
#[derive(Debug, Default)]
struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    /// Suffixed candidates are checked against every slug issued so far
    fn slug(&mut self, heading: &str) -> String {
        let base = github_slug(heading);
        let mut slug = base.clone();
        while self.seen.contains_key(&slug) {
            let count = self.seen.entry(base.clone()).or_insert(0);
            *count += 1;
            slug = format!("{}-{}", base, count);
        }
        self.seen.insert(slug.clone(), 0);
        slug
    }
}

fn github_slug(heading: &str) -> String {
    heading
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Anchors of the linkable headings
struct Anchors {
    endpoints: Vec<String>,
    schemas: IndexMap<String, String>,
    servers: String,
    endpoints_section: String,
    schemas_section: String,
    status_codes: String,
}

impl Anchors {
    /// Walk every heading of the document in render order
    fn assign(contract: &Contract, has_tags: bool) -> Self {
        let mut slugger = Slugger::default();

        slugger.slug(&contract.title);
        slugger.slug("HTTP Methods");
        slugger.slug("Content Types");
        if !contract.security_schemes.is_empty() {
            slugger.slug("Authentication");
        }
        if has_tags {
            slugger.slug("Tags");
        }
        slugger.slug("Table of Contents");
        let servers = slugger.slug("Servers");
        let endpoints_section = slugger.slug("Endpoints");

        let mut endpoints = Vec::with_capacity(contract.endpoints.len());
        for endpoint in &contract.endpoints {
            endpoints.push(slugger.slug(&endpoint_heading(endpoint)));
            slugger.slug("Parameters");
            if endpoint.request_body.is_some() {
                slugger.slug("Request Body");
            }
            slugger.slug("Responses");
            for status in endpoint.responses.keys() {
                slugger.slug(status);
            }
        }

        let schemas_section = slugger.slug("Schemas");
        let schemas = contract
            .schemas
            .keys()
            .map(|name| (name.clone(), slugger.slug(name)))
            .collect();
        let status_codes = slugger.slug("Status Codes");

        Self {
            endpoints,
            schemas,
            servers,
            endpoints_section,
            schemas_section,
            status_codes,
        }
    }
}

fn endpoint_heading(endpoint: &Endpoint) -> String {
    format!("{} {}", endpoint.method, endpoint.path)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

#[derive(Debug, Serialize)]
struct ReferenceView {
    title: String,
    description: String,
    version: String,
    specification: String,
    endpoint_count: usize,
    schema_count: usize,
    ui_url: String,
    diagnostics: Vec<String>,
    methods: Vec<CountRow>,
    content_types: Vec<String>,
    security_schemes: Vec<SecurityView>,
    tags: Vec<TagRow>,
    toc: Vec<TocEntry>,
    servers: Vec<ServerView>,
    endpoints: Vec<EndpointView>,
    schemas: Vec<SchemaView>,
    status_codes: Vec<StatusRow>,
}

#[derive(Debug, Serialize)]
struct CountRow {
    key: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct SecurityView {
    name: String,
    kind: &'static str,
    details: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct TagRow {
    name: String,
    count: usize,
    description: String,
}

#[derive(Debug, Serialize)]
struct TocEntry {
    indent: &'static str,
    title: String,
    anchor: String,
}

#[derive(Debug, Serialize)]
struct ServerView {
    url: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct EndpointView {
    heading: String,
    summary: String,
    description: String,
    tags: String,
    operation_id: String,
    deprecated: bool,
    parameters: Vec<ParameterRow>,
    request_body: Option<RequestBodyView>,
    responses: Vec<ResponseView>,
}

#[derive(Debug, Serialize)]
struct ParameterRow {
    name: String,
    location: &'static str,
    type_label: String,
    required: &'static str,
    description: String,
}

#[derive(Debug, Serialize)]
struct RequestBodyView {
    required: &'static str,
    description: String,
    content: Vec<MediaRow>,
}

#[derive(Debug, Serialize)]
struct MediaRow {
    content_type: String,
    schema: String,
}

#[derive(Debug, Serialize)]
struct ResponseView {
    status: String,
    description: String,
    content: Vec<MediaRow>,
    headers: Vec<HeaderRow>,
    error_codes: String,
}

#[derive(Debug, Serialize)]
struct HeaderRow {
    name: String,
    type_label: String,
    required: &'static str,
    description: String,
}

#[derive(Debug, Serialize)]
struct SchemaView {
    name: String,
    description: String,
    type_label: String,
    rows: Vec<SchemaRow>,
}

#[derive(Debug, Serialize)]
struct SchemaRow {
    name: String,
    type_label: String,
    required: &'static str,
    description: String,
    constraints: String,
}

#[derive(Debug, Serialize)]
struct StatusRow {
    status: String,
    description: &'static str,
    count: usize,
}

impl ReferenceView {
    fn build(
        contract: &Contract,
        analysis: &Analysis,
        diagnostics: &Diagnostics,
        ui_url: Option<&str>,
    ) -> Self {
        let statistics = &analysis.statistics;
        let tags = tag_rows(contract, analysis);
        let anchors = Anchors::assign(contract, !tags.is_empty());

        let mut toc = vec![
            TocEntry {
                indent: "",
                title: "Servers".to_string(),
                anchor: anchors.servers.clone(),
            },
            TocEntry {
                indent: "",
                title: "Endpoints".to_string(),
                anchor: anchors.endpoints_section.clone(),
            },
        ];
        for (endpoint, anchor) in contract.endpoints.iter().zip(&anchors.endpoints) {
            toc.push(TocEntry {
                indent: "  ",
                title: endpoint_heading(endpoint),
                anchor: anchor.clone(),
            });
        }
        toc.push(TocEntry {
            indent: "",
            title: "Schemas".to_string(),
            anchor: anchors.schemas_section.clone(),
        });
        for (name, anchor) in &anchors.schemas {
            toc.push(TocEntry {
                indent: "  ",
                title: name.clone(),
                anchor: anchor.clone(),
            });
        }
        toc.push(TocEntry {
            indent: "",
            title: "Status Codes".to_string(),
            anchor: anchors.status_codes.clone(),
        });

        Self {
            title: contract.title.clone(),
            description: contract.description.clone().unwrap_or_default(),
            version: contract.version.clone(),
            specification: specification_label(contract.dialect, contract.spec_version.as_deref()),
            endpoint_count: statistics.endpoint_count,
            schema_count: statistics.schema_count,
            ui_url: ui_url.unwrap_or_default().to_string(),
            diagnostics: diagnostics.iter().map(|d| d.to_string()).collect(),
            methods: statistics
                .methods
                .iter()
                .map(|(key, count)| CountRow {
                    key: key.to_string(),
                    count,
                })
                .collect(),
            content_types: statistics.content_types.clone(),
            security_schemes: contract.security_schemes.iter().map(security_view).collect(),
            tags,
            toc,
            servers: contract
                .servers
                .iter()
                .map(|server| ServerView {
                    url: server.url.clone(),
                    description: server.description.clone().unwrap_or_default(),
                })
                .collect(),
            endpoints: contract
                .endpoints
                .iter()
                .map(|endpoint| endpoint_view(endpoint, analysis, &anchors))
                .collect(),
            schemas: analysis
                .property_tables
                .values()
                .map(|table| SchemaView {
                    name: table.name.clone(),
                    description: table.description.clone().unwrap_or_default(),
                    type_label: table.type_label.clone(),
                    rows: table.rows.iter().map(schema_row).collect(),
                })
                .collect(),
            status_codes: statistics
                .status_codes
                .iter()
                .map(|(status, count)| StatusRow {
                    status: status.to_string(),
                    description: reason_phrase(status),
                    count,
                })
                .collect(),
        }
    }
}

fn specification_label(dialect: Dialect, version: Option<&str>) -> String {
    match (dialect, version) {
        (Dialect::Swagger2, Some(v)) => format!("Swagger {}", v),
        (Dialect::OpenApi3, Some(v)) => format!("OpenAPI {}", v),
        (Dialect::Swagger2, None) => "Swagger 2.0".to_string(),
        (Dialect::OpenApi3, None) => "OpenAPI 3.x".to_string(),
        (Dialect::Unknown, _) => "unknown (no version marker)".to_string(),
    }
}

/// Used tags in rank order, then declared tags no endpoint uses
fn tag_rows(contract: &Contract, analysis: &Analysis) -> Vec<TagRow> {
    let described = |name: &str| {
        contract
            .tags
            .iter()
            .find(|tag| tag.name == name)
            .and_then(|tag| tag.description.clone())
            .unwrap_or_default()
    };

    let used = &analysis.statistics.tags;
    let mut rows: Vec<TagRow> = used
        .iter()
        .map(|(name, count)| TagRow {
            name: name.to_string(),
            count,
            description: described(name),
        })
        .collect();

    for tag in &contract.tags {
        if used.get(&tag.name).is_none() {
            rows.push(TagRow {
                name: tag.name.clone(),
                count: 0,
                description: tag.description.clone().unwrap_or_default(),
            });
        }
    }
    rows
}

fn security_view(scheme: &SecurityScheme) -> SecurityView {
    let attribute = |key: &str| scheme.attributes.get(key).and_then(Value::as_str);

    let details = match scheme.kind {
        SecuritySchemeKind::ApiKey => match (attribute("name"), attribute("in")) {
            (Some(name), Some(location)) => format!("`{}` in {}", name, location),
            (Some(name), None) => format!("`{}`", name),
            _ => String::new(),
        },
        SecuritySchemeKind::Http => {
            let mut details = attribute("scheme")
                .map(|s| format!("scheme `{}`", s))
                .unwrap_or_default();
            if let Some(format) = attribute("bearerFormat") {
                details.push_str(&format!(", bearer format `{}`", format));
            }
            details
        }
        SecuritySchemeKind::OAuth2 => {
            // OpenAPI 3.x `flows` map, Swagger 2.0 single `flow`
            let flows: Vec<&str> = match scheme.attributes.get("flows").and_then(Value::as_object) {
                Some(flows) => flows.keys().map(String::as_str).collect(),
                None => attribute("flow").into_iter().collect(),
            };
            if flows.is_empty() {
                String::new()
            } else {
                format!("flows: {}", flows.join(", "))
            }
        }
        SecuritySchemeKind::OpenIdConnect => attribute("openIdConnectUrl")
            .map(str::to_string)
            .unwrap_or_default(),
        SecuritySchemeKind::MutualTls => String::new(),
    };

    SecurityView {
        name: scheme.name.clone(),
        kind: scheme.kind.as_str(),
        details,
        description: scheme.description.clone().unwrap_or_default(),
    }
}

fn endpoint_view(endpoint: &Endpoint, analysis: &Analysis, anchors: &Anchors) -> EndpointView {
    let media_rows = |content: &IndexMap<String, Schema>| -> Vec<MediaRow> {
        content
            .iter()
            .map(|(content_type, schema)| MediaRow {
                content_type: content_type.clone(),
                schema: schema_cell(schema, anchors),
            })
            .collect()
    };

    let responses = endpoint
        .responses
        .iter()
        .map(|(status, response)| {
            let error_codes = analysis
                .statistics
                .error_codes
                .iter()
                .find(|a| a.path == endpoint.path && a.method == endpoint.method && &a.status == status)
                .map(|a| {
                    a.codes
                        .iter()
                        .map(|code| format!("`{}`", code))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            ResponseView {
                status: status.clone(),
                description: response.description.clone().unwrap_or_default(),
                content: media_rows(&response.content),
                headers: response
                    .headers
                    .iter()
                    .map(|(name, header)| HeaderRow {
                        name: name.clone(),
                        type_label: header.schema.type_label(),
                        required: yes_no(header.required),
                        description: header.description.clone().unwrap_or_default(),
                    })
                    .collect(),
                error_codes,
            }
        })
        .collect();

    EndpointView {
        heading: endpoint_heading(endpoint),
        summary: endpoint.summary.clone().unwrap_or_default(),
        description: endpoint.description.clone().unwrap_or_default(),
        tags: endpoint.tags.join(", "),
        operation_id: endpoint.operation_id.clone().unwrap_or_default(),
        deprecated: endpoint.deprecated,
        parameters: endpoint
            .parameters
            .iter()
            .map(|param| ParameterRow {
                name: param.name.clone(),
                location: param.location.as_str(),
                type_label: param.schema.type_label(),
                required: yes_no(param.required),
                description: param.description.clone().unwrap_or_default(),
            })
            .collect(),
        request_body: endpoint.request_body.as_ref().map(|body| RequestBodyView {
            required: yes_no(body.required),
            description: body.description.clone().unwrap_or_default(),
            content: media_rows(&body.content),
        }),
        responses,
    }
}

/// Schema reference as a table cell, linked when it names a documented schema
fn schema_cell(schema: &Schema, anchors: &Anchors) -> String {
    let link = |name: &str| {
        anchors
            .schemas
            .get(name)
            .map(|anchor| format!("[{}](#{})", name, anchor))
    };

    if let Some(linked) = schema.ref_name().and_then(link) {
        return linked;
    }
    if schema.schema_type == Some(SchemaType::Array) {
        if let Some(linked) = schema
            .items
            .as_deref()
            .and_then(Schema::ref_name)
            .and_then(link)
        {
            return format!("array of {}", linked);
        }
    }
    format!("`{}`", schema.type_label())
}

fn schema_row(row: &PropertyRow) -> SchemaRow {
    let mut constraints = constraint_summary(&row.constraints);
    if row.nullable {
        constraints.insert(0, "nullable".to_string());
    }

    SchemaRow {
        name: row.name.clone(),
        type_label: row.type_label.clone(),
        required: yes_no(row.required),
        description: row.description.clone().unwrap_or_default(),
        constraints: constraints.join(", "),
    }
}

fn constraint_summary(constraints: &Constraints) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(min) = constraints.min_length {
        parts.push(format!("minLength: {}", min));
    }
    if let Some(max) = constraints.max_length {
        parts.push(format!("maxLength: {}", max));
    }
    if let Some(min) = &constraints.minimum {
        parts.push(format!("minimum: {}", min));
    }
    if let Some(max) = &constraints.maximum {
        parts.push(format!("maximum: {}", max));
    }
    if let Some(pattern) = &constraints.pattern {
        parts.push(format!("pattern: `{}`", pattern));
    }
    if !constraints.enum_values.is_empty() {
        let values: Vec<String> = constraints
            .enum_values
            .iter()
            .map(|value| match value {
                Value::String(s) => format!("`{}`", s),
                other => format!("`{}`", other),
            })
            .collect();
        parts.push(format!("enum: {}", values.join(", ")));
    }
    parts
}

fn reason_phrase(status: &str) -> &'static str {
    status
        .parse::<u16>()
        .ok()
        .and_then(|code| http::StatusCode::from_u16(code).ok())
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_slug() {
        assert_eq!(github_slug("GET /widgets/{id}"), "get-widgetsid");
        assert_eq!(github_slug("Table of Contents"), "table-of-contents");
        assert_eq!(github_slug("snake_case-Name"), "snake_case-name");
    }

    #[test]
    fn test_slugger_suffixes_repeats() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("Parameters"), "parameters");
        assert_eq!(slugger.slug("Parameters"), "parameters-1");
        assert_eq!(slugger.slug("Parameters"), "parameters-2");
        assert_eq!(slugger.slug("Responses"), "responses");
    }

    #[test]
    fn test_slugger_skips_issued_suffixes() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("Parameters"), "parameters");
        assert_eq!(slugger.slug("Parameters-1"), "parameters-1");
        assert_eq!(slugger.slug("Parameters"), "parameters-2");
        assert_eq!(slugger.slug("Parameters-1"), "parameters-1-1");
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase("404"), "Not Found");
        assert_eq!(reason_phrase("200"), "OK");
        assert_eq!(reason_phrase("299"), "");
    }

    #[test]
    fn test_constraint_summary() {
        let constraints = Constraints {
            min_length: Some(1),
            pattern: Some("^[a-z]+$".to_string()),
            enum_values: vec![Value::from("a"), Value::from(2)],
            ..Constraints::default()
        };
        assert_eq!(
            constraint_summary(&constraints).join(", "),
            "minLength: 1, pattern: `^[a-z]+$`, enum: `a`, `2`"
        );
    }

    #[test]
    fn test_specification_label() {
        assert_eq!(specification_label(Dialect::Swagger2, Some("2.0")), "Swagger 2.0");
        assert_eq!(specification_label(Dialect::OpenApi3, Some("3.1.0")), "OpenAPI 3.1.0");
        assert_eq!(
            specification_label(Dialect::Unknown, None),
            "unknown (no version marker)"
        );
    }
}
