//! Normalized contract model
//!
//! Both Swagger 2.0 and OpenAPI 3.x documents are mapped into these types by
//! the parser crate. Everything downstream of the builder only sees this
//! model, never the raw document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Specification dialect of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// Swagger 2.0 (`swagger: "2.0"`)
    #[serde(rename = "swagger2")]
    Swagger2,

    /// OpenAPI 3.x (`openapi: 3.x.y`)
    #[serde(rename = "openapi3")]
    OpenApi3,

    /// No dialect marker found
    #[serde(rename = "unknown")]
    Unknown,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Swagger2 => "swagger2",
            Dialect::OpenApi3 => "openapi3",
            Dialect::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root of the normalized model. One per analysis run, read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// API title from `info.title`
    pub title: String,

    /// API version from `info.version`
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Detected dialect
    pub dialect: Dialect,

    /// Raw `swagger`/`openapi` marker value (e.g. "2.0", "3.0.3")
    #[serde(default)]
    pub spec_version: Option<String>,

    /// Servers in declaration order; the first one is primary
    #[serde(default)]
    pub servers: Vec<Server>,

    /// Endpoints in declaration order
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,

    /// Named schemas (`definitions` or `components/schemas`)
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    #[serde(default)]
    pub security_schemes: Vec<SecurityScheme>,

    /// Document-wide security requirements
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

impl Contract {
    /// Look up an endpoint by its composite key
    pub fn endpoint(&self, path: &str, method: HttpMethod) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.path == path && e.method == method)
    }

    /// Look up a named schema
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }
}

/// Server entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Server variables, kept as declared
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Value>,
}

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Parse a path item key (`get`, `post`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(path, method)` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,

    pub method: HttpMethod,

    /// Never synthesized: `None` when the document has no `operationId`
    #[serde(default)]
    pub operation_id: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Unique by `(name, location)`
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub request_body: Option<RequestBody>,

    /// Status code (`"100"`..`"599"`) to response, in declaration order
    #[serde(default)]
    pub responses: IndexMap<String, Response>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
}

/// Security requirement: scheme name to required scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-body parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    pub location: ParameterLocation,

    pub schema: Schema,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

/// Request body, keyed by content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, Schema>,
}

/// Response for one status code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Header>,
}

/// Response header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub schema: Schema,
}

/// JSON schema primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
}

impl SchemaType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "string" => Some(SchemaType::String),
            "integer" => Some(SchemaType::Integer),
            "number" => Some(SchemaType::Number),
            "boolean" => Some(SchemaType::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
        }
    }
}

/// Reference carried by a schema node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaRef {
    /// Points at an entry of the contract's own schema table
    Named(String),

    /// Target not found in the document; the pointer is kept verbatim
    Unresolved(String),

    /// Placeholder substituted where resolution revisited a schema
    Cyclic(String),
}

/// Scalar validation constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.pattern.is_none()
            && self.enum_values.is_empty()
    }
}

/// Type description with optional validation constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object properties in declaration order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    /// Required property names, as declared
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Array element schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,

    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SchemaRef>,
}

impl Schema {
    /// Reference to a schema of the contract's own table
    pub fn named_ref(name: impl Into<String>) -> Self {
        Self {
            reference: Some(SchemaRef::Named(name.into())),
            ..Self::default()
        }
    }

    /// Placeholder for a reference that cannot be found
    pub fn unresolved(pointer: impl Into<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            reference: Some(SchemaRef::Unresolved(pointer.into())),
            ..Self::default()
        }
    }

    /// Placeholder for a reference that closes a cycle
    pub fn cyclic(name: impl Into<String>) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            reference: Some(SchemaRef::Cyclic(name.into())),
            ..Self::default()
        }
    }

    /// Name of the referenced table entry, if this node is a named reference
    pub fn ref_name(&self) -> Option<&str> {
        match &self.reference {
            Some(SchemaRef::Named(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    /// Short human-readable type, e.g. `integer (int64)`, `array<Pet>`
    pub fn type_label(&self) -> String {
        match &self.reference {
            Some(SchemaRef::Named(name)) => return name.clone(),
            Some(SchemaRef::Cyclic(name)) => return format!("{name} (cyclic)"),
            Some(SchemaRef::Unresolved(pointer)) => return format!("unresolved {pointer}"),
            None => {}
        }

        let base = match self.schema_type {
            Some(SchemaType::Array) => match &self.items {
                Some(items) => format!("array<{}>", items.type_label()),
                None => "array".to_string(),
            },
            Some(schema_type) => schema_type.as_str().to_string(),
            None if !self.all_of.is_empty() => "allOf".to_string(),
            None if !self.one_of.is_empty() => "oneOf".to_string(),
            None if !self.any_of.is_empty() => "anyOf".to_string(),
            None => "any".to_string(),
        };

        match &self.format {
            Some(format) => format!("{base} ({format})"),
            None => base,
        }
    }
}

/// Security scheme type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecuritySchemeKind {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
    #[serde(rename = "mutualTLS")]
    MutualTls,
}

impl SecuritySchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecuritySchemeKind::ApiKey => "apiKey",
            SecuritySchemeKind::Http => "http",
            SecuritySchemeKind::OAuth2 => "oauth2",
            SecuritySchemeKind::OpenIdConnect => "openIdConnect",
            SecuritySchemeKind::MutualTls => "mutualTLS",
        }
    }
}

/// Named security scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: SecuritySchemeKind,

    #[serde(default)]
    pub description: Option<String>,

    /// Scheme-specific attributes (`in`, `scheme`, `flows`, ...)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, Value>,
}

/// Declared tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Link to external documentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,

    #[serde(default)]
    pub description: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}
