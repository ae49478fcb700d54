use super::{bool_field, security_requirements, string_field, string_list, ContractBuilder};
use crate::dialect::{lookup, BodySource, DialectProfile, MediaSource};
use apiscope_common::{
    Diagnostic, Endpoint, Header, HttpMethod, Parameter, ParameterLocation, RequestBody, Response,
    Schema, SchemaType,
};
use indexmap::IndexMap;
use serde_json::Value;

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

impl<'a> ContractBuilder<'a> {
    /// Walk `paths` in document order, one endpoint per known method key
    pub(crate) fn build_endpoints(&mut self) -> Vec<Endpoint> {
        let root = self.root;
        let Some(paths) = root.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        for (path, item) in paths {
            let Some(operations) = item.as_object() else {
                self.record(Diagnostic::MalformedEndpoint {
                    path: path.clone(),
                    method: "*".to_string(),
                });
                continue;
            };

            let shared_parameters = operations.get("parameters");
            for (key, operation) in operations {
                let Some(method) = HttpMethod::from_key(key) else {
                    continue;
                };
                if !operation.is_object() {
                    self.record(Diagnostic::MalformedEndpoint {
                        path: path.clone(),
                        method: method.to_string(),
                    });
                    continue;
                }

                endpoints.push(self.build_endpoint(path, method, operation, shared_parameters));
            }
        }
        endpoints
    }

    fn build_endpoint(
        &mut self,
        path: &str,
        method: HttpMethod,
        operation: &'a Value,
        shared_parameters: Option<&'a Value>,
    ) -> Endpoint {
        let context = format!("{} {}", method, path);
        let profile = self.profile;

        let mut parameters = Vec::new();
        let mut body_parameter = None;
        let mut form_fields = Vec::new();
        for node in self.collect_parameters(shared_parameters, operation.get("parameters"), &context) {
            let location = node.get("in").and_then(Value::as_str).unwrap_or_default();
            match location {
                "body" if profile.body_source == BodySource::BodyParameter => {
                    body_parameter = Some(node)
                }
                "formData" if profile.body_source == BodySource::BodyParameter => {
                    form_fields.push(node)
                }
                other => match ParameterLocation::from_key(other) {
                    Some(location) => parameters.push(self.build_parameter(node, location, &context)),
                    None => tracing::debug!(
                        endpoint = %context,
                        location = other,
                        "ignoring parameter with unsupported location"
                    ),
                },
            }
        }

        let request_body = match profile.body_source {
            BodySource::BodyParameter => match body_parameter {
                Some(body) => Some(self.body_from_parameter(body, operation, &context)),
                None if !form_fields.is_empty() => {
                    Some(self.body_from_form(&form_fields, operation, &context))
                }
                None => None,
            },
            BodySource::RequestBodyField => operation
                .get("requestBody")
                .and_then(|node| self.build_request_body(node, &context)),
        };

        Endpoint {
            path: path.to_string(),
            method,
            operation_id: string_field(operation, "operationId"),
            summary: string_field(operation, "summary"),
            description: string_field(operation, "description"),
            tags: string_list(operation, "tags"),
            parameters,
            request_body,
            responses: self.build_responses(path, method, operation),
            deprecated: bool_field(operation, "deprecated"),
            security: security_requirements(operation.get("security")),
        }
    }

    /// Path-level parameters followed by operation-level ones
    ///
    /// An operation parameter replaces a path-level one with the same
    /// `(name, in)` pair, keeping its position.
    fn collect_parameters(
        &mut self,
        shared: Option<&'a Value>,
        own: Option<&'a Value>,
        context: &str,
    ) -> Vec<&'a Value> {
        let profile = self.profile;
        let mut merged: Vec<&'a Value> = Vec::new();

        for list in [shared, own].into_iter().flatten() {
            let Some(items) = list.as_array() else {
                continue;
            };
            for item in items {
                let Some(node) = self.resolve_component(
                    item,
                    profile.parameter_table,
                    profile.parameter_ref_prefix,
                    context,
                ) else {
                    continue;
                };

                let key = parameter_key(node);
                match merged.iter().position(|existing| parameter_key(existing) == key) {
                    Some(index) => merged[index] = node,
                    None => merged.push(node),
                }
            }
        }
        merged
    }

    /// Follow a local `$ref` into one of the reusable tables
    fn resolve_component(
        &mut self,
        node: &'a Value,
        table: &[&str],
        prefix: &str,
        context: &str,
    ) -> Option<&'a Value> {
        let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
            return node.is_object().then_some(node);
        };

        let root = self.root;
        let target = DialectProfile::local_ref_name(reference, prefix)
            .and_then(|name| lookup(root, table).and_then(|entries| entries.get(name.as_str())));

        match target {
            Some(target) if target.is_object() => Some(target),
            _ => {
                self.record(Diagnostic::UnresolvedReference {
                    reference: reference.to_string(),
                    location: context.to_string(),
                });
                None
            }
        }
    }

    fn build_parameter(
        &mut self,
        node: &Value,
        location: ParameterLocation,
        context: &str,
    ) -> Parameter {
        let name = string_field(node, "name").unwrap_or_default();
        let schema = self.parameter_schema(node, &format!("{} parameter {}", context, name));

        Parameter {
            name,
            location,
            schema,
            required: bool_field(node, "required"),
            description: string_field(node, "description"),
            deprecated: bool_field(node, "deprecated"),
        }
    }

    /// Swagger 2.0 `in: body` parameter, one content entry per `consumes` type
    fn body_from_parameter(&mut self, body: &Value, operation: &Value, context: &str) -> RequestBody {
        let schema = match body.get("schema") {
            Some(schema) => self.build_schema(schema, &format!("{} requestBody", context)),
            None => Schema::default(),
        };

        RequestBody {
            required: bool_field(body, "required"),
            description: string_field(body, "description"),
            content: self
                .media_types(operation, "consumes", DEFAULT_MEDIA_TYPE)
                .into_iter()
                .map(|media_type| (media_type, schema.clone()))
                .collect(),
        }
    }

    /// Swagger 2.0 `in: formData` parameters folded into one object schema
    fn body_from_form(&mut self, fields: &[&Value], operation: &Value, context: &str) -> RequestBody {
        let mut schema = Schema {
            schema_type: Some(SchemaType::Object),
            ..Schema::default()
        };

        for field in fields {
            let name = string_field(field, "name").unwrap_or_default();
            let mut property = self.parameter_schema(field, &format!("{} form {}", context, name));
            if property.description.is_none() {
                property.description = string_field(field, "description");
            }
            if bool_field(field, "required") {
                schema.required.push(name.clone());
            }
            schema.properties.insert(name, property);
        }

        RequestBody {
            required: !schema.required.is_empty(),
            description: None,
            content: self
                .media_types(operation, "consumes", FORM_MEDIA_TYPE)
                .into_iter()
                .map(|media_type| (media_type, schema.clone()))
                .collect(),
        }
    }

    fn build_request_body(&mut self, node: &'a Value, context: &str) -> Option<RequestBody> {
        let profile = self.profile;
        let node = self.resolve_component(
            node,
            profile.request_body_table,
            profile.request_body_ref_prefix,
            context,
        )?;

        Some(RequestBody {
            required: bool_field(node, "required"),
            description: string_field(node, "description"),
            content: self.content_map(node.get("content"), &format!("{} requestBody", context)),
        })
    }

    fn build_responses(
        &mut self,
        path: &str,
        method: HttpMethod,
        operation: &'a Value,
    ) -> IndexMap<String, Response> {
        let mut responses = IndexMap::new();
        let Some(declared) = operation.get("responses").and_then(Value::as_object) else {
            return responses;
        };

        let profile = self.profile;
        for (status, node) in declared {
            if !is_status_code(status) {
                self.record(Diagnostic::InvalidStatusCode {
                    path: path.to_string(),
                    method: method.to_string(),
                    status: status.clone(),
                });
                continue;
            }

            let context = format!("{} {} response {}", method, path, status);
            let Some(node) = self.resolve_component(
                node,
                profile.response_table,
                profile.response_ref_prefix,
                &context,
            ) else {
                continue;
            };

            let content = match profile.media_source {
                MediaSource::ContentMap => self.content_map(node.get("content"), &context),
                MediaSource::ConsumesProduces => match node.get("schema") {
                    Some(schema) => {
                        let schema = self.build_schema(schema, &context);
                        self.media_types(operation, "produces", DEFAULT_MEDIA_TYPE)
                            .into_iter()
                            .map(|media_type| (media_type, schema.clone()))
                            .collect()
                    }
                    None => IndexMap::new(),
                },
            };

            let headers = self.build_headers(node.get("headers"), &context);
            responses.insert(
                status.clone(),
                Response {
                    description: string_field(node, "description"),
                    content,
                    headers,
                },
            );
        }
        responses
    }

    fn content_map(&mut self, content: Option<&Value>, context: &str) -> IndexMap<String, Schema> {
        let mut schemas = IndexMap::new();
        let Some(content) = content.and_then(Value::as_object) else {
            return schemas;
        };

        for (media_type, media) in content {
            let schema = match media.get("schema") {
                Some(schema) => self.build_schema(schema, &format!("{} {}", context, media_type)),
                None => Schema::default(),
            };
            schemas.insert(media_type.clone(), schema);
        }
        schemas
    }

    fn build_headers(&mut self, headers: Option<&Value>, context: &str) -> IndexMap<String, Header> {
        let mut built = IndexMap::new();
        let Some(headers) = headers.and_then(Value::as_object) else {
            return built;
        };

        for (name, node) in headers {
            if !node.is_object() {
                continue;
            }
            let schema = self.parameter_schema(node, &format!("{} header {}", context, name));
            built.insert(
                name.clone(),
                Header {
                    description: string_field(node, "description"),
                    required: bool_field(node, "required"),
                    schema,
                },
            );
        }
        built
    }

    /// Operation-level list, else document-level list, else the default
    fn media_types(&self, operation: &Value, key: &str, default: &str) -> Vec<String> {
        let own = string_list(operation, key);
        if !own.is_empty() {
            return own;
        }
        let document = string_list(self.root, key);
        if !document.is_empty() {
            return document;
        }
        vec![default.to_string()]
    }
}

fn parameter_key(node: &Value) -> (Option<&str>, Option<&str>) {
    (
        node.get("name").and_then(Value::as_str),
        node.get("in").and_then(Value::as_str),
    )
}

/// Three digits between 100 and 599
fn is_status_code(key: &str) -> bool {
    key.len() == 3
        && key.bytes().all(|b| b.is_ascii_digit())
        && matches!(key.parse::<u16>(), Ok(100..=599))
}
