use super::{bool_field, string_field, string_list, ContractBuilder};
use crate::dialect::DialectProfile;
use apiscope_common::{Constraints, Diagnostic, Schema, SchemaType};
use serde_json::{Map, Value};

/// Keys of a Swagger 2.0 non-body parameter (or header) that describe its type
const INLINE_SCHEMA_KEYS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "minimum",
    "maximum",
    "minLength",
    "maxLength",
    "pattern",
    "x-nullable",
    "example",
];

impl ContractBuilder<'_> {
    /// Convert a schema node; `location` names it in diagnostics
    pub(crate) fn build_schema(&mut self, node: &Value, location: &str) -> Schema {
        let Some(fields) = node.as_object() else {
            return Schema::default();
        };

        if let Some(reference) = fields.get("$ref").and_then(Value::as_str) {
            return self.schema_ref(reference, location);
        }

        let mut format = string_field(node, "format");
        let mut nullable = bool_field(node, "nullable") || bool_field(node, "x-nullable");
        let mut schema_type = None;
        match fields.get("type") {
            Some(Value::String(name)) => schema_type = parse_type(name, &mut format),
            // OpenAPI 3.1 style `type: [string, "null"]`
            Some(Value::Array(names)) => {
                for name in names.iter().filter_map(Value::as_str) {
                    if name == "null" {
                        nullable = true;
                    } else if schema_type.is_none() {
                        schema_type = parse_type(name, &mut format);
                    }
                }
            }
            _ => {}
        }

        let mut properties = indexmap::IndexMap::new();
        if let Some(Value::Object(declared)) = fields.get("properties") {
            for (name, child) in declared {
                let child = self.build_schema(child, &format!("{}.{}", location, name));
                properties.insert(name.clone(), child);
            }
        }

        let items = fields
            .get("items")
            .map(|child| Box::new(self.build_schema(child, &format!("{}[]", location))));

        if schema_type.is_none() {
            if !properties.is_empty() {
                schema_type = Some(SchemaType::Object);
            } else if items.is_some() {
                schema_type = Some(SchemaType::Array);
            }
        }

        Schema {
            schema_type,
            format,
            description: string_field(node, "description"),
            properties,
            required: string_list(node, "required"),
            items,
            constraints: constraints(node),
            nullable,
            all_of: self.build_members(fields.get("allOf"), location, "allOf"),
            one_of: self.build_members(fields.get("oneOf"), location, "oneOf"),
            any_of: self.build_members(fields.get("anyOf"), location, "anyOf"),
            example: fields.get("example").cloned(),
            reference: None,
        }
    }

    /// Schema of a parameter or header: `schema`, else first `content` entry, else inline keys
    pub(crate) fn parameter_schema(&mut self, node: &Value, location: &str) -> Schema {
        if let Some(schema) = node.get("schema") {
            return self.build_schema(schema, location);
        }

        if let Some((_, media)) = node
            .get("content")
            .and_then(Value::as_object)
            .and_then(|content| content.iter().next())
        {
            return match media.get("schema") {
                Some(schema) => self.build_schema(schema, location),
                None => Schema::default(),
            };
        }

        let inline: Map<String, Value> = node
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .filter(|(key, _)| INLINE_SCHEMA_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        self.build_schema(&Value::Object(inline), location)
    }

    fn schema_ref(&mut self, reference: &str, location: &str) -> Schema {
        let name = DialectProfile::local_ref_name(reference, self.profile.schema_ref_prefix)
            .filter(|name| self.schema_names.contains(name));

        match name {
            Some(name) => Schema::named_ref(name),
            None => {
                self.record(Diagnostic::UnresolvedReference {
                    reference: reference.to_string(),
                    location: location.to_string(),
                });
                Schema::unresolved(reference)
            }
        }
    }

    fn build_members(&mut self, node: Option<&Value>, location: &str, keyword: &str) -> Vec<Schema> {
        let Some(members) = node.and_then(Value::as_array) else {
            return Vec::new();
        };

        members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                self.build_schema(member, &format!("{}.{}[{}]", location, keyword, index))
            })
            .collect()
    }
}

/// Swagger 2.0 `file` is a binary string
fn parse_type(name: &str, format: &mut Option<String>) -> Option<SchemaType> {
    if name == "file" {
        format.get_or_insert_with(|| "binary".to_string());
        return Some(SchemaType::String);
    }
    SchemaType::from_key(name)
}

fn constraints(node: &Value) -> Constraints {
    Constraints {
        min_length: node.get("minLength").and_then(Value::as_u64),
        max_length: node.get("maxLength").and_then(Value::as_u64),
        minimum: node.get("minimum").and_then(number),
        maximum: node.get("maximum").and_then(number),
        pattern: string_field(node, "pattern"),
        enum_values: node
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn number(value: &Value) -> Option<serde_json::Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::build_contract;
    use crate::document::ParsedDocument;
    use apiscope_common::{Diagnostic, SchemaRef, SchemaType};

    const DEFINITIONS: &str = r##"{
        "swagger": "2.0",
        "info": {"title": "Pets", "version": "1.0"},
        "paths": {},
        "definitions": {
            "Pet": {
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": {"type": "integer", "format": "int64"},
                    "name": {"type": "string", "minLength": 1, "maxLength": 64, "pattern": "^[a-z]+$"},
                    "status": {"type": "string", "enum": ["available", "sold"]},
                    "weight": {"type": "number", "minimum": 0.5, "maximum": 100},
                    "owner": {"$ref": "#/definitions/Owner"},
                    "photo": {"type": "file"},
                    "tags": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                }
            },
            "Owner": {
                "properties": {"nickname": {"type": ["string", "null"]}}
            }
        }
    }"##;

    #[test]
    fn test_schema_fields() {
        let output = build_contract(&ParsedDocument::parse(DEFINITIONS, None).unwrap());
        let pet = &output.contract.schemas["Pet"];

        assert_eq!(pet.schema_type, Some(SchemaType::Object));
        assert_eq!(pet.required, vec!["id", "name"]);
        assert_eq!(pet.properties["id"].type_label(), "integer (int64)");

        let name = &pet.properties["name"].constraints;
        assert_eq!(name.min_length, Some(1));
        assert_eq!(name.max_length, Some(64));
        assert_eq!(name.pattern.as_deref(), Some("^[a-z]+$"));

        assert_eq!(pet.properties["status"].constraints.enum_values.len(), 2);
        assert_eq!(
            pet.properties["weight"].constraints.minimum.as_ref().and_then(|n| n.as_f64()),
            Some(0.5)
        );
        assert_eq!(pet.properties["owner"].ref_name(), Some("Owner"));
        assert_eq!(pet.properties["photo"].type_label(), "string (binary)");
    }

    #[test]
    fn test_untyped_object_and_nullable_union() {
        let output = build_contract(&ParsedDocument::parse(DEFINITIONS, None).unwrap());
        let owner = &output.contract.schemas["Owner"];

        assert_eq!(owner.schema_type, Some(SchemaType::Object));
        let nickname = &owner.properties["nickname"];
        assert_eq!(nickname.schema_type, Some(SchemaType::String));
        assert!(nickname.nullable);
    }

    #[test]
    fn test_unresolved_reference_becomes_placeholder() {
        let output = build_contract(&ParsedDocument::parse(DEFINITIONS, None).unwrap());
        let tags = &output.contract.schemas["Pet"].properties["tags"];
        let items = tags.items.as_ref().unwrap();

        assert_eq!(
            items.reference,
            Some(SchemaRef::Unresolved("#/definitions/Tag".to_string()))
        );
        assert_eq!(tags.type_label(), "array<unresolved #/definitions/Tag>");
        assert!(output.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnresolvedReference { reference, location }
                if reference == "#/definitions/Tag" && location == "schemas.Pet.tags[]"
        )));
    }

    #[test]
    fn test_composition_members() {
        let doc = r##"{
            "openapi": "3.0.0",
            "info": {"title": "T", "version": "1"},
            "paths": {},
            "components": {"schemas": {
                "Base": {"type": "object", "properties": {"id": {"type": "string"}}},
                "Dog": {"allOf": [
                    {"$ref": "#/components/schemas/Base"},
                    {"type": "object", "properties": {"bark": {"type": "boolean"}}}
                ]},
                "Pet": {"oneOf": [{"$ref": "#/components/schemas/Dog"}, {"$ref": "#/components/schemas/Base"}]}
            }}
        }"##;
        let output = build_contract(&ParsedDocument::parse(doc, None).unwrap());
        let schemas = &output.contract.schemas;

        assert_eq!(schemas["Dog"].all_of.len(), 2);
        assert_eq!(schemas["Dog"].all_of[0].ref_name(), Some("Base"));
        assert_eq!(schemas["Dog"].type_label(), "allOf");
        assert_eq!(schemas["Pet"].one_of.len(), 2);
        assert!(output.diagnostics.is_empty());
    }
}
