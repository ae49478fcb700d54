//! Named schema reference resolution
//!
//! Every named schema is expanded once, in declaration order. Nested named
//! references stay references; only `allOf` members are merged in, as flat
//! property lists. The chain of schema names currently being expanded is an
//! explicit `visiting` set threaded through the calls; meeting a name already
//! in that set replaces the reference with a cyclic placeholder and records
//! a diagnostic.

use apiscope_common::{Constraints, Diagnostic, Diagnostics, Schema, SchemaRef, SchemaType};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::HashMap;

/// Resolves references against one contract's schema table
pub struct SchemaResolver<'c> {
    table: &'c IndexMap<String, Schema>,
    expanded: HashMap<String, Schema>,
    diagnostics: Diagnostics,
}

impl<'c> SchemaResolver<'c> {
    pub fn new(table: &'c IndexMap<String, Schema>) -> Self {
        Self {
            table,
            expanded: HashMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Expand every named schema; returns the expansions in table order
    pub fn resolve_all(mut self) -> (IndexMap<String, Schema>, Diagnostics) {
        let table = self.table;
        let mut resolved = IndexMap::new();
        for name in table.keys() {
            let mut visiting = IndexSet::new();
            let schema = self.resolve_named(name, &mut visiting);
            resolved.insert(name.clone(), schema);
        }
        (resolved, self.diagnostics)
    }

    /// Expand one named schema
    ///
    /// `visiting` holds the names on the current resolution chain, outermost
    /// first. It is left as it was found when this returns.
    pub fn resolve_named(&mut self, name: &str, visiting: &mut IndexSet<String>) -> Schema {
        if !self.follow(name, visiting) {
            return Schema::cyclic(name);
        }
        self.expanded
            .get(name)
            .cloned()
            .unwrap_or_else(|| Schema::unresolved(name))
    }

    /// Make sure `name` is expanded; `false` when it closes a cycle
    fn follow(&mut self, name: &str, visiting: &mut IndexSet<String>) -> bool {
        if self.expanded.contains_key(name) {
            return true;
        }

        if visiting.contains(name) {
            let chain: Vec<&str> = visiting
                .iter()
                .map(String::as_str)
                .skip_while(|visited| *visited != name)
                .chain(std::iter::once(name))
                .collect();
            let diagnostic = Diagnostic::CyclicReference {
                schema: name.to_string(),
                chain: chain.join(" -> "),
            };
            tracing::warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
            return false;
        }

        let table = self.table;
        let Some(declared) = table.get(name) else {
            return true;
        };

        visiting.insert(name.to_string());
        let expanded = self.expand(declared, visiting);
        visiting.pop();

        self.expanded.insert(name.to_string(), expanded);
        true
    }

    fn expand(&mut self, schema: &Schema, visiting: &mut IndexSet<String>) -> Schema {
        if let Some(name) = schema.ref_name() {
            return if self.follow(name, visiting) {
                schema.clone()
            } else {
                Schema::cyclic(name)
            };
        }

        let mut expanded = schema.clone();
        for (property, child) in &schema.properties {
            let child = self.expand(child, visiting);
            expanded.properties.insert(property.clone(), child);
        }
        expanded.items = schema
            .items
            .as_ref()
            .map(|items| Box::new(self.expand(items, visiting)));
        expanded.all_of = schema
            .all_of
            .iter()
            .map(|member| self.merge_member(member, visiting))
            .collect();
        expanded.one_of = self.expand_members(&schema.one_of, visiting);
        expanded.any_of = self.expand_members(&schema.any_of, visiting);
        expanded
    }

    fn expand_members(&mut self, members: &[Schema], visiting: &mut IndexSet<String>) -> Vec<Schema> {
        members
            .iter()
            .map(|member| self.expand(member, visiting))
            .collect()
    }

    /// `allOf` member with a named target replaced by its flattened properties
    fn merge_member(&mut self, member: &Schema, visiting: &mut IndexSet<String>) -> Schema {
        let Some(name) = member.ref_name() else {
            return self.expand(member, visiting);
        };
        if !self.follow(name, visiting) {
            return Schema::cyclic(name);
        }
        match self.expanded.get(name) {
            Some(target) => flattened(name, target),
            None => member.clone(),
        }
    }
}

/// Shallow copy of an expanded schema with its `allOf` properties merged in
fn flattened(name: &str, schema: &Schema) -> Schema {
    let mut properties: IndexMap<&str, &Schema> = IndexMap::new();
    let mut required: Vec<&str> = Vec::new();
    collect_properties(schema, &mut properties, &mut required);

    Schema {
        schema_type: schema.schema_type,
        description: schema.description.clone(),
        properties: properties
            .into_iter()
            .map(|(property, child)| (property.to_string(), child.clone()))
            .collect(),
        required: required.into_iter().map(str::to_string).collect(),
        reference: Some(SchemaRef::Named(name.to_string())),
        ..Schema::default()
    }
}

/// Property table of one named schema, `allOf` members merged in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyTable {
    pub name: String,
    pub type_label: String,
    pub description: Option<String>,
    pub rows: Vec<PropertyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRow {
    pub name: String,
    pub type_label: String,
    pub required: bool,
    pub description: Option<String>,
    pub constraints: Constraints,
    pub nullable: bool,
}

impl PropertyTable {
    /// Build the table from an expanded schema
    pub fn from_expanded(name: &str, schema: &Schema) -> Self {
        let mut properties: IndexMap<&str, &Schema> = IndexMap::new();
        let mut required: Vec<&str> = Vec::new();
        collect_properties(schema, &mut properties, &mut required);

        let type_label = match schema.schema_type {
            None if !schema.all_of.is_empty() && !properties.is_empty() => {
                SchemaType::Object.as_str().to_string()
            }
            _ => Schema {
                reference: None,
                ..schema.clone()
            }
            .type_label(),
        };

        let rows = properties
            .into_iter()
            .map(|(property, child)| PropertyRow {
                name: property.to_string(),
                type_label: child.type_label(),
                required: required.contains(&property),
                description: child.description.clone(),
                constraints: child.constraints.clone(),
                nullable: child.nullable,
            })
            .collect();

        Self {
            name: name.to_string(),
            type_label,
            description: schema.description.clone(),
            rows,
        }
    }
}

/// `allOf` members first, then the schema's own properties
fn collect_properties<'s>(
    schema: &'s Schema,
    properties: &mut IndexMap<&'s str, &'s Schema>,
    required: &mut Vec<&'s str>,
) {
    for member in &schema.all_of {
        collect_properties(member, properties, required);
    }
    for (name, child) in &schema.properties {
        properties.insert(name.as_str(), child);
    }
    for name in &schema.required {
        if !required.contains(&name.as_str()) {
            required.push(name.as_str());
        }
    }
}
