//! Derived statistics over a contract

use crate::error_codes::ErrorCodeAnnotation;
use crate::resolver::PropertyTable;
use apiscope_common::{Contract, Diagnostic, Diagnostics, Dialect};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Key → count table in rank order
///
/// Rows are sorted by descending count, ties broken by ascending key. This is
/// the order used everywhere the table is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    rows: Vec<(String, usize)>,
}

impl CountTable {
    /// Tally keys, one occurrence per item
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut tally: BTreeMap<String, usize> = BTreeMap::new();
        for key in keys {
            *tally.entry(key.into()).or_default() += 1;
        }

        let mut rows: Vec<(String, usize)> = tally.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self { rows }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(k, count)| (k.as_str(), *count))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for CountTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (key, count) in &self.rows {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Per-schema property statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaStats {
    pub name: String,
    pub property_count: usize,
    pub required_count: usize,
    /// `required_count / property_count`, 0 for schemas without properties
    pub required_ratio: f64,
}

/// All statistics of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub dialect: Dialect,
    pub endpoint_count: usize,
    pub schema_count: usize,
    pub skipped_endpoints: usize,
    pub deprecated_endpoints: usize,
    pub unresolved_references: usize,
    pub cyclic_references: usize,
    pub has_security: bool,
    /// Endpoints per HTTP method
    pub methods: CountTable,
    /// Endpoints per declared status code
    pub status_codes: CountTable,
    /// Endpoints per tag
    pub tags: CountTable,
    /// Distinct request/response content types, ascending
    pub content_types: Vec<String>,
    pub schemas: Vec<SchemaStats>,
    /// Best-effort error-code annotations; not authoritative
    pub error_codes: Vec<ErrorCodeAnnotation>,
}

impl Statistics {
    pub(crate) fn compute(
        contract: &Contract,
        diagnostics: &Diagnostics,
        tables: &IndexMap<String, PropertyTable>,
        cyclic_references: usize,
        error_codes: Vec<ErrorCodeAnnotation>,
    ) -> Self {
        let endpoints = &contract.endpoints;

        let mut content_types = BTreeSet::new();
        for endpoint in endpoints {
            if let Some(body) = &endpoint.request_body {
                content_types.extend(body.content.keys().cloned());
            }
            for response in endpoint.responses.values() {
                content_types.extend(response.content.keys().cloned());
            }
        }

        let schemas = tables
            .values()
            .map(|table| {
                let property_count = table.rows.len();
                let required_count = table.rows.iter().filter(|row| row.required).count();
                let required_ratio = if property_count == 0 {
                    0.0
                } else {
                    required_count as f64 / property_count as f64
                };
                SchemaStats {
                    name: table.name.clone(),
                    property_count,
                    required_count,
                    required_ratio,
                }
            })
            .collect();

        Self {
            dialect: contract.dialect,
            endpoint_count: endpoints.len(),
            schema_count: contract.schemas.len(),
            skipped_endpoints: diagnostics.skipped_endpoints(),
            deprecated_endpoints: endpoints.iter().filter(|e| e.deprecated).count(),
            unresolved_references: diagnostics
                .iter()
                .filter(|d| matches!(d, Diagnostic::UnresolvedReference { .. }))
                .count(),
            cyclic_references,
            has_security: !contract.security_schemes.is_empty(),
            methods: CountTable::from_keys(endpoints.iter().map(|e| e.method.as_str())),
            status_codes: CountTable::from_keys(
                endpoints
                    .iter()
                    .flat_map(|e| e.responses.keys().map(String::as_str)),
            ),
            tags: CountTable::from_keys(endpoints.iter().flat_map(|e| e.tags.iter().map(String::as_str))),
            content_types: content_types.into_iter().collect(),
            schemas,
            error_codes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rank_order() {
        let table = CountTable::from_keys(
            ["200", "404", "400", "400", "200", "404", "400", "400", "200", "404", "400"],
        );

        assert_eq!(table.keys(), vec!["400", "200", "404"]);
        assert_eq!(table.get("400"), Some(5));
        assert_eq!(table.get("200"), Some(3));
        assert_eq!(table.get("500"), None);
    }

    #[test]
    fn test_count_table_serializes_in_rank_order() {
        let table = CountTable::from_keys(["b", "a", "c", "c"]);
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"c":2,"a":1,"b":1}"#);
    }

    #[test]
    fn test_empty_table() {
        let table = CountTable::from_keys(Vec::<String>::new());
        assert!(table.is_empty());
        assert_eq!(serde_json::to_string(&table).unwrap(), "{}");
    }
}
