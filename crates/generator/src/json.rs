//! Canonical JSON export
//!
//! Top-level keys are fixed: `metadata`, `contract`, `statistics`.

use apiscope_analyzer::{Analysis, Statistics};
use apiscope_common::{Contract, Diagnostics, Dialect, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Name and version of the tool recorded in the metadata block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for GeneratorInfo {
    fn default() -> Self {
        Self {
            name: "apiscope",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    source: &'a str,
    dialect: Dialect,
    spec_version: Option<&'a str>,
    generated_at: String,
    endpoint_count: usize,
    schema_count: usize,
    generator: GeneratorInfo,
    diagnostics: &'a Diagnostics,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: Metadata<'a>,
    contract: &'a Contract,
    statistics: &'a Statistics,
}

/// Builds the JSON document for one analysis run
#[derive(Debug, Clone)]
pub struct JsonExporter {
    source: String,
    generated_at: DateTime<Utc>,
}

impl JsonExporter {
    /// Exporter stamped with the current time
    pub fn new(source: impl Into<String>) -> Self {
        Self::with_timestamp(source, Utc::now())
    }

    /// Exporter with a fixed generation timestamp
    pub fn with_timestamp(source: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            generated_at,
        }
    }

    /// Assemble the document; `diagnostics` is the combined list of the run
    pub fn export(
        &self,
        contract: &Contract,
        analysis: &Analysis,
        diagnostics: &Diagnostics,
    ) -> Result<Value> {
        let document = JsonDocument {
            metadata: Metadata {
                source: &self.source,
                dialect: contract.dialect,
                spec_version: contract.spec_version.as_deref(),
                generated_at: self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                endpoint_count: contract.endpoints.len(),
                schema_count: contract.schemas.len(),
                generator: GeneratorInfo::default(),
                diagnostics,
            },
            contract,
            statistics: &analysis.statistics,
        };

        let value = serde_json::to_value(&document)?;
        tracing::debug!(source = %self.source, "exported JSON document");
        Ok(value)
    }
}

/// Pretty-printed text of an exported document, newline-terminated
pub fn to_pretty_string(document: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(document)?;
    text.push('\n');
    Ok(text)
}
