//! Contract analysis for apiscope
//!
//! Computes derived statistics over a built [`Contract`] and expands named
//! schema references into property tables. The contract itself is never
//! modified; everything lands in a separate [`Analysis`] value.
//!
//! # Examples
//!
//! ```
//! use apiscope_analyzer::analyze;
//! use apiscope_parser::parse_contract;
//!
//! let output = parse_contract(
//!     r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"},
//!         "paths": {"/ping": {"get": {"responses": {"200": {"description": "pong"}}}}}}"#,
//!     None,
//! )
//! .unwrap();
//!
//! let analysis = analyze(&output.contract, &output.diagnostics);
//! assert_eq!(analysis.statistics.methods.get("GET"), Some(1));
//! ```

mod error_codes;
mod resolver;
mod statistics;

pub use error_codes::{extract_codes, scan_error_codes, ErrorCodeAnnotation};
pub use resolver::{PropertyRow, PropertyTable, SchemaResolver};
pub use statistics::{CountTable, SchemaStats, Statistics};

use apiscope_common::{Contract, Diagnostics};
use indexmap::IndexMap;

/// Annotation structure attached to one contract
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub statistics: Statistics,

    /// Expanded property table per named schema, in declaration order
    pub property_tables: IndexMap<String, PropertyTable>,

    /// Diagnostics raised during analysis (cyclic references)
    pub diagnostics: Diagnostics,
}

/// Analyze a contract
///
/// `build_diagnostics` are the diagnostics of the build that produced the
/// contract; they feed the skipped-endpoint and unresolved-reference counts.
/// The result is a pure function of the two inputs.
pub fn analyze(contract: &Contract, build_diagnostics: &Diagnostics) -> Analysis {
    let (expanded, diagnostics) = SchemaResolver::new(&contract.schemas).resolve_all();

    let property_tables: IndexMap<String, PropertyTable> = expanded
        .iter()
        .map(|(name, schema)| (name.clone(), PropertyTable::from_expanded(name, schema)))
        .collect();

    let error_codes = scan_error_codes(contract);
    let statistics = Statistics::compute(
        contract,
        build_diagnostics,
        &property_tables,
        diagnostics.len(),
        error_codes,
    );

    tracing::debug!(
        endpoints = statistics.endpoint_count,
        schemas = statistics.schema_count,
        cyclic = statistics.cyclic_references,
        "analyzed contract"
    );

    Analysis {
        statistics,
        property_tables,
        diagnostics,
    }
}
