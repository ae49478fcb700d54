//! Swagger 2.0 / OpenAPI 3.x document parsing
//!
//! This crate turns raw contract text into the normalized [`Contract`]
//! model shared by the rest of the workspace.
//!
//! ## Pipeline
//!
//! - [`ParsedDocument::parse`] reads JSON or YAML into an untyped tree and
//!   detects the dialect from the `swagger` / `openapi` marker
//! - [`build_contract`] maps the tree into the contract model using the
//!   [`DialectProfile`] of that dialect
//!
//! Problems confined to one endpoint or reference never abort the build;
//! they are returned as [`Diagnostics`] next to the contract.

mod builder;
mod dialect;
mod document;

pub use builder::{build_contract, BuildOutput, ContractBuilder};
pub use dialect::{detect_dialect, BodySource, DialectProfile, MediaSource, ServerSource};
pub use document::{ParsedDocument, Syntax};

use apiscope_common::Result;

/// Parse raw text and build its contract in one step
///
/// # Example
/// ```rust
/// use apiscope_parser::parse_contract;
///
/// let output = parse_contract(
///     r#"{"openapi": "3.0.0", "info": {"title": "Pets", "version": "1"}, "paths": {}}"#,
///     None,
/// )
/// .unwrap();
/// assert_eq!(output.contract.title, "Pets");
/// ```
pub fn parse_contract(text: &str, hint: Option<Syntax>) -> Result<BuildOutput> {
    let document = ParsedDocument::parse(text, hint)?;
    Ok(build_contract(&document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiscope_common::{Contract, ContractError, Diagnostics};

    #[test]
    fn test_parse_contract() {
        let output = parse_contract("swagger: '2.0'\ninfo:\n  title: Pets\n  version: '1.0'\npaths: {}\n", None)
            .unwrap();
        assert_eq!(output.contract.title, "Pets");
        assert_eq!(output.contract.version, "1.0");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_parse_contract_propagates_parse_errors() {
        let result = parse_contract("[1, 2, 3]", None);
        assert!(matches!(result, Err(ContractError::UnparseableDocument(_))));
    }

    #[test]
    fn test_contract_and_diagnostics_are_exported() {
        fn takes(_: &Contract, _: &Diagnostics) {}
        let output = parse_contract(r#"{"paths": {}}"#, None).unwrap();
        takes(&output.contract, &output.diagnostics);
    }
}
