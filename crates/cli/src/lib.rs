//! apiscope orchestration
//!
//! Runs one analysis end to end: load the raw document, build the contract,
//! analyze it and render whichever artifacts were requested. Each run owns
//! its own contract and statistics, so runs never share state.
//!
//! ```no_run
//! use apiscope::{AnalyzeOptions, AppConfig, Orchestrator, SourceLoader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = SourceLoader::new(&AppConfig::default())?;
//! let output = Orchestrator::new(loader).analyze("petstore.yaml", &AnalyzeOptions::default())?;
//! println!("{} endpoints", output.endpoint_count);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod loader;
pub mod logging;
pub mod summary;
pub mod writer;

pub use config::{AppConfig, ConfigError};
pub use loader::{syntax_hint, DocumentLoader, LoadError, SourceLoader};
pub use writer::ArtifactWriter;

use apiscope_analyzer::{analyze, Analysis};
use apiscope_common::{Contract, ContractError, Diagnostics, Dialect, Result};
use apiscope_generator::{JsonExporter, MarkdownGenerator};
use apiscope_parser::parse_contract;
use serde_json::Value;

/// Which artifacts one run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeOptions {
    pub emit_json: bool,
    pub emit_markdown: bool,

    /// Link to an external interactive UI; only rendered, never fetched
    pub ui_url: Option<String>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            emit_json: true,
            emit_markdown: true,
            ui_url: None,
        }
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub json: Option<Value>,
    pub markdown: Option<String>,
    pub dialect: Dialect,
    pub endpoint_count: usize,
    pub schema_count: usize,

    /// Build diagnostics followed by analysis diagnostics
    pub diagnostics: Diagnostics,

    pub contract: Contract,
    pub analysis: Analysis,
}

/// Drives the load, build, analyze and render stages
pub struct Orchestrator<L> {
    loader: L,
}

impl<L: DocumentLoader> Orchestrator<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Load `source` and analyze it. Load and parse failures end the run.
    pub fn analyze(&self, source: &str, options: &AnalyzeOptions) -> Result<AnalysisOutput> {
        let text = self
            .loader
            .load(source)
            .map_err(|e| ContractError::Fetch(e.to_string()))?;

        tracing::debug!(source, bytes = text.len(), "loaded document");
        analyze_text(&text, source, options)
    }
}

/// Analyze already-loaded text; `source` is recorded in the metadata and
/// its extension picks the syntax hint
pub fn analyze_text(text: &str, source: &str, options: &AnalyzeOptions) -> Result<AnalysisOutput> {
    let build = parse_contract(text, syntax_hint(source))?;
    let contract = build.contract;
    let analysis = analyze(&contract, &build.diagnostics);

    let mut diagnostics = build.diagnostics;
    diagnostics.extend(analysis.diagnostics.clone());

    let json = if options.emit_json {
        Some(JsonExporter::new(source).export(&contract, &analysis, &diagnostics)?)
    } else {
        None
    };

    let markdown = if options.emit_markdown {
        let generator = MarkdownGenerator::new()?;
        Some(generator.render(&contract, &analysis, &diagnostics, options.ui_url.as_deref())?)
    } else {
        None
    };

    tracing::debug!(
        dialect = %contract.dialect,
        diagnostics = diagnostics.len(),
        "analysis run complete"
    );

    Ok(AnalysisOutput {
        json,
        markdown,
        dialect: contract.dialect,
        endpoint_count: contract.endpoints.len(),
        schema_count: contract.schemas.len(),
        diagnostics,
        contract,
        analysis,
    })
}
