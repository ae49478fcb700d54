//! Plain-text run summary

use apiscope_analyzer::CountTable;
use std::fmt::Write;

use crate::AnalysisOutput;

/// Short report of one run: identity, counts, distributions, diagnostics
pub fn render_summary(output: &AnalysisOutput) -> String {
    let contract = &output.contract;
    let statistics = &output.analysis.statistics;
    let mut text = String::new();

    let _ = writeln!(text, "{} {}", contract.title, contract.version);
    let _ = match &contract.spec_version {
        Some(marker) => writeln!(text, "  Dialect: {} ({})", output.dialect, marker),
        None => writeln!(text, "  Dialect: {}", output.dialect),
    };
    let _ = writeln!(text, "  Endpoints: {}", output.endpoint_count);
    let _ = writeln!(text, "  Schemas: {}", output.schema_count);
    if statistics.skipped_endpoints > 0 {
        let _ = writeln!(text, "  Skipped endpoints: {}", statistics.skipped_endpoints);
    }
    if statistics.deprecated_endpoints > 0 {
        let _ = writeln!(text, "  Deprecated endpoints: {}", statistics.deprecated_endpoints);
    }
    if let Some(server) = contract.servers.first() {
        let _ = writeln!(text, "  Primary server: {}", server.url);
    }

    write_table(&mut text, "Methods", &statistics.methods);
    write_table(&mut text, "Status codes", &statistics.status_codes);

    if !output.diagnostics.is_empty() {
        let _ = writeln!(text, "\nDiagnostics ({}):", output.diagnostics.len());
        for diagnostic in &output.diagnostics {
            let _ = writeln!(text, "  - {}", diagnostic);
        }
    }

    text
}

fn write_table(text: &mut String, heading: &str, table: &CountTable) {
    if table.is_empty() {
        return;
    }

    let _ = writeln!(text, "\n{}:", heading);
    let width = table.keys().iter().map(|k| k.len()).max().unwrap_or(0);
    for (key, count) in table.iter() {
        let _ = writeln!(text, "  {:<width$}  {}", key, count, width = width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyze_text, AnalyzeOptions};
    use pretty_assertions::assert_eq;

    fn inspect(text: &str) -> String {
        let options = AnalyzeOptions {
            emit_json: false,
            emit_markdown: false,
            ui_url: None,
        };
        render_summary(&analyze_text(text, "inline.json", &options).unwrap())
    }

    #[test]
    fn test_summary_layout() {
        let summary = inspect(
            r#"{
              "openapi": "3.0.1",
              "info": {"title": "Shop", "version": "4"},
              "servers": [{"url": "https://shop.example.com/v4"}],
              "paths": {
                "/items": {
                  "get": {"responses": {"200": {"description": "ok"}}},
                  "post": {"responses": {"201": {"description": "created"}, "400": {"description": "bad"}}}
                }
              }
            }"#,
        );

        assert_eq!(
            summary,
            "Shop 4\n  Dialect: openapi3 (3.0.1)\n  Endpoints: 2\n  Schemas: 0\n  \
             Primary server: https://shop.example.com/v4\n\n\
             Methods:\n  GET   1\n  POST  1\n\n\
             Status codes:\n  200  1\n  201  1\n  400  1\n"
        );
    }

    #[test]
    fn test_summary_lists_diagnostics() {
        let summary = inspect(r#"{"info": {"title": "Bare", "version": "0"}, "paths": {}}"#);

        assert!(summary.starts_with("Bare 0\n  Dialect: unknown\n"));
        assert!(summary.contains("\nDiagnostics (1):\n  - No swagger/openapi version marker found"));
        assert!(!summary.contains("Methods:"));
    }
}
