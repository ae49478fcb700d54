//! Artifact sink

use anyhow::{Context, Result};
use apiscope_generator::to_pretty_string;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::AnalysisOutput;

/// Writes the requested artifacts to their configured paths.
///
/// Every write replaces the previous file at the same path.
pub struct ArtifactWriter<'a> {
    config: &'a AppConfig,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// Write whichever artifacts `output` carries; returns the written paths
    pub fn write(&self, output: &AnalysisOutput) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if output.json.is_none() && output.markdown.is_none() {
            return Ok(written);
        }

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.output_dir.display()
            )
        })?;

        if let Some(json) = &output.json {
            let path = self.config.json_path();
            write_file(&path, &to_pretty_string(json)?)?;
            written.push(path);
        }

        if let Some(markdown) = &output.markdown {
            let path = self.config.markdown_path();
            write_file(&path, markdown)?;
            written.push(path);
        }

        Ok(written)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analyze_text, AnalyzeOptions};
    use tempfile::TempDir;

    const SMALL: &str = r#"{"openapi": "3.0.0", "info": {"title": "Small", "version": "1"}, "paths": {}}"#;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            output_dir: dir.path().join("nested/out"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_writes_both_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let output = analyze_text(SMALL, "small.json", &AnalyzeOptions::default()).unwrap();

        let written = ArtifactWriter::new(&config).write(&output).unwrap();

        assert_eq!(written, vec![config.json_path(), config.markdown_path()]);
        let json = fs::read_to_string(config.json_path()).unwrap();
        assert!(json.contains("\"metadata\""));
        let markdown = fs::read_to_string(config.markdown_path()).unwrap();
        assert!(markdown.starts_with("# Small\n"));
    }

    #[test]
    fn test_overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.markdown_path(), "stale content that is much longer than needed").unwrap();

        let options = AnalyzeOptions {
            emit_json: false,
            ..AnalyzeOptions::default()
        };
        let output = analyze_text(SMALL, "small.json", &options).unwrap();
        let written = ArtifactWriter::new(&config).write(&output).unwrap();

        assert_eq!(written, vec![config.markdown_path()]);
        assert!(!config.json_path().exists());
        let markdown = fs::read_to_string(config.markdown_path()).unwrap();
        assert!(!markdown.contains("stale"));
    }

    #[test]
    fn test_nothing_requested_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let options = AnalyzeOptions {
            emit_json: false,
            emit_markdown: false,
            ui_url: None,
        };
        let output = analyze_text(SMALL, "small.json", &options).unwrap();

        let written = ArtifactWriter::new(&config).write(&output).unwrap();
        assert!(written.is_empty());
        assert!(!config.output_dir.exists());
    }
}
