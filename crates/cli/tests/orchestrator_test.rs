//! Integration test for the full load, analyze and write pipeline

use apiscope::{AnalyzeOptions, AppConfig, ArtifactWriter, Orchestrator, SourceLoader};
use apiscope_common::{ContractError, Dialect};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const STORE_YAML: &str = r##"
openapi: 3.0.3
info:
  title: Store
  version: 1.2.0
servers:
  - url: https://store.example.com/api
paths:
  /orders:
    get:
      tags: [orders]
      responses:
        "200":
          description: Order list
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: "#/components/schemas/Order"
    post:
      tags: [orders]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: "#/components/schemas/Order"
      responses:
        "201":
          description: Created
        "422":
          description: Rejected with ORD-001 or ORD-002
components:
  schemas:
    Order:
      type: object
      required: [id]
      properties:
        id:
          type: string
        quantity:
          type: integer
          minimum: 1
"##;

fn write_source(dir: &TempDir) -> String {
    let path = dir.path().join("store.yaml");
    fs::write(&path, STORE_YAML).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_local_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let config = AppConfig {
        output_dir: dir.path().join("out"),
        ..AppConfig::default()
    };

    let loader = SourceLoader::new(&config).unwrap();
    let output = Orchestrator::new(loader)
        .analyze(&source, &AnalyzeOptions::default())
        .unwrap();

    assert_eq!(output.dialect, Dialect::OpenApi3);
    assert_eq!(output.endpoint_count, 2);
    assert_eq!(output.schema_count, 1);
    assert!(output.diagnostics.is_empty());

    let written = ArtifactWriter::new(&config).write(&output).unwrap();
    assert_eq!(written.len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.json_path()).unwrap()).unwrap();
    assert_eq!(json["metadata"]["source"], source.as_str());
    assert_eq!(json["metadata"]["spec_version"], "3.0.3");
    assert_eq!(json["statistics"]["tags"]["orders"], 2);
    assert_eq!(json["statistics"]["error_codes"][0]["codes"][0], "ORD-001");
    assert_eq!(json["statistics"]["error_codes"][0]["codes"][1], "ORD-002");

    let markdown = fs::read_to_string(config.markdown_path()).unwrap();
    assert!(markdown.starts_with("# Store\n"));
    assert!(markdown.contains("### POST /orders"));
    assert!(markdown.contains("| `quantity` | `integer` | No |  | minimum: 1 |"));
}

#[test]
fn test_rerun_overwrites_artifacts() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir);
    let config = AppConfig {
        output_dir: dir.path().join("out"),
        ..AppConfig::default()
    };
    let orchestrator = Orchestrator::new(SourceLoader::new(&config).unwrap());
    let writer = ArtifactWriter::new(&config);

    writer
        .write(&orchestrator.analyze(&source, &AnalyzeOptions::default()).unwrap())
        .unwrap();
    let first = fs::read_to_string(config.markdown_path()).unwrap();

    writer
        .write(&orchestrator.analyze(&source, &AnalyzeOptions::default()).unwrap())
        .unwrap();
    let second = fs::read_to_string(config.markdown_path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_missing_source_is_fetch_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let loader = SourceLoader::new(&AppConfig::default()).unwrap();
    let err = Orchestrator::new(loader)
        .analyze(&missing.to_string_lossy(), &AnalyzeOptions::default())
        .unwrap_err();

    assert!(matches!(err, ContractError::Fetch(_)));
}
