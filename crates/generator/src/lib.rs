//! Artifact generation for apiscope
//!
//! This crate turns a built contract and its analysis into the two output
//! artifacts: the canonical JSON document and the Markdown API reference.
//! Neither touches the filesystem; writing is left to the caller.

mod json;
mod markdown;
mod templates;

pub use json::{to_pretty_string, GeneratorInfo, JsonExporter};
pub use markdown::MarkdownGenerator;
pub use templates::load_templates;
