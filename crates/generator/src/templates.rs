//! Template loading and management

use apiscope_common::{ContractError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Name of the Markdown API reference template
pub(crate) const API_REFERENCE: &str = "api_reference.md";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("cell", cell_filter);

    tera.add_raw_template(
        API_REFERENCE,
        include_str!("../templates/api_reference.md.tera"),
    )
    .map_err(|e| {
        ContractError::Render(format!("Failed to load {} template: {}", API_REFERENCE, e))
    })?;

    Ok(tera)
}

/// Filter making free text safe inside a Markdown table cell
fn cell_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("cell filter expects a string"))?;

    Ok(Value::String(escape_cell(text)))
}

pub(crate) fn escape_cell(text: &str) -> String {
    text.trim()
        .replace('|', "\\|")
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}
