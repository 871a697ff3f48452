//! JSON artifacts

use indexmap::IndexMap;

use crate::compiled::CompiledTemplate;
use crate::error::Result;

pub fn to_json(compiled: &CompiledTemplate) -> Result<String> {
    Ok(serde_json::to_string(compiled)?)
}

pub fn to_json_pretty(compiled: &CompiledTemplate) -> Result<String> {
    Ok(serde_json::to_string_pretty(compiled)?)
}

pub fn from_json(json: &str) -> Result<CompiledTemplate> {
    Ok(serde_json::from_str(json)?)
}

/// Aggregate artifact mapping template names to compiled templates.
pub fn bundle_to_json(templates: &IndexMap<String, CompiledTemplate>) -> Result<String> {
    Ok(serde_json::to_string_pretty(templates)?)
}

pub fn bundle_from_json(json: &str) -> Result<IndexMap<String, CompiledTemplate>> {
    Ok(serde_json::from_str(json)?)
}
