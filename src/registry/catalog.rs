//! Catalog ingestion — turns a backend's tools response into entries.
//!
//! Field names come from the backend's [`ResponseMap`]; nothing about the
//! body's shape is assumed beyond "a list of objects, or an object holding
//! one".

use serde_json::Value;

use super::errors::CatalogError;
use crate::config::ResponseMap;

/// Fallback key for the parameter schema when `parameters` is absent.
const INPUT_SCHEMA_ALIAS: &str = "inputSchema";
const PARAMETERS_FIELD: &str = "parameters";

/// One tool as reported by a backend, before qualification.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Extract tool entries from a catalog body.
///
/// An object body missing the configured key yields an empty catalog.
/// Entries without a non-empty string name are skipped.
pub fn parse_catalog(body: &Value, map: &ResponseMap) -> Result<Vec<CatalogEntry>, CatalogError> {
    let list = match map.tools_key() {
        None => body,
        Some(key) => match body {
            Value::Object(obj) => match obj.get(key) {
                Some(list) => list,
                None => return Ok(Vec::new()),
            },
            other => {
                return Err(CatalogError::Malformed {
                    reason: format!("expected an object with key '{key}', got {}", kind(other)),
                })
            }
        },
    };

    let Value::Array(items) = list else {
        return Err(CatalogError::Malformed {
            reason: format!("expected a list of tools, got {}", kind(list)),
        });
    };

    let name_field = map.name_field();
    let desc_field = map.desc_field();

    let entries = items
        .iter()
        .filter_map(|item| {
            let name = item.get(name_field)?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            let description = item
                .get(desc_field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let parameters = item
                .get(PARAMETERS_FIELD)
                .or_else(|| item.get(INPUT_SCHEMA_ALIAS))
                .cloned()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            Some(CatalogEntry {
                name: name.to_string(),
                description,
                parameters,
            })
        })
        .collect();

    Ok(entries)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
