//! Derive update requests from any `Serialize` value.
//!
//! The value is flattened through `serde_json::Value`: top-level scalar
//! fields become file-scope updates with their names converted to
//! UPPER_SNAKE_CASE, and one level of nested maps becomes per-section
//! updates (the field name is the section, used verbatim). `None` fields
//! are skipped. serde attributes (`rename`, `skip_serializing_if`) take
//! the place of ad-hoc naming rules.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::planner::UpdateRequest;
use crate::scan::to_upper_snake;

#[derive(Error, Debug)]
pub enum FromStructError {
    #[error("value did not serialize to a map (got {got})")]
    NotAMap { got: &'static str },

    #[error("field {field:?}: nested value too deep (only one section level is supported)")]
    TooDeep { field: String },

    #[error("field {field:?}: arrays cannot be expressed as variables")]
    UnsupportedArray { field: String },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flatten a struct into update requests.
pub fn updates_from_struct<T: Serialize>(data: &T) -> Result<Vec<UpdateRequest>, FromStructError> {
    let value = serde_json::to_value(data)?;
    let Value::Object(map) = value else {
        return Err(FromStructError::NotAMap {
            got: value_kind(&value),
        });
    };

    let mut updates = Vec::with_capacity(map.len());
    for (field, value) in map {
        match value {
            Value::Null => continue,
            Value::Object(section) => {
                for (inner_field, inner) in section {
                    if inner.is_null() {
                        continue;
                    }
                    let rendered = render_scalar(&inner, &inner_field)?;
                    updates.push(UpdateRequest {
                        key: to_upper_snake(&inner_field),
                        value: rendered,
                        section: field.clone(),
                        ..UpdateRequest::default()
                    });
                }
            }
            other => {
                let rendered = render_scalar(&other, &field)?;
                updates.push(UpdateRequest::new(to_upper_snake(&field), rendered));
            }
        }
    }
    Ok(updates)
}

fn render_scalar(value: &Value, field: &str) -> Result<String, FromStructError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        // Nulls are filtered by the caller.
        Value::Null => Ok(String::new()),
        Value::Array(_) => Err(FromStructError::UnsupportedArray {
            field: field.to_string(),
        }),
        Value::Object(_) => Err(FromStructError::TooDeep {
            field: field.to_string(),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
