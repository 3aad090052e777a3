//! Update application for the in-memory backend.
//!
//! An update is either an operator document (`$set`, `$unset`, `$inc`) or a
//! replacement document. Operators address top-level fields; mixing the two
//! forms is rejected.

use crate::error::{DriverError, Result};
use crate::traits::Document;
use serde_json::{Number, Value};

/// Parsed form of an update payload
pub(crate) enum Update<'a> {
    Operators(&'a serde_json::Map<String, Value>),
    Replacement(&'a serde_json::Map<String, Value>),
}

impl<'a> Update<'a> {
    pub(crate) fn parse(update: &'a Value) -> Result<Self> {
        let map = update
            .as_object()
            .ok_or_else(|| DriverError::InvalidUpdate(format!("expected an object, got {update}")))?;

        let operators = map.keys().filter(|k| k.starts_with('$')).count();
        match operators {
            0 => Ok(Self::Replacement(map)),
            n if n == map.len() => Ok(Self::Operators(map)),
            _ => Err(DriverError::InvalidUpdate(
                "cannot mix update operators and replacement fields".to_string(),
            )),
        }
    }

    /// Apply to `document`, returning whether it changed
    pub(crate) fn apply(&self, document: &mut Document) -> Result<bool> {
        let before = document.clone();
        match self {
            Self::Replacement(replacement) => {
                let id = document.get("_id").cloned();
                if let (Some(id), Some(new_id)) = (&id, replacement.get("_id"))
                    && id != new_id
                {
                    return Err(DriverError::InvalidUpdate(
                        "replacement would change the immutable field _id".to_string(),
                    ));
                }
                *document = (*replacement).clone();
                if let Some(id) = id {
                    document.insert("_id".to_string(), id);
                }
            }
            Self::Operators(operators) => {
                for (op, fields) in operators.iter() {
                    let fields = fields.as_object().ok_or_else(|| {
                        DriverError::InvalidUpdate(format!("{op} expects an object"))
                    })?;
                    for (field, value) in fields {
                        match op.as_str() {
                            "$set" => set_field(document, field, value.clone())?,
                            "$unset" => {
                                document.remove(field);
                            }
                            "$inc" => increment(document, field, value)?,
                            other => {
                                return Err(DriverError::InvalidUpdate(format!(
                                    "unsupported update operator {other}"
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(*document != before)
    }
}

fn set_field(document: &mut Document, field: &str, value: Value) -> Result<()> {
    if field == "_id" && document.get("_id").is_some_and(|id| *id != value) {
        return Err(DriverError::InvalidUpdate(
            "cannot modify the immutable field _id".to_string(),
        ));
    }
    document.insert(field.to_string(), value);
    Ok(())
}

fn increment(document: &mut Document, field: &str, by: &Value) -> Result<()> {
    if !by.is_number() {
        return Err(DriverError::InvalidUpdate(format!(
            "$inc on {field} needs a numeric amount"
        )));
    }
    let next = match document.get(field) {
        None | Some(Value::Null) => by.clone(),
        Some(Value::Number(n)) => add_numbers(n, by)?,
        Some(other) => {
            return Err(DriverError::InvalidUpdate(format!(
                "cannot apply $inc to non-numeric field {field} ({other})"
            )));
        }
    };
    set_field(document, field, next)
}

fn add_numbers(current: &Number, by: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (current.as_i64(), by.as_i64()) {
        return Ok(Value::from(a.saturating_add(b)));
    }
    let sum = current.as_f64().unwrap_or(0.0) + by.as_f64().unwrap_or(0.0);
    Number::from_f64(sum)
        .map(Value::Number)
        .ok_or_else(|| DriverError::InvalidUpdate("$inc produced a non-finite number".to_string()))
}
