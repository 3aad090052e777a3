//! Filter matching and sorting for the in-memory backend.
//!
//! Supported filter syntax, on top-level fields only:
//! - `{"field": value}` equality (an array field matches if it contains `value`)
//! - `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`

use crate::error::{DriverError, Result};
use crate::traits::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Check whether `document` satisfies `filter`
pub(crate) fn matches(document: &Document, filter: &Value) -> Result<bool> {
    let clauses = filter
        .as_object()
        .ok_or_else(|| DriverError::InvalidFilter(format!("expected an object, got {filter}")))?;

    for (field, condition) in clauses {
        if field.starts_with('$') {
            return Err(DriverError::InvalidFilter(format!(
                "unsupported top-level operator {field}"
            )));
        }
        if !field_matches(document.get(field), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_operator_doc(condition: &Value) -> bool {
    condition
        .as_object()
        .is_some_and(|map| !map.is_empty() && map.keys().all(|k| k.starts_with('$')))
}

fn field_matches(field: Option<&Value>, condition: &Value) -> Result<bool> {
    let Some(operators) = condition.as_object().filter(|_| is_operator_doc(condition)) else {
        return Ok(equals(field, condition));
    };

    for (op, operand) in operators {
        let satisfied = match op.as_str() {
            "$eq" => equals(field, operand),
            "$ne" => !equals(field, operand),
            "$gt" => ordered(field, operand, |o| o == Ordering::Greater),
            "$gte" => ordered(field, operand, |o| o != Ordering::Less),
            "$lt" => ordered(field, operand, |o| o == Ordering::Less),
            "$lte" => ordered(field, operand, |o| o != Ordering::Greater),
            "$in" => in_list(field, operand)?,
            other => {
                return Err(DriverError::InvalidFilter(format!(
                    "unsupported operator {other}"
                )));
            }
        };
        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => values_equal(actual, expected),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn ordered(field: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match field {
        Some(actual) if type_rank(actual) == type_rank(operand) => {
            accept(compare_values(actual, operand))
        }
        _ => false,
    }
}

fn in_list(field: Option<&Value>, operand: &Value) -> Result<bool> {
    let candidates = operand
        .as_array()
        .ok_or_else(|| DriverError::InvalidFilter("$in expects an array".to_string()))?;
    Ok(candidates.iter().any(|candidate| equals(field, candidate)))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values: by type first, then by value
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Sort documents in place according to `{"field": 1 | -1, ...}`
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Value) -> Result<()> {
    let keys = sort
        .as_object()
        .ok_or_else(|| DriverError::Other(format!("sort must be an object, got {sort}")))?;
    let keys: Vec<(&String, bool)> = keys
        .iter()
        .map(|(field, dir)| (field, dir.as_i64().unwrap_or(1) < 0))
        .collect();

    documents.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = match (a.get(*field), b.get(*field)) {
                (Some(x), Some(y)) => compare_values(x, y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering.is_ne() {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// Equality fields of a filter, used to seed an upserted document
pub(crate) fn equality_fields(filter: &Value) -> Document {
    let mut seed = Document::new();
    let Some(clauses) = filter.as_object() else {
        return seed;
    };
    for (key, condition) in clauses {
        if !is_operator_doc(condition) {
            seed.insert(key.clone(), condition.clone());
        } else if let Some(eq) = condition.get("$eq") {
            seed.insert(key.clone(), eq.clone());
        }
    }
    seed
}
