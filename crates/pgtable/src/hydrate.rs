//! Positional row slices to [`Record`]s.

use crate::error::{OrmError, OrmResult};
use crate::literal;
use crate::record::Record;
use crate::schema::{FieldSchema, FieldType, TableSchema};
use serde_json::Value;

/// Build a [`Record`] from the slice of a row that belongs to `schema`.
///
/// Values are consumed in the same order [`TableSchema::select_columns`] emits
/// columns. A slice shorter than the table's column count is an offset
/// bookkeeping error and fails with [`OrmError::Hydration`].
pub fn create(schema: &TableSchema, slice: &[Value]) -> OrmResult<Record> {
    let expected = schema.column_count();
    if slice.len() < expected {
        return Err(OrmError::hydration(format!(
            "table '{}' expects {expected} values, row slice has {}",
            schema.display_name(),
            slice.len()
        )));
    }

    let mut record = Record::with_capacity(expected);
    for (field, raw) in schema.selectable().zip(slice) {
        record.push(field.name(), decode(field, raw.clone())?);
    }
    Ok(record)
}

fn decode(field: &FieldSchema, raw: Value) -> OrmResult<Value> {
    let value = if field.is_array() {
        split_array(field, raw)?
    } else {
        raw
    };

    if let Some(decoder) = field.decoder() {
        return Ok(decoder(value));
    }

    match value {
        Value::String(text) if field.field_type() == FieldType::Json && !field.is_array() => {
            serde_json::from_str(&text).map_err(|e| OrmError::decode(field.name(), e.to_string()))
        }
        other => Ok(other),
    }
}

/// Brace-list text becomes a sequence of strings; decoded arrays pass through.
fn split_array(field: &FieldSchema, raw: Value) -> OrmResult<Value> {
    match raw {
        Value::String(text) => {
            let elements = literal::parse_array(&text).ok_or_else(|| {
                OrmError::decode(field.name(), format!("'{text}' is not an array literal"))
            })?;
            Ok(Value::Array(
                elements
                    .into_iter()
                    .map(|e| e.map_or(Value::Null, Value::String))
                    .collect(),
            ))
        }
        other => Ok(other),
    }
}

/// `true` when every value of a slice is null, i.e. a LEFT JOIN found no row.
pub(crate) fn is_unmatched(slice: &[Value]) -> bool {
    slice.iter().all(Value::is_null)
}
