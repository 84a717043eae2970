//! Input value coercion.
//!
//! Every payload value passes through [`coerce`] before it becomes a bind
//! parameter: null handling, a cast by [`FieldType`], option-set membership, and
//! finally the field's encoder. The result is always canonical text.

use crate::error::{OrmError, OrmResult};
use crate::literal;
use crate::param::Param;
use crate::schema::{FieldSchema, FieldType};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Coerce a payload value for INSERT/UPDATE.
///
/// Array fields require a sequence and are rendered as a brace-delimited literal.
pub fn coerce(field: &FieldSchema, raw: &Value) -> OrmResult<Param> {
    if !field.is_array() {
        return coerce_scalar(field, raw);
    }
    if raw.is_null() && field.is_nullable() {
        return Ok(Param::null());
    }
    let items = expect_sequence(field, raw)?;
    let elements = items
        .iter()
        .map(|item| coerce_scalar(field, item).map(Param::into_inner))
        .collect::<OrmResult<Vec<_>>>()?;
    Ok(Param::text(literal::format_array(&elements)))
}

/// Coerce one value (or one element of an array field).
pub fn coerce_scalar(field: &FieldSchema, raw: &Value) -> OrmResult<Param> {
    if raw.is_null() {
        if field.is_nullable() {
            return Ok(Param::null());
        }
        return Err(OrmError::invalid_value(field.name(), "null is not allowed"));
    }

    let text = cast(field, raw)?;

    if let Some(options) = field.options() {
        if !options.iter().any(|o| *o == text) {
            return Err(OrmError::invalid_value(
                field.name(),
                format!("'{text}' is not one of [{}]", options.join(", ")),
            ));
        }
    }

    match field.encoder() {
        Some(encode) => Ok(Param::text(encode(text))),
        None => Ok(Param::text(text)),
    }
}

pub(crate) fn expect_sequence<'a>(field: &FieldSchema, raw: &'a Value) -> OrmResult<&'a [Value]> {
    match raw {
        Value::Array(items) => Ok(items),
        other => Err(OrmError::invalid_value(
            field.name(),
            format!("expected a list, got {}", kind_of(other)),
        )),
    }
}

/// Cast a non-null value to the canonical text of the field type.
pub(crate) fn cast(field: &FieldSchema, raw: &Value) -> OrmResult<String> {
    let name = field.name();
    match field.field_type() {
        FieldType::String => Ok(match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        FieldType::Int => cast_int(raw)
            .map(|n| n.to_string())
            .ok_or_else(|| OrmError::invalid_value(name, format!("{raw} is not an integer"))),
        FieldType::Float => cast_float(raw)
            .map(|f| f.to_string())
            .ok_or_else(|| OrmError::invalid_float(name, format!("{raw} is not a number"))),
        FieldType::Bool => Ok(truthy(raw).to_string()),
        FieldType::Json => serde_json::to_string(raw)
            .map_err(|e| OrmError::invalid_value(name, e.to_string())),
        FieldType::Date => {
            let parsed = match raw {
                Value::String(s) => parse_date(s),
                Value::Number(n) => n.as_f64().and_then(from_timestamp),
                _ => None,
            };
            parsed
                .map(|d| d.render())
                .ok_or_else(|| OrmError::invalid_date(name, format!("{raw} is not a date")))
        }
    }
}

fn cast_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn cast_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// A parsed date: wall-clock time plus the offset, when the input carried one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateValue {
    pub(crate) local: NaiveDateTime,
    pub(crate) offset: Option<FixedOffset>,
}

impl DateValue {
    /// `YYYY-MM-DD HH:MM:SS[.ffffff][+HH:MM]`
    pub(crate) fn render(&self) -> String {
        let base = self.local.format("%Y-%m-%d %H:%M:%S%.f").to_string();
        match self.offset {
            Some(offset) => format!("{base}{offset}"),
            None => base,
        }
    }

    /// Naive values are taken to be UTC.
    pub(crate) fn to_utc(self) -> DateTime<Utc> {
        match self.offset {
            Some(offset) => match offset.from_local_datetime(&self.local).single() {
                Some(dt) => dt.with_timezone(&Utc),
                None => Utc.from_utc_datetime(&self.local),
            },
            None => Utc.from_utc_datetime(&self.local),
        }
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d"];

/// Permissive date parser.
pub(crate) fn parse_date(text: &str) -> Option<DateValue> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(DateValue {
            local: dt.naive_local(),
            offset: Some(*dt.offset()),
        });
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(DateValue {
                local: dt.naive_local(),
                offset: Some(*dt.offset()),
            });
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
            return Some(DateValue {
                local,
                offset: None,
            });
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(DateValue {
                local: date.and_hms_opt(0, 0, 0)?,
                offset: None,
            });
        }
    }
    None
}

fn from_timestamp(secs: f64) -> Option<DateValue> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    let dt = DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))?;
    Some(DateValue {
        local: dt.naive_utc(),
        offset: Some(FixedOffset::east_opt(0)?),
    })
}
