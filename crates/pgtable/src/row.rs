//! Flattening driver rows into positional JSON values.
//!
//! Hydration works on `Vec<serde_json::Value>`, so every column is converted
//! by its Postgres type: numbers and booleans stay native, dates, timestamps,
//! enum labels and numerics become their canonical text, and top-level
//! `json`/`jsonb` columns are handed over as JSON text for the hydrator to
//! parse. Domains decode as their base type and arrays element by element.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};

type BoxError = Box<dyn Error + Sync + Send>;

/// Extension trait for [`Row`] providing positional, decoded access.
pub trait RowExt {
    /// Typed column access, mapping failures to [`OrmError::Decode`].
    fn try_get_column<'a, T>(&'a self, idx: usize) -> OrmResult<T>
    where
        T: FromSql<'a>;

    /// Every column of the row, in select-list order.
    fn values(&self) -> OrmResult<Vec<Value>>;
}

impl RowExt for Row {
    fn try_get_column<'a, T>(&'a self, idx: usize) -> OrmResult<T>
    where
        T: FromSql<'a>,
    {
        self.try_get(idx).map_err(|e| {
            let column = self
                .columns()
                .get(idx)
                .map_or_else(|| idx.to_string(), |c| c.name().to_string());
            OrmError::decode(column, e.to_string())
        })
    }

    fn values(&self) -> OrmResult<Vec<Value>> {
        (0..self.len()).map(|idx| column_value(self, idx)).collect()
    }
}

/// Undecoded binary column value; accepts every type.
struct RawValue<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawValue(raw))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn column_value(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    match row.try_get_column::<Option<RawValue<'_>>>(idx)? {
        None => Ok(Value::Null),
        Some(RawValue(raw)) => decode(column.type_(), raw, false)
            .map_err(|e| OrmError::decode(column.name(), e.to_string())),
    }
}

/// Decode one non-null value. JSON inside an array is parsed in place, since
/// the hydrator only parses JSON text for scalar fields.
fn decode(ty: &Type, raw: &[u8], nested: bool) -> Result<Value, BoxError> {
    match ty.kind() {
        Kind::Enum(_) => return Ok(Value::String(std::str::from_utf8(raw)?.to_string())),
        Kind::Domain(base) => return decode(base, raw, nested),
        Kind::Array(member) => {
            let items = Vec::<Option<RawValue<'_>>>::from_sql(ty, raw)?;
            return items
                .into_iter()
                .map(|item| match item {
                    Some(RawValue(bytes)) => decode(member, bytes, true),
                    None => Ok(Value::Null),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array);
        }
        _ => {}
    }

    let value: Value = match *ty {
        Type::BOOL => bool::from_sql(ty, raw)?.into(),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.into(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            String::from_sql(ty, raw)?.into()
        }
        Type::JSON | Type::JSONB => {
            let json = Value::from_sql(ty, raw)?;
            if nested {
                json
            } else {
                Value::String(json.to_string())
            }
        }
        Type::UUID => Value::String(uuid::Uuid::from_sql(ty, raw)?.to_string()),
        Type::DATE => Value::String(NaiveDate::from_sql(ty, raw)?.to_string()),
        Type::TIMESTAMP => Value::String(
            NaiveDateTime::from_sql(ty, raw)?
                .format("%Y-%m-%d %H:%M:%S%.f")
                .to_string(),
        ),
        Type::TIMESTAMPTZ => Value::String(
            DateTime::<Utc>::from_sql(ty, raw)?
                .format("%Y-%m-%d %H:%M:%S%.f%:z")
                .to_string(),
        ),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => Value::String(rust_decimal::Decimal::from_sql(ty, raw)?.to_string()),
        _ => return Err(format!("unsupported column type {ty}").into()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Param;
    use bytes::BytesMut;
    use serde_json::json;
    use tokio_postgres::types::ToSql;

    fn wire(param: &str, ty: &Type) -> BytesMut {
        let mut out = BytesMut::new();
        Param::text(param).to_sql(ty, &mut out).unwrap();
        out
    }

    fn roundtrip(param: &str, ty: &Type) -> Value {
        decode(ty, &wire(param, ty), false).unwrap()
    }

    fn enum_type() -> Type {
        Type::new(
            "user_status".into(),
            0,
            Kind::Enum(vec!["active".into(), "disabled".into()]),
            "public".into(),
        )
    }

    #[test]
    fn scalars_keep_native_json_types() {
        assert_eq!(roundtrip("42", &Type::INT4), json!(42));
        assert_eq!(roundtrip("true", &Type::BOOL), json!(true));
        assert_eq!(roundtrip("2.5", &Type::FLOAT8), json!(2.5));
        assert_eq!(roundtrip("abc", &Type::TEXT), json!("abc"));
    }

    #[test]
    fn json_column_is_text_at_top_level() {
        assert_eq!(roundtrip(r#"{"a":1}"#, &Type::JSONB), json!(r#"{"a":1}"#));
    }

    #[test]
    fn enum_decodes_to_label() {
        assert_eq!(roundtrip("disabled", &enum_type()), json!("disabled"));
    }

    #[test]
    fn domain_decodes_as_base_type() {
        let email = Type::new("email".into(), 0, Kind::Domain(Type::TEXT), "public".into());
        assert_eq!(roundtrip("a@b.c", &email), json!("a@b.c"));
    }

    #[test]
    fn arrays_decode_per_element() {
        assert_eq!(
            roundtrip("{2024-01-02,NULL}", &Type::DATE_ARRAY),
            json!(["2024-01-02", null])
        );
        assert_eq!(
            roundtrip(
                "{67e55044-10b1-426f-9247-bb680e5fe0c8}",
                &Type::UUID_ARRAY
            ),
            json!(["67e55044-10b1-426f-9247-bb680e5fe0c8"])
        );
        assert_eq!(
            roundtrip(r#"{"{\"a\":1}"}"#, &Type::JSONB_ARRAY),
            json!([{"a": 1}])
        );
        let statuses = Type::new(
            "_user_status".into(),
            0,
            Kind::Array(enum_type()),
            "public".into(),
        );
        assert_eq!(
            roundtrip("{active,disabled}", &statuses),
            json!(["active", "disabled"])
        );
    }

    #[test]
    fn timestamptz_array_renders_canonical_text() {
        let value = roundtrip("{2024-01-02T03:04:05Z}", &Type::TIMESTAMPTZ_ARRAY);
        assert_eq!(value, json!(["2024-01-02 03:04:05+00:00"]));
    }

    #[cfg(feature = "rust_decimal")]
    #[test]
    fn numeric_decodes_to_text() {
        assert_eq!(roundtrip("10.50", &Type::NUMERIC), json!("10.50"));
    }

    #[test]
    fn unsupported_type_is_an_error() {
        assert!(decode(&Type::POINT, &[0; 16], false).is_err());
    }
}
