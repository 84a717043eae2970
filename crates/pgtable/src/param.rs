//! Text-rendered bind values.
//!
//! Coerced values are always carried as canonical text. When a statement is
//! executed, [`Param`] converts that text into the wire format of whatever type
//! Postgres inferred for the placeholder, so `"5"` binds to an `integer` column
//! and `{a,b}` binds to a `text[]` column without the caller spelling out casts.

use crate::coerce;
use crate::literal;
use bytes::BytesMut;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, Kind, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// A single positional parameter: canonical text or SQL `NULL`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Param(Option<String>);

impl Param {
    pub fn text(value: impl Into<String>) -> Self {
        Param(Some(value.into()))
    }

    pub fn null() -> Self {
        Param(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param(Some(value))
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param(Some(value.to_string()))
    }
}

impl From<Option<String>> for Param {
    fn from(value: Option<String>) -> Self {
        Param(value)
    }
}

impl PartialEq<&str> for Param {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_deref() == Some(*other)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(text) => write!(f, "{text:?}"),
            None => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(text) => f.write_str(text),
            None => f.write_str("NULL"),
        }
    }
}

impl ToSql for Param {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match &self.0 {
            None => Ok(IsNull::Yes),
            Some(text) => encode_text(text, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn encode_text(text: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match ty.kind() {
        Kind::Array(_) => {
            let elements = literal::parse_array(text)
                .ok_or_else(|| format!("'{text}' is not an array literal"))?;
            let elements: Vec<Param> = elements.into_iter().map(Param).collect();
            return elements.to_sql(ty, out);
        }
        // The binary form of an enum value is its label.
        Kind::Enum(labels) => {
            if !labels.iter().any(|label| label == text) {
                return Err(format!("'{text}' is not a label of enum {ty}").into());
            }
            out.extend_from_slice(text.as_bytes());
            return Ok(IsNull::No);
        }
        Kind::Domain(base) => return encode_text(text, base, out),
        _ => {}
    }

    match *ty {
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            text.to_sql(ty, out)
        }
        Type::INT2 => text.trim().parse::<i16>()?.to_sql(ty, out),
        Type::INT4 => text.trim().parse::<i32>()?.to_sql(ty, out),
        Type::INT8 => text.trim().parse::<i64>()?.to_sql(ty, out),
        Type::FLOAT4 => text.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => text.trim().parse::<f64>()?.to_sql(ty, out),
        Type::BOOL => parse_bool(text)
            .ok_or_else(|| format!("'{text}' is not a boolean"))?
            .to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(text)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(text.trim())?.to_sql(ty, out),
        Type::DATE => coerce::parse_date(text)
            .ok_or_else(|| format!("'{text}' is not a date"))?
            .local
            .date()
            .to_sql(ty, out),
        Type::TIMESTAMP => coerce::parse_date(text)
            .ok_or_else(|| format!("'{text}' is not a timestamp"))?
            .local
            .to_sql(ty, out),
        Type::TIMESTAMPTZ => coerce::parse_date(text)
            .ok_or_else(|| format!("'{text}' is not a timestamp"))?
            .to_utc()
            .to_sql(ty, out),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => text
            .trim()
            .parse::<rust_decimal::Decimal>()?
            .to_sql(ty, out),
        _ => Err(format!("cannot bind text parameter to type {ty}").into()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "y" | "yes" | "on" => Some(true),
        "f" | "false" | "0" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}
