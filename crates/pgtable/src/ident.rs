//! SQL identifier handling.
//!
//! Every schema, table and column name that ends up in generated SQL goes through
//! [`Ident`]. Names are validated once, at schema registration, against
//! `[A-Za-z_][A-Za-z0-9_$]*` and always rendered double-quoted.
//!
//! # Example
//! ```ignore
//! use pgtable::Ident;
//!
//! let t = Ident::new("users")?;
//! assert_eq!(t.quoted(), r#""users""#);
//! # Ok::<(), pgtable::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;

/// A validated SQL identifier (schema, table, or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    /// Validate a bare identifier.
    pub fn new(name: impl Into<String>) -> OrmResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        match chars.next() {
            None => return Err(OrmError::schema("Identifier cannot be empty")),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(c) => {
                return Err(OrmError::schema(format!(
                    "Invalid identifier start character '{c}' in '{name}'"
                )));
            }
        }
        if let Some(c) = chars.find(|&c| !(c == '_' || c == '$' || c.is_ascii_alphanumeric())) {
            return Err(OrmError::schema(format!(
                "Invalid character '{c}' in identifier '{name}'"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render as a double-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_quoted(&mut out);
        out
    }

    pub(crate) fn write_quoted(&self, out: &mut String) {
        // Validation rules out '"', so no escaping is needed.
        out.push('"');
        out.push_str(&self.0);
        out.push('"');
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `"a"."b"` from two identifiers.
pub(crate) fn dotted(left: &Ident, right: &Ident) -> String {
    let mut out = String::with_capacity(left.0.len() + right.0.len() + 5);
    left.write_quoted(&mut out);
    out.push('.');
    right.write_quoted(&mut out);
    out
}

/// Validate a JSON sub-key used in `->'key'` expressions.
pub(crate) fn validate_json_key(field: &str, key: &str) -> OrmResult<()> {
    if key.is_empty() {
        return Err(OrmError::schema(format!(
            "Field '{field}' declares an empty JSON key"
        )));
    }
    if let Some(c) = key
        .chars()
        .find(|&c| !(c == '_' || c == '-' || c.is_alphanumeric()))
    {
        return Err(OrmError::schema(format!(
            "Invalid character '{c}' in JSON key '{key}' of field '{field}'"
        )));
    }
    Ok(())
}
