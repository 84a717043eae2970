//! Renderable SQL fragments and the builders that produce them.
//!
//! A [`Clause`] pairs an ordered list of rendered fragments with the ordered
//! values they bind. Fragments mark parameter slots with [`PLACEHOLDER`]; the
//! slots are numbered (`$1`, `$2`, ...) only when the clause is rendered, so
//! clauses compose freely inside a larger [`Statement`](crate::Statement).
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{Combinator, build_update, build_where};
//! use serde_json::json;
//!
//! let set = build_update(&users, &json!({"status": "disabled"}))?;
//! assert_eq!(set.render(None), r#""status"=$1"#);
//!
//! let filter = build_where(&users, &json!({"id": {"from": 5}}), Combinator::And)?;
//! assert_eq!(filter.render(None), r#""users"."id">=$1"#);
//! # Ok::<(), pgtable::OrmError>(())
//! ```

mod build;


pub use build::{Combinator, OrderRequest, build_insert, build_order, build_update, build_where};
pub(crate) use build::normalize_method;

use crate::param::Param;
use std::borrow::Cow;

/// Marks a parameter slot inside fragments and patterns.
pub const PLACEHOLDER: &str = "$?";

/// An immutable (fragments, values) pair.
#[derive(Debug, Clone)]
#[must_use]
pub struct Clause {
    fields: Vec<String>,
    values: Vec<Param>,
    pattern: Cow<'static, str>,
    separator: Cow<'static, str>,
    empty: Cow<'static, str>,
}

impl Clause {
    /// Fragments rendered as-is, comma separated, empty when there are none.
    pub fn new(fields: Vec<String>, values: Vec<Param>) -> Self {
        Self {
            fields,
            values,
            pattern: Cow::Borrowed("{name}"),
            separator: Cow::Borrowed(", "),
            empty: Cow::Borrowed(""),
        }
    }

    /// Pattern applied to every fragment; `{name}` is replaced by the fragment.
    pub fn with_pattern(mut self, pattern: impl Into<Cow<'static, str>>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<Cow<'static, str>>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Text rendered when there are no fragments.
    pub fn with_empty(mut self, empty: impl Into<Cow<'static, str>>) -> Self {
        self.empty = empty.into();
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Render with `$1..` placeholders, optionally overriding the pattern.
    pub fn render(&self, pattern: Option<&str>) -> String {
        self.render_from(pattern, 1).0
    }

    /// Render with placeholders numbered from `start`; also returns the next free index.
    pub fn render_from(&self, pattern: Option<&str>, start: usize) -> (String, usize) {
        number_placeholders(&self.template(pattern), start)
    }

    /// Rendered text with placeholders left unnumbered.
    pub fn template(&self, pattern: Option<&str>) -> String {
        if self.fields.is_empty() {
            return self.empty.to_string();
        }
        let pattern = pattern.unwrap_or(&self.pattern);
        self.fields
            .iter()
            .map(|field| pattern.replace("{name}", field))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    pub fn values(&self) -> &[Param] {
        &self.values
    }

    /// Values followed by one trailing value, e.g. the primary key after UPDATE's SET values.
    pub fn values_with(&self, extra: impl Into<Param>) -> Vec<Param> {
        let mut values = Vec::with_capacity(self.values.len() + 1);
        values.extend(self.values.iter().cloned());
        values.push(extra.into());
        values
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Param>) {
        (self.fields, self.values)
    }
}

/// Replace each [`PLACEHOLDER`] with `$n`, counting from `start`.
pub(crate) fn number_placeholders(template: &str, start: usize) -> (String, usize) {
    let mut out = String::with_capacity(template.len() + 8);
    let mut next = start;
    let mut rest = template;
    while let Some(pos) = rest.find(PLACEHOLDER) {
        out.push_str(&rest[..pos]);
        out.push('$');
        out.push_str(&next.to_string());
        next += 1;
        rest = &rest[pos + PLACEHOLDER.len()..];
    }
    out.push_str(rest);
    (out, next)
}
