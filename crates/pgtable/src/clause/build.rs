use super::{Clause, PLACEHOLDER};
use crate::coerce::{coerce, coerce_scalar, expect_sequence};
use crate::error::{OrmError, OrmResult};
use crate::param::Param;
use crate::schema::{FieldSchema, FieldType, TableSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How predicates within a group are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    pub(crate) fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Ordering requested by a caller, e.g. `{"field": "title.en", "method": "desc"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl OrderRequest {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            method: None,
        }
    }

    pub fn asc(mut self) -> Self {
        self.method = Some("asc".to_string());
        self
    }

    pub fn desc(mut self) -> Self {
        self.method = Some("desc".to_string());
        self
    }
}

fn payload_object(payload: &Value) -> OrmResult<&Map<String, Value>> {
    payload.as_object().ok_or(OrmError::MissingInput)
}

/// Collect `(column, value)` for every present field allowed by `allowed`.
fn collect_values(
    schema: &TableSchema,
    payload: &Value,
    allowed: impl Fn(&FieldSchema) -> bool,
) -> OrmResult<(Vec<String>, Vec<Param>)> {
    let data = payload_object(payload)?;
    let mut fields = Vec::new();
    let mut values = Vec::new();
    for field in schema.fields() {
        if !allowed(field) {
            continue;
        }
        let Some(raw) = data.get(field.name()) else {
            continue;
        };
        values.push(coerce(field, raw)?);
        fields.push(field.column().quoted());
    }
    if values.is_empty() {
        return Err(OrmError::MissingInput);
    }
    Ok((fields, values))
}

/// Column list and values for `INSERT`.
///
/// Render the columns with [`Clause::render`] and the placeholders with
/// `render(Some("$?"))`.
pub fn build_insert(schema: &TableSchema, payload: &Value) -> OrmResult<Clause> {
    let (fields, values) = collect_values(schema, payload, FieldSchema::is_insertable)?;
    Ok(Clause::new(fields, values))
}

/// `"column"=$n` assignments for `UPDATE ... SET`.
pub fn build_update(schema: &TableSchema, payload: &Value) -> OrmResult<Clause> {
    let (fields, values) = collect_values(schema, payload, FieldSchema::is_updatable)?;
    Ok(Clause::new(fields, values).with_pattern("{name}=$?"))
}

/// Predicates for every declared field present in `payload`, joined by `combinator`.
///
/// Keys that are not declared fields are ignored. An empty payload renders `1=1`.
pub fn build_where(
    schema: &TableSchema,
    payload: &Value,
    combinator: Combinator,
) -> OrmResult<Clause> {
    let data = payload_object(payload)?;
    let mut fields = Vec::new();
    let mut values = Vec::new();

    for field in schema.fields() {
        let Some(raw) = data.get(field.name()) else {
            continue;
        };
        push_predicates(schema, field, raw, &mut fields, &mut values)?;
    }

    Ok(Clause::new(fields, values)
        .with_separator(combinator.separator())
        .with_empty("1=1"))
}

fn push_predicates(
    schema: &TableSchema,
    field: &FieldSchema,
    raw: &Value,
    fields: &mut Vec<String>,
    values: &mut Vec<Param>,
) -> OrmResult<()> {
    let column = schema.column_of(field);

    if field.is_array() {
        for item in expect_sequence(field, raw)? {
            fields.push(format!("{PLACEHOLDER} = ANY({column})"));
            values.push(coerce_scalar(field, item)?);
        }
        return Ok(());
    }

    if raw.is_null() {
        fields.push(format!("{column} IS NULL"));
        return Ok(());
    }

    if field.field_type() == FieldType::Json {
        let needle = match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        fields.push(format!("{column}::text ILIKE {PLACEHOLDER}"));
        values.push(Param::text(format!("%{needle}%")));
        return Ok(());
    }

    match raw {
        Value::Object(range) => {
            if !field.field_type().is_rangeable() {
                return Err(OrmError::invalid_value(
                    field.name(),
                    format!(
                        "range filters need an int, float or date field, not {}",
                        field.field_type()
                    ),
                ));
            }
            let from = range.get("from");
            let to = range.get("to");
            if from.is_none() && to.is_none() {
                return Err(OrmError::invalid_value(
                    field.name(),
                    "range filter needs 'from' and/or 'to'",
                ));
            }
            if let Some(from) = from {
                fields.push(format!("{column}>={PLACEHOLDER}"));
                values.push(coerce_scalar(field, from)?);
            }
            if let Some(to) = to {
                fields.push(format!("{column}<={PLACEHOLDER}"));
                values.push(coerce_scalar(field, to)?);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                fields.push("1=0".to_string());
                return Ok(());
            }
            let slots = vec![PLACEHOLDER; items.len()].join(", ");
            fields.push(format!("{column} IN ({slots})"));
            for item in items {
                values.push(coerce_scalar(field, item)?);
            }
        }
        _ if field.options().is_some() || field.field_type() != FieldType::String => {
            fields.push(format!("{column}={PLACEHOLDER}"));
            values.push(coerce_scalar(field, raw)?);
        }
        _ => {
            let needle = coerce_scalar(field, raw)?;
            fields.push(format!("{column} ILIKE {PLACEHOLDER}"));
            values.push(Param::text(format!("%{needle}%")));
        }
    }
    Ok(())
}

/// `ORDER BY` expression for one field.
///
/// `order` wins over the positional `field`/`method`. A JSON field must be
/// addressed as `field.key`, where `key` is one of its declared keys. Without a
/// method the expression carries no direction.
pub fn build_order(
    schema: &TableSchema,
    field: Option<&str>,
    method: Option<&str>,
    order: Option<&OrderRequest>,
) -> OrmResult<String> {
    let requested = order
        .and_then(|o| o.field.as_deref())
        .or(field)
        .filter(|f| !f.is_empty())
        .ok_or(OrmError::MissingField)?;
    let method = order
        .and_then(|o| o.method.as_deref())
        .or(method)
        .filter(|m| !m.trim().is_empty());

    let (name, key) = match requested.split_once('.') {
        Some((name, key)) => (name, Some(key)),
        None => (requested, None),
    };
    let field = schema
        .field(name)
        .ok_or_else(|| OrmError::unknown_field(name))?;
    let mut expr = schema.column_of(field);

    if field.field_type() == FieldType::Json {
        let keys = field.keys().ok_or_else(|| OrmError::missing_config(name))?;
        let key = key.ok_or(OrmError::MissingField)?;
        if !keys.iter().any(|k| k == key) {
            return Err(OrmError::unknown_field(requested));
        }
        expr.push_str("->'");
        expr.push_str(key);
        expr.push('\'');
    } else if key.is_some() {
        return Err(OrmError::unknown_field(requested));
    }

    match method {
        None => Ok(expr),
        Some(method) => {
            let direction = normalize_method(method).ok_or_else(|| {
                OrmError::invalid_value(name, format!("invalid order method '{method}'"))
            })?;
            Ok(format!("{expr} {direction}"))
        }
    }
}

pub(crate) fn normalize_method(method: &str) -> Option<&'static str> {
    let method = method.trim();
    if method.eq_ignore_ascii_case("asc") {
        Some("ASC")
    } else if method.eq_ignore_ascii_case("desc") {
        Some("DESC")
    } else {
        None
    }
}

impl TableSchema {
    /// See [`build_insert`].
    pub fn insert_clause(&self, payload: &Value) -> OrmResult<Clause> {
        build_insert(self, payload)
    }

    /// See [`build_update`].
    pub fn update_clause(&self, payload: &Value) -> OrmResult<Clause> {
        build_update(self, payload)
    }

    /// See [`build_where`].
    pub fn where_clause(&self, payload: &Value, combinator: Combinator) -> OrmResult<Clause> {
        build_where(self, payload, combinator)
    }

    /// See [`build_order`].
    pub fn order_clause(
        &self,
        field: Option<&str>,
        method: Option<&str>,
        order: Option<&OrderRequest>,
    ) -> OrmResult<String> {
        build_order(self, field, method, order)
    }
}
