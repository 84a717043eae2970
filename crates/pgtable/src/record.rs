//! Hydrated rows.

use crate::error::{OrmError, OrmResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One hydrated row: field values in declaration order plus joined records.
///
/// A join with no matching related row is present as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
    joins: Vec<(String, Option<Record>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(fields: usize) -> Self {
        Self {
            values: Vec::with_capacity(fields),
            joins: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, value: Value) {
        self.values.push((field.into(), value));
    }

    /// Attach a joined record under `name`.
    pub fn attach(&mut self, name: impl Into<String>, record: Option<Record>) {
        self.joins.push((name.into(), record));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find_map(|(name, value)| (name == field).then_some(value))
    }

    /// Remove a field's value, leaving `Null` in its place.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        self.values
            .iter_mut()
            .find_map(|(name, value)| (name == field).then(|| value.take()))
    }

    /// Deserialize one field's value.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> OrmResult<T> {
        let value = self.get(field).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| OrmError::decode(field, e.to_string()))
    }

    /// The joined record, or `None` when the join is undeclared or unmatched.
    pub fn join(&self, name: &str) -> Option<&Record> {
        self.joins
            .iter()
            .find_map(|(n, record)| (n == name).then_some(record.as_ref()))
            .flatten()
    }

    pub fn has_join(&self, name: &str) -> bool {
        self.joins.iter().any(|(n, _)| n == name)
    }

    /// Convert a joined record into `T`.
    pub fn joined<T: FromRecord>(&self, name: &str) -> OrmResult<Option<T>> {
        self.join(name).cloned().map(T::from_record).transpose()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A JSON object of the fields, with each join nested under its name.
    pub fn into_json(self) -> Value {
        let mut map = Map::with_capacity(self.values.len() + self.joins.len());
        for (name, value) in self.values {
            map.insert(name, value);
        }
        for (name, record) in self.joins {
            map.insert(name, record.map_or(Value::Null, Record::into_json));
        }
        Value::Object(map)
    }

    /// Deserialize the whole record (joins included) through serde.
    pub fn deserialize<T: DeserializeOwned>(self) -> OrmResult<T> {
        serde_json::from_value(self.into_json()).map_err(|e| OrmError::hydration(e.to_string()))
    }
}

/// Conversion from a hydrated [`Record`] into an application type.
///
/// ```ignore
/// struct User { id: i64, name: String, group: Option<Group> }
///
/// impl FromRecord for User {
///     fn from_record(record: Record) -> OrmResult<Self> {
///         Ok(User {
///             id: record.get_as("id")?,
///             name: record.get_as("name")?,
///             group: record.joined("group")?,
///         })
///     }
/// }
/// ```
///
/// Types that already implement `Deserialize` can forward to
/// [`Record::deserialize`].
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> OrmResult<Self>;
}

impl FromRecord for Record {
    fn from_record(record: Record) -> OrmResult<Self> {
        Ok(record)
    }
}

impl FromRecord for Value {
    fn from_record(record: Record) -> OrmResult<Self> {
        Ok(record.into_json())
    }
}
