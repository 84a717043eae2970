use crate::coerce;
use crate::error::{OrmError, OrmResult};
use crate::ident::{self, Ident};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Transforms the canonical text of a coerced value into the bound parameter.
pub type Encoder = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Transforms a raw column value during hydration.
pub type Decoder = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Value type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Date,
    Json,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Json => "json",
        }
    }

    /// Whether `{from, to}` range filters apply to this type.
    pub fn is_rangeable(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field declaration, as written at schema registration.
///
/// ```ignore
/// Field::string("status").options(["active", "disabled"]);
/// Field::int("id").no_insert().no_update();
/// Field::json("title").keys(["en", "ka"]);
/// Field::string("password").encoder(|plain| md5(&plain));
/// ```
#[derive(Clone)]
#[must_use]
pub struct Field {
    name: String,
    column: Option<String>,
    ty: FieldType,
    array: bool,
    options: Option<Vec<Value>>,
    select: bool,
    insert: bool,
    update: bool,
    nullable: bool,
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
    keys: Option<Vec<String>>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            ty,
            array: false,
            options: None,
            select: true,
            insert: true,
            update: true,
            nullable: false,
            encoder: None,
            decoder: None,
            keys: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Json)
    }

    /// Storage column name, when it differs from the field name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Values are sequences of the field type (a Postgres array column).
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Restrict values to this set.
    pub fn options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn no_select(mut self) -> Self {
        self.select = false;
        self
    }

    pub fn no_insert(mut self) -> Self {
        self.insert = false;
        self
    }

    pub fn no_update(mut self) -> Self {
        self.update = false;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn encoder(mut self, f: impl Fn(String) -> String + Send + Sync + 'static) -> Self {
        self.encoder = Some(Arc::new(f));
        self
    }

    pub fn decoder(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.decoder = Some(Arc::new(f));
        self
    }

    /// Allowed JSON sub-keys for ordering (`field.key`).
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resolve(self) -> OrmResult<FieldSchema> {
        if self.name.is_empty() {
            return Err(OrmError::schema("Field name cannot be empty"));
        }
        if self.name.contains('.') {
            return Err(OrmError::schema(format!(
                "Field name '{}' cannot contain '.'",
                self.name
            )));
        }
        let column = Ident::new(self.column.as_deref().unwrap_or(&self.name))?;

        if let Some(keys) = &self.keys {
            if self.ty != FieldType::Json {
                return Err(OrmError::schema(format!(
                    "Field '{}' declares JSON keys but is of type {}",
                    self.name, self.ty
                )));
            }
            for key in keys {
                ident::validate_json_key(&self.name, key)?;
            }
        }

        let mut field = FieldSchema {
            name: self.name,
            column,
            ty: self.ty,
            array: self.array,
            options: None,
            select: self.select,
            insert: self.insert,
            update: self.update,
            nullable: self.nullable,
            encoder: self.encoder,
            decoder: self.decoder,
            keys: self.keys,
        };

        // Options are compared on canonical text, so cast them once here.
        if let Some(options) = self.options {
            let canonical = options
                .iter()
                .map(|option| coerce::cast(&field, option))
                .collect::<OrmResult<Vec<_>>>()
                .map_err(|e| {
                    OrmError::schema(format!("Invalid option for field '{}': {e}", field.name))
                })?;
            field.options = Some(canonical);
        }

        Ok(field)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A validated field of a [`TableSchema`](super::TableSchema).
#[derive(Clone)]
pub struct FieldSchema {
    name: String,
    column: Ident,
    ty: FieldType,
    array: bool,
    options: Option<Vec<String>>,
    select: bool,
    insert: bool,
    update: bool,
    nullable: bool,
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
    keys: Option<Vec<String>>,
}

impl FieldSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Canonical text of the allowed options.
    pub fn options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }

    pub fn is_selectable(&self) -> bool {
        self.select
    }

    pub fn is_insertable(&self) -> bool {
        self.insert
    }

    pub fn is_updatable(&self) -> bool {
        self.update
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn encoder(&self) -> Option<&Encoder> {
        self.encoder.as_ref()
    }

    pub fn decoder(&self) -> Option<&Decoder> {
        self.decoder.as_ref()
    }

    pub fn keys(&self) -> Option<&[String]> {
        self.keys.as_deref()
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("type", &self.ty)
            .field("array", &self.array)
            .field("options", &self.options)
            .field("select", &self.select)
            .field("insert", &self.insert)
            .field("update", &self.update)
            .field("nullable", &self.nullable)
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .field("keys", &self.keys)
            .finish()
    }
}
