use super::field::{Field, FieldSchema};
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, dotted};
use std::collections::HashMap;
use std::sync::Arc;

/// A declared one-to-one relation rendered as `LEFT JOIN`.
#[derive(Debug, Clone)]
pub struct Join {
    name: String,
    table: Arc<TableSchema>,
    field: String,
    column: Ident,
}

impl Join {
    /// Name the related record is attached under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TableSchema {
        &self.table
    }

    /// Local foreign-key field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Local foreign-key column.
    pub fn column(&self) -> &Ident {
        &self.column
    }
}

/// The shape of one table: ordered fields, primary key and joins.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TableSchema {
    namespace: Option<Ident>,
    name: Ident,
    primary_key: Ident,
    fields: Vec<FieldSchema>,
    index: HashMap<String, usize>,
    joins: Vec<Join>,
    unique_constraints: HashMap<String, String>,
}

impl TableSchema {
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(name)
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn namespace(&self) -> Option<&Ident> {
        self.namespace.as_ref()
    }

    pub fn primary_key(&self) -> &Ident {
        &self.primary_key
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Joins in declaration order.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn join(&self, name: &str) -> Option<&Join> {
        self.joins.iter().find(|j| j.name == name)
    }

    /// Fields that take part in SELECT lists and row offsets.
    pub fn selectable(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.is_selectable())
    }

    /// Width of this table's slice in a result row.
    pub fn column_count(&self) -> usize {
        self.selectable().count()
    }

    /// `"namespace"."table"`, or `"table"` without a namespace.
    pub fn qualified_name(&self) -> String {
        self.qualified_name_or(None)
    }

    /// Like [`qualified_name`](Self::qualified_name), falling back to `default` when the
    /// schema declares no namespace.
    pub fn qualified_name_or(&self, default: Option<&Ident>) -> String {
        match self.namespace.as_ref().or(default) {
            Some(ns) => dotted(ns, &self.name),
            None => self.name.quoted(),
        }
    }

    /// Unquoted `namespace.table`, for logs and messages.
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.to_string(),
        }
    }

    /// `"table"."column"` for a declared field.
    pub fn column_ref(&self, field: &str) -> OrmResult<String> {
        let field = self
            .field(field)
            .ok_or_else(|| OrmError::unknown_field(field))?;
        Ok(dotted(&self.name, field.column()))
    }

    pub(crate) fn column_of(&self, field: &FieldSchema) -> String {
        dotted(&self.name, field.column())
    }

    /// `"table"."<primary key>"`.
    pub fn primary_key_ref(&self) -> String {
        dotted(&self.name, &self.primary_key)
    }

    /// Comma-joined qualified selectable columns, in declaration order.
    pub fn select_columns(&self) -> String {
        self.selectable()
            .map(|f| self.column_of(f))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Map a violated unique constraint back to a declared field name.
    ///
    /// Explicit [`TableSchemaBuilder::unique_constraint`] mappings win; otherwise the
    /// `<table>_unique_<field>_index` naming convention is tried against field names
    /// and storage columns.
    pub fn field_for_constraint(&self, constraint: &str) -> Option<&str> {
        if let Some(field) = self.unique_constraints.get(constraint) {
            return Some(field.as_str());
        }
        let rest = constraint
            .strip_prefix(self.name.as_str())?
            .strip_prefix("_unique_")?
            .strip_suffix("_index")?;
        self.fields
            .iter()
            .find(|f| f.name() == rest || f.column().as_str() == rest)
            .map(|f| f.name())
    }
}

/// Builder for [`TableSchema`]; all validation happens in [`build`](Self::build).
#[must_use]
pub struct TableSchemaBuilder {
    name: String,
    namespace: Option<String>,
    primary_key: String,
    fields: Vec<Field>,
    joins: Vec<(String, Arc<TableSchema>, String)>,
    unique_constraints: Vec<(String, String)>,
}

impl TableSchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            primary_key: "id".to_string(),
            fields: Vec::new(),
            joins: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Primary-key column (default `id`).
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Declare `LEFT JOIN table ON table.pk = self.<field>`, hydrated under `name`.
    pub fn join(
        mut self,
        name: impl Into<String>,
        table: Arc<TableSchema>,
        field: impl Into<String>,
    ) -> Self {
        self.joins.push((name.into(), table, field.into()));
        self
    }

    /// Map a database constraint name to the field it guards.
    pub fn unique_constraint(
        mut self,
        constraint: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        self.unique_constraints
            .push((constraint.into(), field.into()));
        self
    }

    pub fn build(self) -> OrmResult<TableSchema> {
        let name = Ident::new(self.name)?;
        let namespace = self.namespace.map(Ident::new).transpose()?;
        let primary_key = Ident::new(self.primary_key)?;

        let mut fields = Vec::with_capacity(self.fields.len());
        let mut index = HashMap::with_capacity(self.fields.len());
        for field in self.fields {
            let field = field.resolve()?;
            if index.insert(field.name().to_string(), fields.len()).is_some() {
                return Err(OrmError::schema(format!(
                    "Duplicate field '{}' in table '{name}'",
                    field.name()
                )));
            }
            fields.push(field);
        }

        let mut joins: Vec<Join> = Vec::with_capacity(self.joins.len());
        for (join_name, table, field_name) in self.joins {
            Ident::new(join_name.as_str()).map_err(|_| {
                OrmError::schema(format!("Invalid join name '{join_name}' in table '{name}'"))
            })?;
            if index.contains_key(&join_name) || joins.iter().any(|j| j.name == join_name) {
                return Err(OrmError::schema(format!(
                    "Join name '{join_name}' collides with another field or join in table '{name}'"
                )));
            }
            let column = match index.get(&field_name) {
                Some(&i) => fields[i].column().clone(),
                None => {
                    return Err(OrmError::schema(format!(
                        "Join '{join_name}' references unknown field '{field_name}' in table '{name}'"
                    )));
                }
            };
            joins.push(Join {
                name: join_name,
                table,
                field: field_name,
                column,
            });
        }

        let mut unique_constraints = HashMap::with_capacity(self.unique_constraints.len());
        for (constraint, field) in self.unique_constraints {
            if !index.contains_key(&field) {
                return Err(OrmError::schema(format!(
                    "Unique constraint '{constraint}' references unknown field '{field}'"
                )));
            }
            unique_constraints.insert(constraint, field);
        }

        Ok(TableSchema {
            namespace,
            name,
            primary_key,
            fields,
            index,
            joins,
            unique_constraints,
        })
    }
}
