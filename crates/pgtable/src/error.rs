//! Error types for pgtable

use thiserror::Error;

/// Result type alias for pgtable operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for clause building, hydration and execution.
#[derive(Debug, Error)]
pub enum OrmError {
    /// No usable input was supplied (null payload, nothing to insert/update).
    #[error("Missing input")]
    MissingInput,

    /// An operation needed a field name and none was given.
    #[error("Missing field")]
    MissingField,

    /// A field (or JSON sub-key) is not declared on the schema.
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// The schema lacks the metadata required for the requested operation.
    #[error("Missing config for field '{field}'")]
    MissingConfig { field: String },

    /// A value failed a cast, option-membership or shape check.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A value could not be parsed as a float.
    #[error("Invalid float for field '{field}': {message}")]
    InvalidFloat { field: String, message: String },

    /// A value could not be parsed as a date.
    #[error("Invalid date for field '{field}': {message}")]
    InvalidDate { field: String, message: String },

    /// Schema registration rejected a declaration.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A row did not match the offsets planned for it.
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// Statement or pagination misuse.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation mapped back to a declared field.
    #[error("Unique constraint '{constraint}' violated on field '{field}'")]
    UniqueConstraint { field: String, constraint: String },

    /// Unique constraint violation that could not be mapped to a field.
    #[error("Unique constraint violation: {constraint}: {message}")]
    UniqueViolation { constraint: String, message: String },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl OrmError {
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    pub fn missing_config(field: impl Into<String>) -> Self {
        Self::MissingConfig {
            field: field.into(),
        }
    }

    /// Create an invalid value error for a specific field
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_float(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFloat {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_date(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a schema registration error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a hydration error
    pub fn hydration(message: impl Into<String>) -> Self {
        Self::Hydration(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The field this error is scoped to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::UnknownField { field }
            | Self::MissingConfig { field }
            | Self::InvalidValue { field, .. }
            | Self::InvalidFloat { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::UniqueConstraint { field, .. } => Some(field),
            _ => None,
        }
    }

    /// True for every failed cast/option/shape check, including float and date parse failures.
    pub fn is_invalid_value(&self) -> bool {
        matches!(
            self,
            Self::InvalidValue { .. } | Self::InvalidFloat { .. } | Self::InvalidDate { .. }
        )
    }

    /// Check if this is a unique violation error (mapped or not)
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::UniqueConstraint { .. } | Self::UniqueViolation { .. }
        )
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => {
                    return Self::UniqueViolation {
                        constraint: constraint.to_string(),
                        message: message.to_string(),
                    };
                }
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_kinds_share_predicate() {
        assert!(OrmError::invalid_value("a", "x").is_invalid_value());
        assert!(OrmError::invalid_float("a", "x").is_invalid_value());
        assert!(OrmError::invalid_date("a", "x").is_invalid_value());
        assert!(!OrmError::MissingInput.is_invalid_value());
    }

    #[test]
    fn field_is_carried() {
        assert_eq!(OrmError::unknown_field("price").field(), Some("price"));
        assert_eq!(OrmError::missing_config("title").field(), Some("title"));
        assert_eq!(OrmError::MissingField.field(), None);
    }
}
