//! Declarative table schemas.
//!
//! A [`TableSchema`] is the single source of truth for one table: which columns
//! exist, in which order they are selected, how input values are cast, and which
//! related tables are left-joined.
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{Field, TableSchema};
//! use std::sync::Arc;
//!
//! let groups = Arc::new(
//!     TableSchema::builder("groups")
//!         .namespace("demo")
//!         .field(Field::int("id"))
//!         .field(Field::string("name"))
//!         .build()?,
//! );
//!
//! let users = TableSchema::builder("users")
//!     .namespace("demo")
//!     .field(Field::int("id").no_insert().no_update())
//!     .field(Field::string("username"))
//!     .field(Field::string("status").options(["active", "disabled"]))
//!     .field(Field::int("group_id"))
//!     .field(Field::date("created_at").no_insert())
//!     .join("group", groups, "group_id")
//!     .build()?;
//! # Ok::<(), pgtable::OrmError>(())
//! ```

mod field;
mod table;

#[cfg(test)]
mod tests;

pub use field::{Decoder, Encoder, Field, FieldSchema, FieldType};
pub use table::{Join, TableSchema, TableSchemaBuilder};
