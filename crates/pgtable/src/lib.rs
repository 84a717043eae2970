//! # pgtable
//!
//! Schema-driven SQL clause compiler and row hydrator for Postgres.
//!
//! ## Features
//!
//! - **Declared schemas**: tables are registered once as ordered [`Field`] declarations
//!   (type, array flag, option set, visibility, encoder/decoder, JSON keys) plus joins
//! - **Coercion**: loosely typed JSON payloads are cast, checked and encoded per field
//! - **Clauses**: INSERT column lists, UPDATE assignments, WHERE predicates and ORDER BY
//!   expressions built from payloads, with `$n` placeholders and bound values
//! - **Joins**: one root table plus left-joined relations, combined filter/search
//!   predicates and cross-table ordering
//! - **Hydration**: flat result rows sliced by planned offsets into [`Record`]s with
//!   joined records attached, then mapped through [`FromRecord`]
//! - **Repository**: add/save/get/all/filter/delete over any [`GenericClient`]
//!
//! ## Example
//!
//! ```ignore
//! use pgtable::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let groups = Arc::new(
//!     TableSchema::builder("groups")
//!         .field(Field::int("id"))
//!         .field(Field::string("name"))
//!         .build()?,
//! );
//! let users = TableSchema::builder("users")
//!     .namespace("demo")
//!     .field(Field::int("id").no_insert().no_update())
//!     .field(Field::string("username"))
//!     .field(Field::string("status").options(["active", "disabled"]))
//!     .field(Field::int("group_id").nullable())
//!     .join("group", groups, "group_id")
//!     .build()?;
//!
//! let repo = Repository::new(Arc::new(users));
//! let page: PageResult<Record> = repo
//!     .filter(
//!         &client,
//!         &ListQuery::new()
//!             .filter(json!({"status": "active"}))
//!             .search(json!({"username": "jo", "group": {"name": "jo"}}))
//!             .order(OrderRequest::new("group.name").desc()),
//!     )
//!     .await?;
//! ```

pub mod clause;
pub mod client;
pub mod coerce;
pub mod config;
pub mod error;
pub mod hydrate;
pub mod ident;
pub mod join;
mod literal;
pub mod param;
pub mod prelude;
pub mod record;
pub mod repo;
pub mod row;
pub mod schema;
pub mod statement;

#[cfg(feature = "pool")]
pub mod pool;

pub use clause::{
    Clause, Combinator, OrderRequest, PLACEHOLDER, build_insert, build_order, build_update,
    build_where,
};
pub use client::GenericClient;
pub use coerce::{coerce, coerce_scalar};
pub use config::{RepoConfig, SqlLogConfig};
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use join::{JoinPlanner, Offset, RowCursor, TOTAL, plan_join};
pub use param::Param;
pub use record::{FromRecord, Record};
pub use repo::{ListQuery, PageResult, Pagination, Repository};
pub use row::RowExt;
pub use schema::{Decoder, Encoder, Field, FieldSchema, FieldType, Join, TableSchema, TableSchemaBuilder};
pub use statement::Statement;

#[cfg(feature = "pool")]
pub use config::PoolConfig;
#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

// Re-export tokio_postgres types for convenience
pub use tokio_postgres;
pub use tokio_postgres::Row;
