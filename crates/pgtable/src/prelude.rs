//! Convenient imports for typical `pgtable` usage.
//!
//! ```ignore
//! use pgtable::prelude::*;
//! ```

pub use crate::{
    Clause, Combinator, Field, FieldType, FromRecord, GenericClient, JoinPlanner, ListQuery,
    OrderRequest, OrmError, OrmResult, PageResult, Record, RepoConfig, Repository, SqlLogConfig,
    Statement, TableSchema,
};
pub use crate::{build_insert, build_order, build_update, build_where, plan_join};

#[cfg(feature = "pool")]
pub use crate::{PoolConfig, create_pool, create_pool_with_config};
