//! Table-level operations: add, save, get, all, filter, delete.
//!
//! Every operation renders one [`Statement`], logs it through
//! [`SqlLogConfig`](crate::SqlLogConfig), runs it on the caller's
//! [`GenericClient`] and hydrates the rows through a [`JoinPlanner`], so joined
//! records come back attached.
//!
//! INSERT and UPDATE are wrapped in a CTE named after the table, which lets the
//! outer SELECT join related tables in the same round trip:
//!
//! ```text
//! WITH "users" AS (INSERT INTO "demo"."users" ("username") VALUES ($1) RETURNING *)
//! SELECT "users"."id", "users"."username", "groups"."id", "groups"."name"
//! FROM "users" LEFT JOIN "demo"."groups" ON "groups"."id"="users"."group_id"
//! ```

mod query;

#[cfg(test)]
mod tests;

pub use query::{ListQuery, PageResult, Pagination};

use crate::clause::{PLACEHOLDER, build_insert, build_update, normalize_method};
use crate::client::GenericClient;
use crate::coerce::coerce_scalar;
use crate::config::RepoConfig;
use crate::error::{OrmError, OrmResult};
use crate::join::{JoinPlanner, TOTAL};
use crate::param::Param;
use crate::record::FromRecord;
use crate::row::RowExt;
use crate::schema::TableSchema;
use crate::statement::Statement;
use serde_json::Value;
use std::sync::Arc;
use tokio_postgres::Row;

/// Operations over one registered table.
#[derive(Debug, Clone)]
pub struct Repository {
    schema: Arc<TableSchema>,
    config: RepoConfig,
}

impl Repository {
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self::with_config(schema, RepoConfig::default())
    }

    pub fn with_config(schema: Arc<TableSchema>, config: RepoConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// A fresh planner over this table, using the configured default namespace.
    pub fn planner(&self) -> JoinPlanner<'_> {
        JoinPlanner::new(&self.schema).with_namespace(self.config.default_namespace.as_ref())
    }

    fn table_sql(&self) -> String {
        self.schema
            .qualified_name_or(self.config.default_namespace.as_ref())
    }

    fn tag(&self, op: &str) -> String {
        format!("{}.{op}", self.schema.name())
    }

    /// Coerce a primary-key value, through its field when the key is a declared field.
    fn key_param(&self, id: &Value) -> OrmResult<Param> {
        if id.is_null() {
            return Err(OrmError::MissingInput);
        }
        let pk = self.schema.primary_key();
        match self.schema.fields().iter().find(|f| f.column() == pk) {
            Some(field) => coerce_scalar(field, id),
            None => Ok(match id {
                Value::String(s) => Param::text(s.as_str()),
                other => Param::text(other.to_string()),
            }),
        }
    }

    fn select_from(&self, planner: &JoinPlanner<'_>, from: &str) -> String {
        let joins = planner.join_sql();
        let mut sql = format!("SELECT {} FROM {from}", planner.select_list());
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins);
        }
        sql
    }

    /// `WITH "t" AS (INSERT ... RETURNING *) SELECT ... FROM "t" LEFT JOIN ...`
    pub fn insert_statement(&self, payload: &Value) -> OrmResult<Statement> {
        let insert = build_insert(&self.schema, payload)?;
        let cte = self.schema.name().quoted();
        let mut stmt = Statement::new(format!(
            "WITH {cte} AS (INSERT INTO {} (",
            self.table_sql()
        ))
        .tagged(self.tag("add"));
        stmt.push_names(&insert)
            .push(") VALUES (")
            .push_clause_as(&insert, PLACEHOLDER)
            .push(") RETURNING *) ")
            .push(&self.select_from(&self.planner(), &cte));
        Ok(stmt)
    }

    /// `WITH "t" AS (UPDATE ... WHERE pk=$n RETURNING *) SELECT ... FROM "t" LEFT JOIN ...`
    pub fn update_statement(&self, id: &Value, payload: &Value) -> OrmResult<Statement> {
        let update = build_update(&self.schema, payload)?;
        let key = self.key_param(id)?;
        let cte = self.schema.name().quoted();
        let mut stmt = Statement::new(format!("WITH {cte} AS (UPDATE {} SET ", self.table_sql()))
            .tagged(self.tag("save"));
        stmt.push_clause(&update)
            .push(&format!(" WHERE {}=", self.schema.primary_key_ref()))
            .push_bind(key)
            .push(" RETURNING *) ")
            .push(&self.select_from(&self.planner(), &cte));
        Ok(stmt)
    }

    pub fn get_statement(&self, id: &Value) -> OrmResult<Statement> {
        let key = self.key_param(id)?;
        let mut stmt =
            Statement::new(self.select_from(&self.planner(), &self.table_sql())).tagged(self.tag("get"));
        stmt.push(&format!(" WHERE {}=", self.schema.primary_key_ref()))
            .push_bind(key);
        Ok(stmt)
    }

    /// SELECT for [`all`](Self::all) (`page` is `None`) or [`filter`](Self::filter).
    ///
    /// `planner` decides the select list, so pass one built with
    /// [`JoinPlanner::with_total`] for paginated queries.
    pub fn list_statement(
        &self,
        planner: &JoinPlanner<'_>,
        query: &ListQuery,
        page: Option<Pagination>,
    ) -> OrmResult<Statement> {
        let predicate = planner.filter(query.filter.as_ref(), query.search.as_ref())?;
        let order = match query.order.as_ref() {
            Some(order) if order.field.is_some() => planner.order(None, None, Some(order))?,
            requested => self.key_order(requested.and_then(|o| o.method.as_deref()))?,
        };

        let op = if page.is_some() { "filter" } else { "all" };
        let mut stmt =
            Statement::new(self.select_from(planner, &self.table_sql())).tagged(self.tag(op));
        stmt.push(" WHERE ")
            .push_clause(&predicate)
            .push(" ORDER BY ")
            .push(&order);
        match page {
            Some(page) => {
                stmt.limit_offset(page.limit, page.offset());
            }
            None => {
                if let Some(limit) = query.limit {
                    stmt.limit(limit.clamp(1, self.config.max_page_size.max(1)));
                }
            }
        }
        Ok(stmt)
    }

    /// Primary-key ordering, ascending unless `method` asks otherwise.
    fn key_order(&self, method: Option<&str>) -> OrmResult<String> {
        let direction = match method.filter(|m| !m.trim().is_empty()) {
            Some(method) => normalize_method(method).ok_or_else(|| {
                OrmError::invalid_value(
                    self.schema.primary_key().as_str(),
                    format!("invalid order method '{method}'"),
                )
            })?,
            None => "ASC",
        };
        Ok(format!("{} {direction}", self.schema.primary_key_ref()))
    }

    pub fn delete_statement(&self, id: &Value) -> OrmResult<Statement> {
        let key = self.key_param(id)?;
        let mut stmt = Statement::new(format!(
            "DELETE FROM {} WHERE {}=",
            self.table_sql(),
            self.schema.primary_key_ref()
        ))
        .tagged(self.tag("delete"));
        stmt.push_bind(key);
        Ok(stmt)
    }

    /// Map an unmapped unique violation back to the field its constraint guards.
    pub fn translate_error(&self, err: OrmError) -> OrmError {
        match err {
            OrmError::UniqueViolation {
                constraint,
                message,
            } => match self.schema.field_for_constraint(&constraint) {
                Some(field) => {
                    tracing::debug!(
                        target: "pgtable.sql",
                        table = %self.schema.display_name(),
                        constraint = %constraint,
                        field,
                        "unique constraint violated"
                    );
                    OrmError::UniqueConstraint {
                        field: field.to_string(),
                        constraint,
                    }
                }
                None => OrmError::UniqueViolation {
                    constraint,
                    message,
                },
            },
            other => other,
        }
    }

    async fn fetch(&self, conn: &impl GenericClient, stmt: &Statement) -> OrmResult<Vec<Row>> {
        self.config.sql_log.emit(stmt);
        stmt.fetch_all(conn)
            .await
            .map_err(|e| self.translate_error(e))
    }

    fn hydrate<T: FromRecord>(planner: &mut JoinPlanner<'_>, row: &Row) -> OrmResult<T> {
        T::from_record(planner.hydrate(row.values()?)?)
    }

    fn first<T: FromRecord>(&self, rows: Vec<Row>) -> OrmResult<Option<T>> {
        let mut planner = self.planner();
        rows.first()
            .map(|row| Self::hydrate(&mut planner, row))
            .transpose()
    }

    /// Insert one row and return it with joins attached.
    pub async fn add<T: FromRecord>(&self, conn: &impl GenericClient, payload: &Value) -> OrmResult<T> {
        let stmt = self.insert_statement(payload)?;
        let rows = self.fetch(conn, &stmt).await?;
        self.first(rows)?.ok_or_else(|| {
            OrmError::not_found(format!("insert into {} returned no row", self.schema.display_name()))
        })
    }

    /// Update the row with primary key `id`; [`OrmError::NotFound`] if there is none.
    pub async fn save<T: FromRecord>(
        &self,
        conn: &impl GenericClient,
        id: &Value,
        payload: &Value,
    ) -> OrmResult<T> {
        let stmt = self.update_statement(id, payload)?;
        let rows = self.fetch(conn, &stmt).await?;
        self.first(rows)?.ok_or_else(|| {
            OrmError::not_found(format!(
                "{} with {}={id}",
                self.schema.display_name(),
                self.schema.primary_key()
            ))
        })
    }

    pub async fn get<T: FromRecord>(&self, conn: &impl GenericClient, id: &Value) -> OrmResult<Option<T>> {
        let stmt = self.get_statement(id)?;
        let rows = self.fetch(conn, &stmt).await?;
        self.first(rows)
    }

    /// Every matching row, ordered, optionally limited by `query.limit`.
    pub async fn all<T: FromRecord>(&self, conn: &impl GenericClient, query: &ListQuery) -> OrmResult<Vec<T>> {
        let mut planner = self.planner();
        let stmt = self.list_statement(&planner, query, None)?;
        let rows = self.fetch(conn, &stmt).await?;
        rows.iter()
            .map(|row| Self::hydrate(&mut planner, row))
            .collect()
    }

    /// One page of matching rows plus the total match count.
    pub async fn filter<T: FromRecord>(
        &self,
        conn: &impl GenericClient,
        query: &ListQuery,
    ) -> OrmResult<PageResult<T>> {
        let page = Pagination::new(query.page, query.limit, &self.config);
        let mut planner = self.planner().with_total();
        let stmt = self.list_statement(&planner, query, Some(page))?;
        let rows = self.fetch(conn, &stmt).await?;

        let mut result = PageResult {
            total: None,
            items: Vec::with_capacity(rows.len()),
        };
        for row in &rows {
            result.items.push(Self::hydrate(&mut planner, row)?);
            if result.total.is_none() {
                result.total = planner.reserved_value(TOTAL)?.as_i64();
            }
        }
        Ok(result)
    }

    /// Delete the row with primary key `id`, returning the affected row count.
    pub async fn delete(&self, conn: &impl GenericClient, id: &Value) -> OrmResult<u64> {
        let stmt = self.delete_statement(id)?;
        self.config.sql_log.emit(&stmt);
        stmt.execute(conn)
            .await
            .map_err(|e| self.translate_error(e))
    }
}
