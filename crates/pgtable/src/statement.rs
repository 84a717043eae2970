//! Whole statements assembled from raw SQL, bound values and [`Clause`]s.

use crate::client::GenericClient;
use crate::clause::{Clause, PLACEHOLDER};
use crate::error::{OrmError, OrmResult};
use crate::param::Param;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone)]
enum Part {
    Raw(String),
    Param,
}

/// A parameter-safe statement builder.
///
/// Pieces are stored separately from their values; `$1, $2, ...` are assigned
/// in order of appearance by [`to_sql`](Self::to_sql), so clauses built in
/// isolation can be spliced in without renumbering by hand.
///
/// ```ignore
/// let filter = build_where(&users, &json!({"status": "active"}), Combinator::And)?;
/// let mut stmt = Statement::new("SELECT * FROM \"users\" WHERE ");
/// stmt.push_clause(&filter).push(" LIMIT ").push_bind(10);
/// assert_eq!(stmt.to_sql(), r#"SELECT * FROM "users" WHERE "users"."status"=$1 LIMIT $2"#);
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Statement {
    parts: Vec<Part>,
    params: Vec<Param>,
    tag: Option<String>,
}

impl Statement {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Raw(initial_sql.into())],
            params: Vec::new(),
            tag: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Label carried into the SQL log, e.g. `users.filter`.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(Part::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(Part::Raw(sql.to_string())),
        }
        self
    }

    /// Append a placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Param>) -> &mut Self {
        self.parts.push(Part::Param);
        self.params.push(value.into());
        self
    }

    /// Append a clause rendered with its own pattern, binding all of its values.
    pub fn push_clause(&mut self, clause: &Clause) -> &mut Self {
        self.push_template(&clause.template(None), clause.values())
    }

    /// Append a clause rendered with `pattern`, binding all of its values.
    pub fn push_clause_as(&mut self, clause: &Clause, pattern: &str) -> &mut Self {
        self.push_template(&clause.template(Some(pattern)), clause.values())
    }

    /// Append only a clause's fragments (e.g. an INSERT column list).
    pub fn push_names(&mut self, clause: &Clause) -> &mut Self {
        self.push(&clause.template(Some("{name}")))
    }

    fn push_template(&mut self, template: &str, values: &[Param]) -> &mut Self {
        let mut pieces = template.split(PLACEHOLDER);
        if let Some(first) = pieces.next() {
            self.push(first);
        }
        for piece in pieces {
            self.parts.push(Part::Param);
            self.push(piece);
        }
        self.params.extend(values.iter().cloned());
        self
    }

    /// Append `LIMIT $n OFFSET $m`.
    pub fn limit_offset(&mut self, limit: i64, offset: i64) -> &mut Self {
        self.push(" LIMIT ")
            .push_bind(limit.to_string())
            .push(" OFFSET ")
            .push_bind(offset.to_string())
    }

    /// Append `LIMIT $n`.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.push(" LIMIT ").push_bind(limit.to_string())
    }

    /// Render with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let cap = self
            .parts
            .iter()
            .map(|p| match p {
                Part::Raw(s) => s.len(),
                Part::Param => 4,
            })
            .sum();
        let mut out = String::with_capacity(cap);
        let mut idx = 0usize;
        for part in &self.parts {
            match part {
                Part::Raw(s) => out.push_str(s),
                Part::Param => {
                    idx += 1;
                    out.push('$');
                    out.push_str(&idx.to_string());
                }
            }
        }
        out
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    /// Placeholder count must equal parameter count.
    pub fn validate(&self) -> OrmResult<()> {
        let placeholders = self
            .parts
            .iter()
            .filter(|p| matches!(p, Part::Param))
            .count();
        if placeholders != self.params.len() {
            return Err(OrmError::validation(format!(
                "Statement: placeholders({placeholders}) != params({})",
                self.params.len()
            )));
        }
        Ok(())
    }

    pub async fn fetch_all(&self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        self.validate()?;
        conn.query(&self.to_sql(), &self.params_ref()).await
    }

    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> OrmResult<Option<Row>> {
        self.validate()?;
        conn.query_opt(&self.to_sql(), &self.params_ref()).await
    }

    pub async fn execute(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.validate()?;
        conn.execute(&self.to_sql(), &self.params_ref()).await
    }
}
