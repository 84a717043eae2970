//! Queries over a root table and its declared joins.
//!
//! A [`JoinPlanner`] fixes the column layout of a result row when it is built:
//! the root table's selectable columns first, then each join's columns in
//! declaration order, then any reserved single-slot expressions such as a
//! window `COUNT(*) OVER()`. Every SQL fragment it renders and every row it
//! hydrates follows that layout.
//!
//! ```ignore
//! let mut planner = JoinPlanner::new(&users).with_total();
//! let sql = format!(
//!     "SELECT {} FROM {} {} WHERE ...",
//!     planner.select_list(),
//!     users.qualified_name(),
//!     planner.join_sql(),
//! );
//! for row in rows {
//!     let record = planner.hydrate(row.values()?)?;
//!     let total = planner.reserved_value(TOTAL)?;
//! }
//! ```

mod cursor;


pub use cursor::{Offset, RowCursor};

use crate::clause::{Clause, Combinator, OrderRequest, build_order, build_where};
use crate::error::{OrmError, OrmResult};
use crate::hydrate;
use crate::ident::{Ident, dotted};
use crate::param::Param;
use crate::record::Record;
use crate::schema::TableSchema;
use serde_json::Value;

/// Reserved slot name of the window total added by [`JoinPlanner::with_total`].
pub const TOTAL: &str = "total";

const ROOT_SLOT: &str = "@root";

fn reserved_slot(name: &str) -> String {
    format!("@{name}")
}

/// Column layout, predicates, ordering and hydration for one root table plus joins.
#[derive(Debug, Clone)]
pub struct JoinPlanner<'a> {
    root: &'a TableSchema,
    namespace: Option<&'a Ident>,
    cursor: RowCursor,
    reserved: Vec<(String, String)>,
    where_clause: Option<Clause>,
}

impl<'a> JoinPlanner<'a> {
    pub fn new(root: &'a TableSchema) -> Self {
        let mut cursor = RowCursor::new();
        cursor.register(ROOT_SLOT, root.column_count());
        for join in root.joins() {
            cursor.register(join.name(), join.table().column_count());
        }
        Self {
            root,
            namespace: None,
            cursor,
            reserved: Vec::new(),
            where_clause: None,
        }
    }

    /// Namespace used for joined tables that declare none.
    pub fn with_namespace(mut self, namespace: Option<&'a Ident>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Append a single-slot SQL expression after all table columns.
    pub fn reserve(mut self, name: &str, expr: impl Into<String>) -> Self {
        self.cursor.register(reserved_slot(name), 1);
        self.reserved.push((name.to_string(), expr.into()));
        self
    }

    /// Reserve [`TOTAL`] as `COUNT(*) OVER()`.
    pub fn with_total(self) -> Self {
        self.reserve(TOTAL, "COUNT(*) OVER()")
    }

    pub fn root(&self) -> &'a TableSchema {
        self.root
    }

    pub fn cursor(&self) -> &RowCursor {
        &self.cursor
    }

    /// Selectable columns of the root, then of each join.
    pub fn column_list(&self) -> String {
        std::iter::once(self.root.select_columns())
            .chain(self.root.joins().iter().map(|j| j.table().select_columns()))
            .filter(|columns| !columns.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// [`column_list`](Self::column_list) followed by the reserved expressions.
    pub fn select_list(&self) -> String {
        std::iter::once(self.column_list())
            .chain(self.reserved.iter().map(|(_, expr)| expr.clone()))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One `LEFT JOIN` per declared join.
    pub fn join_sql(&self) -> String {
        self.root
            .joins()
            .iter()
            .map(|join| {
                let related = join.table();
                format!(
                    "LEFT JOIN {} ON {}={}",
                    related.qualified_name_or(self.namespace),
                    related.primary_key_ref(),
                    dotted(self.root.name(), join.column()),
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Predicates for the root and every join addressed in `payload`.
    ///
    /// Join predicates are read from a sub-object keyed by the join name. Tables
    /// that contribute nothing are left out; with nothing left the clause renders
    /// `1=1`.
    pub fn predicate(&self, payload: Option<&Value>, combinator: Combinator) -> OrmResult<Clause> {
        let mut groups = Vec::new();
        if let Some(payload) = payload.filter(|p| !p.is_null()) {
            groups.push(build_where(self.root, payload, combinator)?);
            for join in self.root.joins() {
                let Some(sub) = payload.get(join.name()) else {
                    continue;
                };
                if !sub.is_object() {
                    return Err(OrmError::invalid_value(
                        join.name(),
                        "join filters must be an object",
                    ));
                }
                groups.push(build_where(join.table(), sub, combinator)?);
            }
        }
        groups.retain(|clause| !clause.is_empty());

        let wrap = groups.len() > 1;
        let mut fields = Vec::with_capacity(groups.len());
        let mut values = Vec::new();
        for clause in groups {
            let template = clause.template(None);
            fields.push(if wrap { format!("({template})") } else { template });
            values.extend(clause.into_parts().1);
        }
        Ok(Clause::new(fields, values)
            .with_separator(combinator.separator())
            .with_empty("1=1"))
    }

    /// `(search) AND (filter)`: search predicates OR-combined, filter predicates AND-combined.
    pub fn filter(&self, filter: Option<&Value>, search: Option<&Value>) -> OrmResult<Clause> {
        let search = self.predicate(search, Combinator::Or)?;
        let filter = self.predicate(filter, Combinator::And)?;
        let fields = vec![
            format!("({})", search.template(None)),
            format!("({})", filter.template(None)),
        ];
        let values: Vec<Param> = search
            .values()
            .iter()
            .chain(filter.values())
            .cloned()
            .collect();
        Ok(Clause::new(fields, values)
            .with_separator(Combinator::And.separator())
            .with_empty("1=1"))
    }

    /// ORDER BY expression; `join.field` orders by a joined table's field.
    pub fn order(
        &self,
        field: Option<&str>,
        method: Option<&str>,
        order: Option<&OrderRequest>,
    ) -> OrmResult<String> {
        let requested = order.and_then(|o| o.field.as_deref()).or(field);
        if let Some((head, rest)) = requested.and_then(|r| r.split_once('.')) {
            if let Some(join) = self.root.join(head) {
                let method = order.and_then(|o| o.method.as_deref()).or(method);
                return build_order(join.table(), Some(rest), method, None);
            }
        }
        build_order(self.root, field, method, order)
    }

    /// The combined clause computed by [`plan_join`], if any.
    pub fn where_clause(&self) -> Option<&Clause> {
        self.where_clause.as_ref()
    }

    /// Load one row and build the root record with its joins attached.
    ///
    /// A join whose columns are all null (no related row) is attached as `None`.
    pub fn hydrate(&mut self, row: Vec<Value>) -> OrmResult<Record> {
        self.cursor.load(row)?;
        let mut record = hydrate::create(self.root, self.cursor.slice(ROOT_SLOT)?)?;
        for join in self.root.joins() {
            let slice = self.cursor.slice(join.name())?;
            let related = if hydrate::is_unmatched(slice) {
                None
            } else {
                Some(hydrate::create(join.table(), slice)?)
            };
            record.attach(join.name(), related);
        }
        Ok(record)
    }

    /// Value of a reserved slot in the most recently hydrated row.
    pub fn reserved_value(&self, name: &str) -> OrmResult<&Value> {
        self.cursor.get(&reserved_slot(name))
    }
}

/// A planner with the `(search) AND (filter)` clause already computed.
pub fn plan_join<'a>(
    schema: &'a TableSchema,
    filter: Option<&Value>,
    search: Option<&Value>,
) -> OrmResult<JoinPlanner<'a>> {
    let mut planner = JoinPlanner::new(schema);
    planner.where_clause = Some(planner.filter(filter, search)?);
    Ok(planner)
}
