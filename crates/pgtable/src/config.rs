//! Repository and SQL-logging configuration.

use crate::error::OrmResult;
use crate::ident::Ident;
use crate::statement::Statement;
use tracing::Level;

/// Default and maximum page size for paginated queries.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Settings shared by every operation of a [`Repository`](crate::Repository).
#[derive(Debug, Clone)]
pub struct RepoConfig {
    /// Namespace applied to tables that declare none.
    pub default_namespace: Option<Ident>,
    /// Upper bound for a requested page size.
    pub max_page_size: i64,
    /// Page size used when the caller requests none.
    pub default_page_size: i64,
    pub sql_log: SqlLogConfig,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_namespace: None,
            max_page_size: DEFAULT_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
            sql_log: SqlLogConfig::default(),
        }
    }
}

impl RepoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_namespace(mut self, namespace: impl Into<String>) -> OrmResult<Self> {
        self.default_namespace = Some(Ident::new(namespace)?);
        Ok(self)
    }

    /// Set the largest page a caller may request (at least 1).
    pub fn max_page_size(mut self, size: i64) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    pub fn default_page_size(mut self, size: i64) -> Self {
        self.default_page_size = size.max(1);
        self
    }

    pub fn sql_log(mut self, sql_log: SqlLogConfig) -> Self {
        self.sql_log = sql_log;
        self
    }
}

/// How executed statements are logged.
///
/// Events go to the `pgtable.sql` target with `tag`, `param_count` and `sql`
/// fields, emitted before the statement runs.
#[derive(Debug, Clone)]
pub struct SqlLogConfig {
    pub enabled: bool,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(500),
        }
    }
}

impl SqlLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Log a statement about to be executed.
    pub fn emit(&self, stmt: &Statement) {
        if !self.enabled {
            return;
        }

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN => tracing::warn!($($field)*),
                    Level::INFO => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let tag = stmt.tag().unwrap_or("-");
        let sql = self.truncate_sql(&stmt.to_sql());
        emit_at_level!(
            self.level,
            target: "pgtable.sql",
            tag,
            param_count = stmt.param_count(),
            sql = %sql,
        );
    }
}

fn truncate_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Connection pool settings (feature `pool`).
#[cfg(feature = "pool")]
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_size: usize,
    /// Run a test query before handing out a recycled connection.
    pub verify_on_recycle: bool,
}

#[cfg(feature = "pool")]
impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            verify_on_recycle: false,
        }
    }
}

#[cfg(feature = "pool")]
impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn verify_on_recycle(mut self) -> Self {
        self.verify_on_recycle = true;
        self
    }
}
