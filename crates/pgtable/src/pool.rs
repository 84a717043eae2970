//! Connection pool helpers.

use crate::config::PoolConfig;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Pool over `NoTls` connections with [`PoolConfig::default`] settings.
///
/// ```ignore
/// let pool = pgtable::create_pool(&std::env::var("DATABASE_URL")?)?;
/// let client = pool.get().await?;
/// let user: Option<Record> = users.get(&client, &json!(1)).await?;
/// ```
pub fn create_pool(database_url: &str) -> OrmResult<Pool> {
    create_pool_with_config(database_url, &PoolConfig::default())
}

pub fn create_pool_with_config(database_url: &str, config: &PoolConfig) -> OrmResult<Pool> {
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;

    let recycling_method = if config.verify_on_recycle {
        RecyclingMethod::Verified
    } else {
        RecyclingMethod::Fast
    };
    let manager = Manager::from_config(pg_config, NoTls, ManagerConfig { recycling_method });

    Pool::builder(manager)
        .max_size(config.max_size)
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}
