mod principal_table;

use crate::{
  entity::{Email, PrincipalId, PrincipalRecord},
  error::*,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

pub use principal_table::SqlitePrincipalTable;

/// Identity store of internal principals
#[async_trait]
pub trait PrincipalTable: Send + Sync {
  async fn add(&self, principal: &PrincipalRecord) -> Result<()>;
  async fn find_principal(&self, id: &PrincipalId) -> Result<Option<PrincipalRecord>>;
  async fn find_by_email(&self, email: &Email) -> Result<Option<PrincipalRecord>>;
  /// Set both fields when linking, clear both with `None` when unlinking
  async fn update_upstream_credentials<'a>(
    &self,
    id: &PrincipalId,
    upstream_email: Option<&'a str>,
    upstream_password_encrypted: Option<&'a str>,
  ) -> Result<()>;
}

/// Setup sqlite database with automatic creation of the principal table
pub async fn setup_sqlite(sqlite_url: &str) -> Result<SqlitePrincipalTable> {
  let conn_opts = SqliteConnectOptions::from_str(sqlite_url)?.create_if_missing(true);
  let pool = SqlitePoolOptions::default().connect_with(conn_opts).await?;
  prepare_pool(pool).await
}

/// Run the embedded migrations on the given pool and wrap it as the principal table
pub async fn prepare_pool(pool: SqlitePool) -> Result<SqlitePrincipalTable> {
  // Embed migrations into binary
  sqlx::migrate!("./migrations").run(&pool).await?;
  Ok(SqlitePrincipalTable::new(pool))
}

#[cfg(test)]
pub(crate) async fn setup_memory_sqlite() -> SqlitePrincipalTable {
  // a single never-recycled connection keeps the in-memory database alive
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .idle_timeout(None)
    .max_lifetime(None)
    .connect("sqlite::memory:")
    .await
    .unwrap();
  prepare_pool(pool).await.unwrap()
}
