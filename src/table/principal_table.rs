use super::PrincipalTable;
use crate::{constants::*, entity::*, error::*};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::convert::TryInto;

#[derive(Debug, Clone)]
pub struct SqlitePrincipalTable {
  pool: SqlitePool,
}

impl SqlitePrincipalTable {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl PrincipalTable for SqlitePrincipalTable {
  async fn add(&self, principal: &PrincipalRecord) -> Result<()> {
    let sql = format!(
      "insert into {} (id, name, email, position, encoded_hash, upstream_email, upstream_password_encrypted) VALUES (?, ?, ?, ?, ?, ?, ?)",
      PRINCIPAL_TABLE_NAME
    );
    let _res = sqlx::query(&sql)
      .bind(principal.id.as_str())
      .bind(principal.name.as_str())
      .bind(principal.email.as_str())
      .bind(principal.position.as_deref())
      .bind(principal.encoded_hash.as_str())
      .bind(principal.upstream_email.as_deref())
      .bind(principal.upstream_password_encrypted.as_deref())
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn find_principal(&self, id: &PrincipalId) -> Result<Option<PrincipalRecord>> {
    let sql = format!("select * from {} where id = ?", PRINCIPAL_TABLE_NAME);
    let row_opt: Option<PrincipalRow> = sqlx::query_as(&sql).bind(id.as_str()).fetch_optional(&self.pool).await?;
    row_opt.map(|row| row.try_into()).transpose()
  }

  async fn find_by_email(&self, email: &Email) -> Result<Option<PrincipalRecord>> {
    let sql = format!("select * from {} where email = ?", PRINCIPAL_TABLE_NAME);
    let row_opt: Option<PrincipalRow> = sqlx::query_as(&sql)
      .bind(email.as_str())
      .fetch_optional(&self.pool)
      .await?;
    row_opt.map(|row| row.try_into()).transpose()
  }

  async fn update_upstream_credentials<'a>(
    &self,
    id: &PrincipalId,
    upstream_email: Option<&'a str>,
    upstream_password_encrypted: Option<&'a str>,
  ) -> Result<()> {
    let sql = format!(
      "update {} set upstream_email = ?, upstream_password_encrypted = ? where id = ?",
      PRINCIPAL_TABLE_NAME
    );
    let res = sqlx::query(&sql)
      .bind(upstream_email)
      .bind(upstream_password_encrypted)
      .bind(id.as_str())
      .execute(&self.pool)
      .await?;
    ensure!(res.rows_affected() == 1, "No principal updated");
    Ok(())
  }
}

#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
  id: String,
  name: String,
  email: String,
  position: Option<String>,
  encoded_hash: String,
  upstream_email: Option<String>,
  upstream_password_encrypted: Option<String>,
}

impl TryInto<PrincipalRecord> for PrincipalRow {
  type Error = crate::error::Error;

  fn try_into(self) -> std::result::Result<PrincipalRecord, Self::Error> {
    Ok(PrincipalRecord {
      id: PrincipalId::new(self.id)?,
      name: self.name,
      email: Email::new(self.email)?,
      position: self.position,
      encoded_hash: EncodedHash::new(self.encoded_hash)?,
      upstream_email: self.upstream_email,
      upstream_password_encrypted: self.upstream_password_encrypted,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::table::setup_memory_sqlite;

  fn sample_principal() -> PrincipalRecord {
    PrincipalRecord::new(
      "Field Operator",
      &Email::new("operator@example.com").unwrap(),
      &Password::new("password").unwrap(),
      Some("dispatcher"),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn add_and_find_principal() {
    let table = setup_memory_sqlite().await;
    let principal = sample_principal();
    table.add(&principal).await.unwrap();

    let found = table.find_principal(&principal.id).await.unwrap().unwrap();
    assert_eq!(found.id, principal.id);
    assert_eq!(found.name, "Field Operator");
    assert_eq!(found.position.as_deref(), Some("dispatcher"));
    assert!(!found.is_upstream_linked());

    let by_email = table.find_by_email(&principal.email).await.unwrap();
    assert!(by_email.is_some());

    let missing = table.find_principal(&PrincipalId::generate()).await.unwrap();
    assert!(missing.is_none());
  }

  #[tokio::test]
  async fn duplicated_email_is_rejected() {
    let table = setup_memory_sqlite().await;
    table.add(&sample_principal()).await.unwrap();
    assert!(table.add(&sample_principal()).await.is_err());
  }

  #[tokio::test]
  async fn link_and_unlink_upstream_credentials() {
    let table = setup_memory_sqlite().await;
    let principal = sample_principal();
    table.add(&principal).await.unwrap();

    table
      .update_upstream_credentials(&principal.id, Some("op@upstream.example.com"), Some("aXY=:Y2lwaGVy"))
      .await
      .unwrap();
    let linked = table.find_principal(&principal.id).await.unwrap().unwrap();
    assert_eq!(
      linked.upstream_credentials(),
      Some(("op@upstream.example.com", "aXY=:Y2lwaGVy"))
    );

    table.update_upstream_credentials(&principal.id, None, None).await.unwrap();
    let unlinked = table.find_principal(&principal.id).await.unwrap().unwrap();
    assert!(unlinked.upstream_email.is_none());
    assert!(unlinked.upstream_password_encrypted.is_none());

    assert!(table
      .update_upstream_credentials(&PrincipalId::generate(), None, None)
      .await
      .is_err());
  }
}
