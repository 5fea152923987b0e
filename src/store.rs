//! Migration ledger and database bootstrap. The ledger table `_sys_migrations`
//! lives in the schema named by `BACKOFFICE_SCHEMA` (default `backoffice`).

use crate::error::{AppError, MigrationError};
use crate::schema::quoted;
use sqlx::{ConnectOptions, PgConnection, PgPool};
use std::str::FromStr;

const LEDGER_TABLE: &str = "_sys_migrations";

/// Schema-qualified ledger table (e.g. "backoffice"."_sys_migrations").
pub fn ledger_table(schema: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(LEDGER_TABLE))
}

/// One applied migration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub name: String,
    pub batch: i32,
}

/// Create the ledger schema and table if missing.
pub async fn ensure_ledger(pool: &PgPool, schema: &str) -> Result<(), MigrationError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            name TEXT PRIMARY KEY,
            batch INTEGER NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        ledger_table(schema)
    );
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Whether the ledger table is there, without creating anything.
pub async fn ledger_exists(pool: &PgPool, schema: &str) -> Result<bool, MigrationError> {
    let found: Option<String> = sqlx::query_scalar("SELECT to_regclass($1::text)::text")
        .bind(ledger_table(schema))
        .fetch_one(pool)
        .await?;
    Ok(found.is_some())
}

/// Applied migrations in application order.
pub async fn applied(pool: &PgPool, schema: &str) -> Result<Vec<LedgerEntry>, MigrationError> {
    let sql = format!("SELECT name, batch FROM {} ORDER BY batch, name", ledger_table(schema));
    let rows: Vec<(String, i32)> = sqlx::query_as(&sql).fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(name, batch)| LedgerEntry { name, batch })
        .collect())
}

pub async fn record(conn: &mut PgConnection, schema: &str, name: &str, batch: i32) -> Result<(), MigrationError> {
    let sql = format!("INSERT INTO {} (name, batch) VALUES ($1, $2)", ledger_table(schema));
    sqlx::query(&sql).bind(name).bind(batch).execute(&mut *conn).await?;
    Ok(())
}

pub async fn forget(conn: &mut PgConnection, schema: &str, name: &str) -> Result<(), MigrationError> {
    let sql = format!("DELETE FROM {} WHERE name = $1", ledger_table(schema));
    sqlx::query(&sql).bind(name).execute(&mut *conn).await?;
    Ok(())
}

/// Ensure the database named in `database_url` exists. Connects to the `postgres`
/// database on the same server and runs `CREATE DATABASE` if needed.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split a URL into its `postgres` maintenance URL and database name. A URL
/// without a path after the authority names no database.
fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let authority_start = url
        .find("://")
        .map(|i| i + 3)
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: missing scheme".into()))?;
    let rest = url.get(authority_start..).unwrap_or("");
    let Some(slash) = rest.find('/') else {
        return Ok((url.to_string(), String::new()));
    };
    let path_start = authority_start + slash + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name_from_url() {
        let (admin, db) = parse_db_name_from_url("postgres://u:p@localhost:5432/backoffice?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "backoffice");
    }

    #[test]
    fn url_without_path_names_no_database() {
        let (_, db) = parse_db_name_from_url("postgres://localhost").unwrap();
        assert_eq!(db, "");
        let (_, db) = parse_db_name_from_url("postgres://u:p@db.internal:5432").unwrap();
        assert_eq!(db, "");
        let (_, db) = parse_db_name_from_url("postgres://localhost/?sslmode=disable").unwrap();
        assert_eq!(db, "");
        assert!(parse_db_name_from_url("localhost/backoffice").is_err());
    }

    #[test]
    fn ledger_is_schema_qualified() {
        assert_eq!(ledger_table("backoffice"), "\"backoffice\".\"_sys_migrations\"");
    }
}
