//! Applies pending migrations in name order and reverts the last batch in reverse.

use crate::error::MigrationError;
use crate::migration::{Migration, SchemaChange};
use crate::schema::{quoted, SchemaSnapshot};
use crate::store::{self, LedgerEntry};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub name: &'static str,
    /// Batch that applied it; None while pending.
    pub batch: Option<i32>,
}

/// A migration that ran (or would run, when pretending) and its DDL.
#[derive(Clone, Debug)]
pub struct Applied {
    pub name: &'static str,
    pub statements: Vec<String>,
}

pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
    schema: String,
}

impl Migrator {
    /// Every known migration; ledger kept in `schema`.
    pub fn new(schema: &str) -> Self {
        Self::with_migrations(super::all(), schema)
    }

    pub fn with_migrations(mut migrations: Vec<Box<dyn Migration>>, schema: &str) -> Self {
        migrations.sort_by_key(|m| m.name());
        Self {
            migrations,
            schema: schema.to_string(),
        }
    }

    /// Replay every migration on an empty snapshot, checking that each `down`
    /// restores the schema its `up` started from. Returns the final schema.
    pub fn check_plan(&self) -> Result<SchemaSnapshot, MigrationError> {
        let mut snap = SchemaSnapshot::default();
        for m in &self.migrations {
            let before = snap.clone();
            for c in m.up() {
                c.apply_to(&mut snap)?;
            }
            let mut reverted = snap.clone();
            for c in m.down() {
                c.apply_to(&mut reverted)?;
            }
            if reverted != before {
                return Err(MigrationError::Plan(format!("{} does not revert to its prior schema", m.name())));
            }
        }
        Ok(snap)
    }

    /// Migrations not yet in the ledger, in application order. Ledger rows
    /// naming no known migration are an error.
    pub fn pending(&self, applied: &[LedgerEntry]) -> Result<Vec<&dyn Migration>, MigrationError> {
        if let Some(unknown) = applied
            .iter()
            .find(|e| !self.migrations.iter().any(|m| m.name() == e.name))
        {
            return Err(MigrationError::Unknown(unknown.name.clone()));
        }
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|e| e.name == m.name()))
            .map(|m| m.as_ref())
            .collect())
    }

    /// Migrations of the highest batch, newest first.
    pub fn last_batch(&self, applied: &[LedgerEntry]) -> Result<Vec<&dyn Migration>, MigrationError> {
        let Some(batch) = applied.iter().map(|e| e.batch).max() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for entry in applied.iter().filter(|e| e.batch == batch) {
            let m = self
                .migrations
                .iter()
                .find(|m| m.name() == entry.name)
                .ok_or_else(|| MigrationError::Unknown(entry.name.clone()))?;
            out.push(m.as_ref());
        }
        out.sort_by_key(|m| std::cmp::Reverse(m.name()));
        Ok(out)
    }

    /// Ledger contents. A dry run reads an absent ledger as empty instead of
    /// creating it.
    async fn load_ledger(&self, pool: &PgPool, pretend: bool) -> Result<Vec<LedgerEntry>, MigrationError> {
        if pretend {
            if !store::ledger_exists(pool, &self.schema).await? {
                return Ok(Vec::new());
            }
        } else {
            store::ensure_ledger(pool, &self.schema).await?;
        }
        store::applied(pool, &self.schema).await
    }

    pub async fn status(&self, pool: &PgPool) -> Result<Vec<MigrationStatus>, MigrationError> {
        store::ensure_ledger(pool, &self.schema).await?;
        let applied = store::applied(pool, &self.schema).await?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                name: m.name(),
                batch: applied.iter().find(|e| e.name == m.name()).map(|e| e.batch),
            })
            .collect())
    }

    /// Apply every pending migration as one new batch, each in its own
    /// transaction. With `pretend`, only report the DDL.
    pub async fn migrate(&self, pool: &PgPool, pretend: bool) -> Result<Vec<Applied>, MigrationError> {
        self.check_plan()?;
        let applied = self.load_ledger(pool, pretend).await?;
        let batch = applied.iter().map(|e| e.batch).max().unwrap_or(0) + 1;
        let mut out = Vec::new();
        for m in self.pending(&applied)? {
            let statements = statements(&m.up());
            if !pretend {
                let mut tx = pool.begin().await?;
                m.apply(&mut tx).await?;
                store::record(&mut tx, &self.schema, m.name(), batch).await?;
                tx.commit().await?;
                tracing::info!(migration = m.name(), batch, "migrated");
            }
            out.push(Applied {
                name: m.name(),
                statements,
            });
        }
        if out.is_empty() {
            tracing::info!("nothing to migrate");
        }
        Ok(out)
    }

    /// Revert the last batch, newest migration first. Dropping populated
    /// columns or tables is allowed and logged as a warning.
    pub async fn rollback(&self, pool: &PgPool, pretend: bool) -> Result<Vec<Applied>, MigrationError> {
        let applied = self.load_ledger(pool, pretend).await?;
        let mut out = Vec::new();
        for m in self.last_batch(&applied)? {
            let down = m.down();
            let mut tx = pool.begin().await?;
            for change in down.iter().filter(|c| c.is_destructive()) {
                warn_on_data_loss(&mut tx, change).await?;
            }
            if pretend {
                tx.rollback().await?;
            } else {
                m.revert(&mut tx).await?;
                store::forget(&mut tx, &self.schema, m.name()).await?;
                tx.commit().await?;
                tracing::info!(migration = m.name(), "rolled back");
            }
            out.push(Applied {
                name: m.name(),
                statements: statements(&down),
            });
        }
        if out.is_empty() {
            tracing::info!("nothing to roll back");
        }
        Ok(out)
    }
}

fn statements(changes: &[SchemaChange]) -> Vec<String> {
    changes.iter().flat_map(SchemaChange::statements).collect()
}

/// Count what a destructive change throws away and warn when it is not nothing.
async fn warn_on_data_loss(conn: &mut PgConnection, change: &SchemaChange) -> Result<(), MigrationError> {
    match change {
        SchemaChange::DropColumn { table, column, .. } => {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
                quoted(table),
                quoted(&column.name)
            );
            let lost: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
            if lost > 0 {
                tracing::warn!(table = %table, column = %column.name, values = lost, "dropping populated column; values are lost");
            }
        }
        SchemaChange::DropTable(t) => {
            let sql = format!("SELECT COUNT(*) FROM {}", quoted(&t.name));
            let lost: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
            if lost > 0 {
                tracing::warn!(table = %t.name, rows = lost, "dropping populated table; rows are lost");
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, batch: i32) -> LedgerEntry {
        LedgerEntry {
            name: name.into(),
            batch,
        }
    }

    #[test]
    fn shipped_plan_is_consistent() {
        let snap = Migrator::new("backoffice").check_plan().unwrap();
        assert!(snap.table("orders").unwrap().find("order_id").is_some());
        assert!(snap.table("product_specs").unwrap().find("special_price").is_some());
    }

    #[test]
    fn pending_skips_applied() {
        let m = Migrator::new("backoffice");
        let applied = [entry("m20250101_000000_create_base_tables", 1)];
        let names: Vec<_> = m.pending(&applied).unwrap().iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            [
                "m20250119_205700_add_order_id_to_orders_table",
                "m20250513_170627_add_special_price_to_product_specs_table"
            ]
        );
        assert!(matches!(m.pending(&[entry("nope", 1)]), Err(MigrationError::Unknown(_))));
    }

    #[test]
    fn last_batch_is_newest_first() {
        let m = Migrator::new("backoffice");
        let applied = [
            entry("m20250101_000000_create_base_tables", 1),
            entry("m20250119_205700_add_order_id_to_orders_table", 2),
            entry("m20250513_170627_add_special_price_to_product_specs_table", 2),
        ];
        let names: Vec<_> = m.last_batch(&applied).unwrap().iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            [
                "m20250513_170627_add_special_price_to_product_specs_table",
                "m20250119_205700_add_order_id_to_orders_table"
            ]
        );
        assert!(m.last_batch(&[]).unwrap().is_empty());
    }
}
