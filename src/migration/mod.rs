//! Versioned, reversible schema changes and the runner that applies them.
//!
//! A migration is a list of [`SchemaChange`]s. Changes render to DDL for
//! PostgreSQL and can also be replayed against a [`SchemaSnapshot`], which is
//! how plans are checked without a database.

mod m20250101_000000_create_base_tables;
mod m20250119_205700_add_order_id_to_orders_table;
mod m20250513_170627_add_special_price_to_product_specs_table;
mod runner;

pub use runner::{Applied, MigrationStatus, Migrator};

use crate::error::MigrationError;
use crate::schema::{quoted, ColumnDef, SchemaSnapshot, TableDef};
use async_trait::async_trait;
use sqlx::PgConnection;

/// One reversible schema edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaChange {
    CreateTable(TableDef),
    /// Carries the full definition so it can be inverted.
    DropTable(TableDef),
    AddColumn {
        table: String,
        column: ColumnDef,
        /// Position hint. PostgreSQL always appends; the snapshot honours it.
        after: Option<String>,
    },
    DropColumn {
        table: String,
        column: ColumnDef,
        after: Option<String>,
    },
}

impl SchemaChange {
    pub fn add_column(table: &str, column: ColumnDef, after: Option<&str>) -> Self {
        SchemaChange::AddColumn {
            table: table.to_string(),
            column,
            after: after.map(str::to_string),
        }
    }

    pub fn drop_column(table: &str, column: ColumnDef, after: Option<&str>) -> Self {
        SchemaChange::DropColumn {
            table: table.to_string(),
            column,
            after: after.map(str::to_string),
        }
    }

    /// The change that undoes this one.
    pub fn inverse(&self) -> SchemaChange {
        match self {
            SchemaChange::CreateTable(t) => SchemaChange::DropTable(t.clone()),
            SchemaChange::DropTable(t) => SchemaChange::CreateTable(t.clone()),
            SchemaChange::AddColumn { table, column, after } => SchemaChange::DropColumn {
                table: table.clone(),
                column: column.clone(),
                after: after.clone(),
            },
            SchemaChange::DropColumn { table, column, after } => SchemaChange::AddColumn {
                table: table.clone(),
                column: column.clone(),
                after: after.clone(),
            },
        }
    }

    /// Whether applying this change discards stored data.
    pub fn is_destructive(&self) -> bool {
        matches!(self, SchemaChange::DropTable(_) | SchemaChange::DropColumn { .. })
    }

    /// DDL statements, in execution order.
    pub fn statements(&self) -> Vec<String> {
        match self {
            SchemaChange::CreateTable(t) => {
                let cols: Vec<String> = t.columns.iter().map(ColumnDef::ddl).collect();
                let mut out = vec![format!("CREATE TABLE {} (\n  {}\n)", quoted(&t.name), cols.join(",\n  "))];
                out.extend(t.columns.iter().filter_map(|c| c.comment_sql(&t.name)));
                out
            }
            SchemaChange::DropTable(t) => vec![format!("DROP TABLE {}", quoted(&t.name))],
            SchemaChange::AddColumn { table, column, .. } => {
                let mut out = vec![format!("ALTER TABLE {} ADD COLUMN {}", quoted(table), column.ddl())];
                out.extend(column.comment_sql(table));
                out
            }
            SchemaChange::DropColumn { table, column, .. } => vec![format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quoted(table),
                quoted(&column.name)
            )],
        }
    }

    pub fn apply_to(&self, snapshot: &mut SchemaSnapshot) -> Result<(), MigrationError> {
        match self {
            SchemaChange::CreateTable(t) => snapshot.create_table(t),
            SchemaChange::DropTable(t) => snapshot.drop_table(&t.name),
            SchemaChange::AddColumn { table, column, after } => snapshot.add_column(table, column, after.as_deref()),
            SchemaChange::DropColumn { table, column, .. } => snapshot.drop_column(table, &column.name),
        }
    }
}

/// A named, reversible migration step. Names sort in application order.
#[async_trait]
pub trait Migration: Send + Sync {
    fn name(&self) -> &'static str;

    fn up(&self) -> Vec<SchemaChange>;

    /// Defaults to the inverse of `up`, last change first.
    fn down(&self) -> Vec<SchemaChange> {
        self.up().iter().rev().map(SchemaChange::inverse).collect()
    }

    async fn apply(&self, conn: &mut PgConnection) -> Result<(), MigrationError> {
        execute_changes(conn, &self.up()).await
    }

    async fn revert(&self, conn: &mut PgConnection) -> Result<(), MigrationError> {
        execute_changes(conn, &self.down()).await
    }
}

async fn execute_changes(conn: &mut PgConnection, changes: &[SchemaChange]) -> Result<(), MigrationError> {
    for change in changes {
        for sql in change.statements() {
            tracing::debug!(sql = %sql, "ddl");
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
    }
    Ok(())
}

/// Every migration, in application order.
pub fn all() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(m20250101_000000_create_base_tables::CreateBaseTables),
        Box::new(m20250119_205700_add_order_id_to_orders_table::AddOrderIdToOrdersTable),
        Box::new(m20250513_170627_add_special_price_to_product_specs_table::AddSpecialPriceToProductSpecsTable),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay(migrations: &[Box<dyn Migration>]) -> SchemaSnapshot {
        let mut snap = SchemaSnapshot::default();
        for m in migrations {
            for c in m.up() {
                c.apply_to(&mut snap).unwrap();
            }
        }
        snap
    }

    #[test]
    fn names_are_sorted_and_unique() {
        let names: Vec<_> = all().iter().map(|m| m.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn every_migration_round_trips_on_a_snapshot() {
        let migrations = all();
        for i in 0..migrations.len() {
            let before = replay(&migrations[..i]);
            let mut snap = before.clone();
            for c in migrations[i].up() {
                c.apply_to(&mut snap).unwrap();
            }
            assert_ne!(snap, before, "{} changes nothing", migrations[i].name());
            for c in migrations[i].down() {
                c.apply_to(&mut snap).unwrap();
            }
            assert_eq!(snap, before, "{} does not revert cleanly", migrations[i].name());
        }
    }

    #[test]
    fn order_id_lands_after_id() {
        let snap = replay(&all());
        let orders = snap.table("orders").unwrap();
        assert_eq!(orders.columns[1].name, "order_id");
        let col = orders.find("order_id").unwrap();
        assert!(col.nullable && col.unique);

        let specs = snap.table("product_specs").unwrap();
        let pos = |n: &str| specs.columns.iter().position(|c| c.name == n).unwrap();
        assert_eq!(pos("special_price"), pos("price") + 1);
    }

    #[test]
    fn add_column_sql_and_inverse() {
        let change = SchemaChange::add_column(
            "product_specs",
            ColumnDef::new("special_price", crate::schema::SqlType::Decimal { precision: 10, scale: 2 })
                .nullable()
                .comment("優惠價"),
            Some("price"),
        );
        assert_eq!(
            change.statements(),
            vec![
                "ALTER TABLE \"product_specs\" ADD COLUMN \"special_price\" NUMERIC(10, 2) NULL".to_string(),
                "COMMENT ON COLUMN \"product_specs\".\"special_price\" IS '優惠價'".to_string(),
            ]
        );
        let inv = change.inverse();
        assert!(inv.is_destructive());
        assert_eq!(
            inv.statements(),
            vec!["ALTER TABLE \"product_specs\" DROP COLUMN \"special_price\"".to_string()]
        );
        assert_eq!(inv.inverse(), change);
    }
}
