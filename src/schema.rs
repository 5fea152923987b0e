//! Table and column definitions shared by entity models and migrations, plus an
//! in-memory snapshot used to replay migrations without a database.

use crate::error::MigrationError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Quote identifier for PostgreSQL (safe: only from code-declared definitions).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub(crate) fn quoted_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Column storage type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    BigSerial,
    BigInt,
    Integer,
    SmallInt,
    Boolean,
    /// VARCHAR(n).
    String(u32),
    Text,
    Decimal { precision: u8, scale: u8 },
    TimestampTz,
}

impl SqlType {
    pub fn ddl(&self) -> String {
        match self {
            SqlType::BigSerial => "BIGSERIAL".into(),
            SqlType::BigInt => "BIGINT".into(),
            SqlType::Integer => "INTEGER".into(),
            SqlType::SmallInt => "SMALLINT".into(),
            SqlType::Boolean => "BOOLEAN".into(),
            SqlType::String(n) => format!("VARCHAR({})", n),
            SqlType::Text => "TEXT".into(),
            SqlType::Decimal { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            SqlType::TimestampTz => "TIMESTAMPTZ".into(),
        }
    }

    /// Type name used to cast bound parameters (`$n::<name>`).
    pub fn cast_name(&self) -> &'static str {
        match self {
            SqlType::BigSerial | SqlType::BigInt => "bigint",
            SqlType::Integer => "integer",
            SqlType::SmallInt => "smallint",
            SqlType::Boolean => "boolean",
            SqlType::String(_) => "varchar",
            SqlType::Text => "text",
            SqlType::Decimal { .. } => "numeric",
            SqlType::TimestampTz => "timestamptz",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SqlType::Decimal { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    /// SQL expression used as DEFAULT.
    pub default: Option<String>,
    pub comment: Option<String>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    #[must_use]
    pub fn new(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_string(),
            sql_type,
            nullable: false,
            unique: false,
            primary_key: false,
            default: None,
            comment: None,
            references: None,
        }
    }

    #[must_use]
    pub fn id() -> Self {
        let mut c = Self::new("id", SqlType::BigSerial);
        c.primary_key = true;
        c
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default_expr(mut self, expr: &str) -> Self {
        self.default = Some(expr.to_string());
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    #[must_use]
    pub fn references(mut self, table: &str, column: &str, on_delete: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
            on_delete,
        });
        self
    }

    /// Column definition as used inside CREATE TABLE / ADD COLUMN (comment excluded).
    pub fn ddl(&self) -> String {
        let mut def = format!("{} {}", quoted(&self.name), self.sql_type.ddl());
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if self.nullable {
            def.push_str(" NULL");
        } else {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = self.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(ref fk) = self.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE {}",
                quoted(&fk.table),
                quoted(&fk.column),
                fk.on_delete
            ));
        }
        def
    }

    pub fn comment_sql(&self, table: &str) -> Option<String> {
        self.comment.as_ref().map(|c| {
            format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                quoted(table),
                quoted(&self.name),
                quoted_literal(c)
            )
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// created_at / updated_at managed by the database.
    #[must_use]
    pub fn timestamps(self) -> Self {
        self.column(ColumnDef::new("created_at", SqlType::TimestampTz).default_expr("NOW()"))
            .column(ColumnDef::new("updated_at", SqlType::TimestampTz).default_expr("NOW()"))
    }

    #[must_use]
    pub fn soft_deletes(self) -> Self {
        self.column(ColumnDef::new("deleted_at", SqlType::TimestampTz).nullable())
    }

    pub fn find(&self, column: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == column)
    }
}

/// In-memory view of the schema, keyed by table name. Column order is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, TableDef>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn create_table(&mut self, table: &TableDef) -> Result<(), MigrationError> {
        if self.tables.contains_key(&table.name) {
            return Err(MigrationError::Plan(format!("table {} already exists", table.name)));
        }
        self.tables.insert(table.name.clone(), table.clone());
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), MigrationError> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MigrationError::Plan(format!("table {} does not exist", name)))
    }

    /// Insert the column after `after` when given, otherwise at the end.
    pub fn add_column(&mut self, table: &str, column: &ColumnDef, after: Option<&str>) -> Result<(), MigrationError> {
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrationError::Plan(format!("table {} does not exist", table)))?;
        if t.find(&column.name).is_some() {
            return Err(MigrationError::Plan(format!("column {}.{} already exists", table, column.name)));
        }
        let pos = match after {
            Some(a) => {
                t.columns
                    .iter()
                    .position(|c| c.name == a)
                    .ok_or_else(|| MigrationError::Plan(format!("column {}.{} does not exist", table, a)))?
                    + 1
            }
            None => t.columns.len(),
        };
        t.columns.insert(pos, column.clone());
        Ok(())
    }

    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<(), MigrationError> {
        let t = self
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrationError::Plan(format!("table {} does not exist", table)))?;
        let pos = t
            .columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| MigrationError::Plan(format!("column {}.{} does not exist", table, column)))?;
        t.columns.remove(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_ddl_includes_constraints() {
        let c = ColumnDef::new("order_id", SqlType::String(255)).nullable().unique();
        assert_eq!(c.ddl(), "\"order_id\" VARCHAR(255) NULL UNIQUE");

        let fk = ColumnDef::new("product_id", SqlType::BigInt).references("products", "id", "CASCADE");
        assert_eq!(
            fk.ddl(),
            "\"product_id\" BIGINT NOT NULL REFERENCES \"products\" (\"id\") ON DELETE CASCADE"
        );
        assert_eq!(ColumnDef::id().ddl(), "\"id\" BIGSERIAL PRIMARY KEY");
    }

    #[test]
    fn comment_is_escaped() {
        let c = ColumnDef::new("note", SqlType::Text).comment("it's");
        assert_eq!(
            c.comment_sql("t").as_deref(),
            Some("COMMENT ON COLUMN \"t\".\"note\" IS 'it''s'")
        );
    }

    #[test]
    fn add_column_respects_position() {
        let mut snap = SchemaSnapshot::default();
        let t = TableDef::new("orders").column(ColumnDef::id()).timestamps();
        snap.create_table(&t).unwrap();
        snap.add_column("orders", &ColumnDef::new("order_id", SqlType::String(255)), Some("id"))
            .unwrap();
        let names: Vec<_> = snap.table("orders").unwrap().columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "order_id", "created_at", "updated_at"]);
        assert!(snap.drop_column("orders", "missing").is_err());
    }
}
