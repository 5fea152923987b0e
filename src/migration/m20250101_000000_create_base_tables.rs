use crate::migration::{Migration, SchemaChange};
use crate::schema::{ColumnDef, SqlType, TableDef};

pub struct CreateBaseTables;

fn flag(name: &str, default: &str) -> ColumnDef {
    ColumnDef::new(name, SqlType::SmallInt).default_expr(default)
}

fn money(name: &str) -> ColumnDef {
    ColumnDef::new(name, SqlType::Decimal { precision: 10, scale: 2 }).default_expr("0")
}

fn tables() -> Vec<TableDef> {
    vec![
        TableDef::new("members")
            .column(ColumnDef::id())
            .column(ColumnDef::new("name", SqlType::String(255)))
            .column(ColumnDef::new("email", SqlType::String(255)))
            .column(ColumnDef::new("phone", SqlType::String(255)))
            .column(ColumnDef::new("address", SqlType::String(255)))
            .column(ColumnDef::new("gender", SqlType::String(255)))
            .column(ColumnDef::new("is_active", SqlType::Boolean).default_expr("TRUE"))
            .timestamps()
            .soft_deletes(),
        TableDef::new("categories")
            .column(ColumnDef::id())
            .column(ColumnDef::new("name", SqlType::String(255)))
            .column(ColumnDef::new("sort", SqlType::Integer).default_expr("0"))
            .column(flag("is_active", "1"))
            .timestamps(),
        TableDef::new("products")
            .column(ColumnDef::id())
            .column(
                ColumnDef::new("category_id", SqlType::BigInt)
                    .nullable()
                    .references("categories", "id", "SET NULL"),
            )
            .column(ColumnDef::new("name", SqlType::String(255)))
            .column(ColumnDef::new("description", SqlType::Text).nullable())
            .column(money("price"))
            .column(flag("is_active", "1"))
            .column(ColumnDef::new("sort", SqlType::Integer).default_expr("0"))
            .timestamps()
            .soft_deletes(),
        TableDef::new("product_specs")
            .column(ColumnDef::id())
            .column(ColumnDef::new("product_id", SqlType::BigInt).references("products", "id", "CASCADE"))
            .column(ColumnDef::new("name", SqlType::String(255)))
            .column(money("price"))
            .column(ColumnDef::new("stock", SqlType::Integer).default_expr("0"))
            .column(flag("is_active", "1"))
            .column(ColumnDef::new("sort", SqlType::Integer).default_expr("0"))
            .timestamps(),
        TableDef::new("orders")
            .column(ColumnDef::id())
            .column(
                ColumnDef::new("member_id", SqlType::BigInt)
                    .nullable()
                    .references("members", "id", "SET NULL"),
            )
            .column(money("total"))
            .column(ColumnDef::new("status", SqlType::String(255)).default_expr("'pending'"))
            .timestamps(),
        TableDef::new("faq_categories")
            .column(ColumnDef::id())
            .column(ColumnDef::new("name", SqlType::String(255)))
            .column(ColumnDef::new("sort", SqlType::Integer).default_expr("0"))
            .column(flag("is_active", "1"))
            .timestamps(),
    ]
}

impl Migration for CreateBaseTables {
    fn name(&self) -> &'static str {
        "m20250101_000000_create_base_tables"
    }

    fn up(&self) -> Vec<SchemaChange> {
        tables().into_iter().map(SchemaChange::CreateTable).collect()
    }

    fn down(&self) -> Vec<SchemaChange> {
        tables().into_iter().rev().map(SchemaChange::DropTable).collect()
    }
}
