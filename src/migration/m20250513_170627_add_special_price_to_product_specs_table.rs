use crate::migration::{Migration, SchemaChange};
use crate::schema::{ColumnDef, SqlType};

pub struct AddSpecialPriceToProductSpecsTable;

fn special_price() -> ColumnDef {
    ColumnDef::new("special_price", SqlType::Decimal { precision: 10, scale: 2 })
        .nullable()
        .comment("優惠價")
}

impl Migration for AddSpecialPriceToProductSpecsTable {
    fn name(&self) -> &'static str {
        "m20250513_170627_add_special_price_to_product_specs_table"
    }

    fn up(&self) -> Vec<SchemaChange> {
        vec![SchemaChange::add_column("product_specs", special_price(), Some("price"))]
    }

    fn down(&self) -> Vec<SchemaChange> {
        vec![SchemaChange::drop_column("product_specs", special_price(), Some("price"))]
    }
}
