use crate::migration::{Migration, SchemaChange};
use crate::schema::{ColumnDef, SqlType};

pub struct AddOrderIdToOrdersTable;

fn order_id() -> ColumnDef {
    ColumnDef::new("order_id", SqlType::String(255)).nullable().unique()
}

impl Migration for AddOrderIdToOrdersTable {
    fn name(&self) -> &'static str {
        "m20250119_205700_add_order_id_to_orders_table"
    }

    fn up(&self) -> Vec<SchemaChange> {
        vec![SchemaChange::add_column("orders", order_id(), Some("id"))]
    }

    /// Drops the column; stored order ids are lost.
    fn down(&self) -> Vec<SchemaChange> {
        vec![SchemaChange::drop_column("orders", order_id(), Some("id"))]
    }
}
