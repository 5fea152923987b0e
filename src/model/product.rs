//! Product: aggregate root owning its specs.

use crate::error::AppError;
use crate::model::EntityModel;
use crate::model::entity::{Attribute, Cast};
use crate::schema::SqlType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

pub const TABLE: &str = "products";

pub fn entity() -> EntityModel {
    EntityModel::new(TABLE)
        .attribute(Attribute::new("category_id", SqlType::BigInt).nullable())
        .attribute(Attribute::new("name", SqlType::String(255)))
        .attribute(Attribute::new("description", SqlType::Text).nullable())
        .attribute(
            Attribute::new("price", SqlType::Decimal { precision: 10, scale: 2 })
                .cast(Cast::Decimal(2))
                .with_default(),
        )
        .attribute(Attribute::new("is_active", SqlType::SmallInt).cast(Cast::Boolean).with_default())
        .attribute(Attribute::new("sort", SqlType::Integer).with_default())
        .fillable(&["category_id", "name", "description", "price", "is_active", "sort"])
        .belongs_to("category", "category_id", "categories")
        .timestamps()
        .soft_deletes()
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub sort: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Find a product that is not soft-deleted.
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Product>, AppError> {
        let sql = "SELECT id, category_id, name, description, price, is_active <> 0 AS is_active, sort, created_at, updated_at \
                   FROM public.products WHERE id = $1 AND deleted_at IS NULL";
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, Product>(sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }
}
