//! Purchasable variant of a product.

use crate::error::AppError;
use crate::model::entity::{Attribute, Cast};
use crate::model::{EntityModel, Product};
use crate::schema::SqlType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

pub const TABLE: &str = "product_specs";

/// Attributes writable from request input.
pub const FILLABLE: [&str; 7] = [
    "product_id",
    "name",
    "price",
    "special_price",
    "stock",
    "is_active",
    "sort",
];

pub fn entity() -> EntityModel {
    EntityModel::new(TABLE)
        .attribute(Attribute::new("product_id", SqlType::BigInt))
        .attribute(Attribute::new("name", SqlType::String(255)))
        .attribute(
            Attribute::new("price", SqlType::Decimal { precision: 10, scale: 2 })
                .cast(Cast::Decimal(2))
                .with_default(),
        )
        .attribute(
            Attribute::new("special_price", SqlType::Decimal { precision: 10, scale: 2 })
                .cast(Cast::Decimal(2))
                .nullable(),
        )
        .attribute(Attribute::new("stock", SqlType::Integer).cast(Cast::Integer).with_default())
        .attribute(Attribute::new("is_active", SqlType::SmallInt).cast(Cast::Boolean).with_default())
        .attribute(Attribute::new("sort", SqlType::Integer).cast(Cast::Integer).with_default())
        .fillable(&FILLABLE)
        .belongs_to("product", "product_id", super::product::TABLE)
        .timestamps()
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct ProductSpec {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    /// Discounted price. Expected to be <= price; not enforced by storage.
    pub special_price: Option<Decimal>,
    pub stock: i32,
    pub is_active: bool,
    pub sort: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SELECT: &str = "SELECT id, product_id, name, price, special_price, stock, is_active <> 0 AS is_active, sort, created_at, updated_at \
                      FROM public.product_specs";

impl ProductSpec {
    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<ProductSpec>, AppError> {
        let sql = format!("{} WHERE id = $1", SELECT);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, ProductSpec>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        if let Some(spec) = row.as_ref().filter(|s| !s.special_price_consistent()) {
            tracing::warn!(id = spec.id, price = %spec.price, special_price = ?spec.special_price, "special price above list price");
        }
        Ok(row)
    }

    /// Owning product, resolved through `product_id`.
    pub async fn product(&self, pool: &PgPool) -> Result<Option<Product>, AppError> {
        Product::find(pool, self.product_id).await
    }

    /// Whether the special price, when present, respects `special_price <= price`.
    pub fn special_price_consistent(&self) -> bool {
        self.special_price.map_or(true, |sp| sp <= self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn spec(price: &str, special: Option<&str>) -> ProductSpec {
        ProductSpec {
            id: 1,
            product_id: 1,
            name: "M".into(),
            price: Decimal::from_str(price).unwrap(),
            special_price: special.map(|s| Decimal::from_str(s).unwrap()),
            stock: 3,
            is_active: true,
            sort: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_whitelisted_attributes_are_mass_assignable() {
        let input = json!({
            "product_id": 4, "name": "L", "price": "100", "special_price": null,
            "stock": "7", "is_active": true, "sort": 2, "id": 99, "created_at": "2020-01-01"
        });
        let out = entity().fill(input.as_object().unwrap()).unwrap();
        let mut keys: Vec<_> = out.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = FILLABLE.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(out["is_active"], json!(1));
        assert_eq!(out["price"], json!("100.00"));
        assert_eq!(out["stock"], json!(7));
    }

    #[test]
    fn is_active_surfaces_as_bool() {
        let row = entity().cast_row(json!({ "is_active": 1, "special_price": null }));
        assert_eq!(row["is_active"], json!(true));
        assert_eq!(row["special_price"], json!(null));
    }

    #[test]
    fn special_price_is_not_enforced_but_checked() {
        assert!(spec("100", Some("80")).special_price_consistent());
        assert!(spec("100", Some("100")).special_price_consistent());
        let odd = spec("100", Some("120"));
        assert!(!odd.special_price_consistent());
        assert_eq!(odd.special_price, Some(Decimal::from(120)));
        assert!(spec("100", None).special_price_consistent());
    }

    #[test]
    fn product_relation_is_declared() {
        let rel = entity().relation("product").cloned().unwrap();
        assert_eq!(rel.foreign_key, "product_id");
        assert_eq!(rel.related_table, "products");
    }
}
