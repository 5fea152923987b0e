use crate::model::EntityModel;
use crate::model::entity::{Attribute, Cast};
use crate::schema::SqlType;

pub const TABLE: &str = "orders";

/// `order_id` is the human-facing identifier, unique when present.
pub fn entity() -> EntityModel {
    EntityModel::new(TABLE)
        .attribute(Attribute::new("order_id", SqlType::String(255)).nullable())
        .attribute(Attribute::new("member_id", SqlType::BigInt).nullable())
        .attribute(
            Attribute::new("total", SqlType::Decimal { precision: 10, scale: 2 })
                .cast(Cast::Decimal(2))
                .with_default(),
        )
        .attribute(Attribute::new("status", SqlType::String(255)).with_default())
        .fillable(&["order_id", "member_id", "total", "status"])
        .belongs_to("member", "member_id", "members")
        .timestamps()
}
