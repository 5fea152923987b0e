//! Product category listed by the public API.

use crate::model::EntityModel;
use crate::model::entity::{Attribute, Cast};
use crate::schema::SqlType;

pub const TABLE: &str = "categories";

pub fn entity() -> EntityModel {
    EntityModel::new(TABLE)
        .attribute(Attribute::new("name", SqlType::String(255)))
        .attribute(Attribute::new("sort", SqlType::Integer).with_default())
        .attribute(Attribute::new("is_active", SqlType::SmallInt).cast(Cast::Boolean).with_default())
        .fillable(&["name", "sort", "is_active"])
        .timestamps()
}
