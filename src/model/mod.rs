//! Entity models backing the admin resources and the public API.

pub mod category;
pub mod entity;
pub mod faq_category;
pub mod member;
pub mod order;
pub mod product;
pub mod product_spec;

pub use entity::{Attribute, BelongsTo, Cast, EntityModel, SOFT_DELETE_COLUMN};
pub(crate) use entity::as_flag;
pub use member::Gender;
pub use product::Product;
pub use product_spec::ProductSpec;

/// Every entity known to the service.
pub fn all() -> Vec<EntityModel> {
    vec![
        member::entity(),
        category::entity(),
        product::entity(),
        product_spec::entity(),
        order::entity(),
        faq_category::entity(),
    ]
}
