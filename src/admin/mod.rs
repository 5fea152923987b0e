//! Admin resources served under `/admin`.

pub mod faq_categories;
pub mod members;

use crate::error::ConfigError;
use crate::model;
use crate::resource::Registry;

/// Registry with every entity model and admin resource.
pub fn registry() -> Result<Registry, ConfigError> {
    Registry::build(model::all(), vec![members::resource(), faq_categories::resource()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_is_consistent() {
        let r = registry().unwrap();
        assert!(r.resolve("members").is_some());
        assert!(r.resolve("faq-categories").is_some());
        assert!(r.entity("products").is_some());
        assert!(r.entity("categories").is_some());
        assert!(r.resolve("orders").is_none());
    }
}
