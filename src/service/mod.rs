//! CrudService: generic CRUD using safe SQL builder.

mod crud;
pub mod listing;
mod validation;
pub use crud::CrudService;
pub use listing::{ListParams, PageMeta};
pub use validation::FormValidator;
