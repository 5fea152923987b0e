//! Back office: descriptor-driven admin CRUD and a small public API over PostgreSQL.

pub mod admin;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod resource;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, FieldErrors, MigrationError};
pub use migration::Migrator;
pub use resource::Registry;
pub use routes::app;
pub use service::{CrudService, FormValidator};
pub use settings::Settings;
pub use state::AppState;
pub use store::ensure_database_exists;
