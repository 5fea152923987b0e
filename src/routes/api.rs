//! Public API routes, mounted under `/api`.

use crate::handlers::api::{categories, products};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/products", get(products))
        .route("/categories", get(categories))
        .with_state(state)
}
