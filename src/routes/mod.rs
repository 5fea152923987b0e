//! Router assembly.

mod admin;
mod api;
mod common;

pub use admin::admin_routes;
pub use api::api_routes;
pub use common::common_routes;

use crate::resource::pages::ADMIN_PREFIX;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: health routes, `/admin` and `/api`, with request tracing
/// and a body size limit.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(ADMIN_PREFIX, admin_routes(state.clone()))
        .nest("/api", api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
}
