//! Admin routes, mounted under `/admin`. Resources are resolved by path
//! segment at request time from the registry.

use crate::handlers::admin::{
    bulk_destroy, create_form, destroy, edit_form, index, navigation, patch, show, store, update,
};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(navigation))
        .route("/:resource", get(index).post(store))
        .route("/:resource/create", get(create_form))
        .route("/:resource/bulk-delete", post(bulk_destroy))
        .route(
            "/:resource/:id",
            get(show).put(update).patch(patch).delete(destroy),
        )
        .route("/:resource/:id/edit", get(edit_form))
        .with_state(state)
}
