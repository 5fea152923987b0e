//! Public read-only API: list views of products and categories.

use crate::error::AppError;
use crate::model::{category, product};
use crate::resource::QueryScope;
use crate::response::success_many;
use crate::service::CrudService;
use crate::sql::ListQuery;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

async fn list_table(state: &AppState, table: &str) -> Result<Vec<serde_json::Value>, AppError> {
    let entity = state
        .registry
        .entity(table)
        .ok_or_else(|| AppError::NotFound(format!("entity {}", table)))?;
    CrudService::list(&state.pool, entity, &ListQuery::all(QueryScope::Default)).await
}

/// GET /api/products
pub async fn products(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(list_table(&state, product::TABLE).await?))
}

/// GET /api/categories
pub async fn categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(list_table(&state, category::TABLE).await?))
}
