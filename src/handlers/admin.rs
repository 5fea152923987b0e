//! Admin resource handlers: list, create form, store, edit form, update,
//! inline toggle, delete, bulk delete.

use crate::error::AppError;
use crate::model::EntityModel;
use crate::resource::{BulkAction, ColumnKind, Navigation, PageKind, Pages, ResourceDescriptor, RowAction};
use crate::response::{redirect_meta, success_many, success_one, success_one_ok, success_page};
use crate::service::{CrudService, FormValidator, ListParams};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

fn resolve<'a>(state: &'a AppState, slug: &str) -> Result<(&'a ResourceDescriptor, &'a EntityModel), AppError> {
    state
        .registry
        .resolve(slug)
        .ok_or_else(|| AppError::NotFound(format!("resource {}", slug)))
}

fn parse_id(id_str: &str) -> Result<Value, AppError> {
    let n: i64 = id_str.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
    Ok(Value::Number(n.into()))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn require_action(resource: &ResourceDescriptor, action: RowAction) -> Result<(), AppError> {
    if resource.table.has_action(action) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{:?} not allowed on {}", action, resource.slug).to_lowercase()))
    }
}

fn record_key(entity: &EntityModel, row: &Value) -> String {
    match row.get(&entity.primary_key) {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

#[derive(Serialize)]
struct NavigationEntry {
    slug: String,
    url: String,
    #[serde(flatten)]
    navigation: Navigation,
}

/// GET /admin: navigation of every registered resource.
pub async fn navigation(State(state): State<AppState>) -> impl IntoResponse {
    let entries: Vec<NavigationEntry> = state
        .registry
        .resources()
        .iter()
        .map(|r| NavigationEntry {
            slug: r.slug.clone(),
            url: Pages::url(&r.slug, PageKind::Index, None),
            navigation: r.navigation.clone(),
        })
        .collect();
    success_many(entries)
}

/// GET /admin/:resource. Rows carry the raw record and its display cells.
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    let params = ListParams::parse(resource, entity, &params)?;
    let (rows, meta) = CrudService::page(&state.pool, entity, &params).await?;
    let data: Vec<Value> = rows
        .into_iter()
        .map(|row| {
            let id = row.get(&entity.primary_key).cloned().unwrap_or(Value::Null);
            let cells = resource.table.render_row(&row);
            json!({ "id": id, "cells": cells, "record": row })
        })
        .collect();
    Ok(success_page(data, meta, resource.table.clone()))
}

/// GET /admin/:resource/create
pub async fn create_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, _) = resolve(&state, &slug)?;
    Ok(success_one_ok(
        json!({
            "form": resource.form,
            "action": Pages::url(&resource.slug, PageKind::Index, None),
        }),
        None,
    ))
}

/// POST /admin/:resource. Nothing is written unless the whole form validates.
pub async fn store(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    let body = body_to_map(body)?;
    let values = FormValidator::validate(&resource.form, &body)?;
    let attributes = entity.fill(&values)?;
    let row = CrudService::create(&state.pool, entity, &attributes).await?;
    let key = record_key(entity, &row);
    tracing::info!(resource = %resource.slug, id = %key, "record created");
    let url = Pages::redirect_url(&resource.slug, resource.pages.after_create, &key);
    Ok(success_one(row, redirect_meta(url)))
}

/// GET /admin/:resource/:id
pub async fn show(
    State(state): State<AppState>,
    Path((slug, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, entity, resource.query_scope, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(success_one_ok(row, None))
}

/// GET /admin/:resource/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path((slug, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    require_action(resource, RowAction::Edit)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, entity, resource.query_scope, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str.clone()))?;
    Ok(success_one_ok(
        json!({
            "form": resource.form,
            "record": row,
            "action": format!("{}/{}", Pages::url(&resource.slug, PageKind::Index, None), id_str),
        }),
        None,
    ))
}

/// PUT /admin/:resource/:id: full form submission.
pub async fn update(
    State(state): State<AppState>,
    Path((slug, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    require_action(resource, RowAction::Edit)?;
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    let values = FormValidator::validate(&resource.form, &body)?;
    let attributes = entity.fill(&values)?;
    let row = CrudService::update(&state.pool, entity, resource.query_scope, &id, &attributes)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str.clone()))?;
    let url = Pages::redirect_url(&resource.slug, resource.pages.after_edit, &id_str);
    Ok(success_one_ok(row, redirect_meta(url)))
}

/// PATCH /admin/:resource/:id: inline edit of the table's toggle columns.
pub async fn patch(
    State(state): State<AppState>,
    Path((slug, id_str)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    let id = parse_id(&id_str)?;
    let body = body_to_map(body)?;
    let inline: Map<String, Value> = body
        .into_iter()
        .filter(|(k, _)| {
            resource
                .table
                .column(k)
                .is_some_and(|c| c.kind == ColumnKind::Toggle)
        })
        .collect();
    if inline.is_empty() {
        return Err(AppError::BadRequest("no inline-editable column in body".into()));
    }
    let values = FormValidator::validate_partial(&resource.form, &inline)?;
    let attributes = entity.fill(&values)?;
    let row = CrudService::update(&state.pool, entity, resource.query_scope, &id, &attributes)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(success_one_ok(row, None))
}

/// DELETE /admin/:resource/:id
pub async fn destroy(
    State(state): State<AppState>,
    Path((slug, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    require_action(resource, RowAction::Delete)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.pool, entity, resource.query_scope, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(id_str))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct BulkDeleteBody {
    pub ids: Vec<i64>,
}

/// POST /admin/:resource/bulk-delete with `{ "ids": [..] }`.
pub async fn bulk_destroy(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<BulkDeleteBody>,
) -> Result<impl IntoResponse, AppError> {
    let (resource, entity) = resolve(&state, &slug)?;
    if !resource.table.has_bulk_action(BulkAction::DeleteMany) {
        return Err(AppError::BadRequest(format!("delete_many not allowed on {}", resource.slug)));
    }
    let ids: Vec<Value> = body.ids.into_iter().map(Value::from).collect();
    let deleted = CrudService::delete_many(&state.pool, entity, resource.query_scope, &ids).await?;
    Ok(success_one_ok(json!({ "deleted": deleted }), None))
}
