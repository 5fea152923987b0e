//! Standard response envelope helpers.

use crate::service::PageMeta;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// One page of a list, with paging meta and whatever describes the rows.
#[derive(Serialize)]
pub struct SuccessPage<T, S> {
    pub data: Vec<T>,
    pub meta: PageMeta,
    pub schema: S,
}

/// Meta carrying the page a client should show next.
pub fn redirect_meta(url: String) -> Option<serde_json::Value> {
    Some(serde_json::json!({ "redirect": url }))
}

pub fn success_one<T: Serialize>(data: T, meta: Option<serde_json::Value>) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data, meta }))
}

pub fn success_one_ok<T: Serialize>(data: T, meta: Option<serde_json::Value>) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

pub fn success_page<T: Serialize, S: Serialize>(
    data: Vec<T>,
    meta: PageMeta,
    schema: S,
) -> (StatusCode, Json<SuccessPage<T, S>>) {
    (StatusCode::OK, Json(SuccessPage { data, meta, schema }))
}
