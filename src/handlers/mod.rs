//! HTTP handlers for the admin panel and the public API.

pub mod admin;
pub mod api;
