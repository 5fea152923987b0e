//! One immutable configuration record per resource.

use crate::resource::form::FormSchema;
use crate::resource::pages::Pages;
use crate::resource::table::TableSchema;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct Navigation {
    pub icon: String,
    pub group: String,
    pub label: String,
    pub model_label: String,
    pub plural_model_label: String,
}

/// Which rows the resource query sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryScope {
    /// Soft-deleted rows are hidden.
    Default,
    /// Soft-deletion filter removed: flagged rows stay visible.
    WithTrashed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResourceDescriptor {
    /// URL path segment, e.g. "members".
    pub slug: String,
    /// Table name of the backing entity model.
    pub entity: String,
    pub navigation: Navigation,
    pub form: FormSchema,
    pub table: TableSchema,
    pub query_scope: QueryScope,
    pub pages: Pages,
}
