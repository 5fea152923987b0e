//! Page bindings: URL fragments of the standard resource pages and where
//! create/edit submissions land afterwards.

use serde::Serialize;

/// Mount point of the admin panel.
pub const ADMIN_PREFIX: &str = "/admin";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Index,
    Create,
    Edit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Redirect {
    /// Back to the list page.
    Index,
    /// Edit page of the record just written.
    Edit,
}

#[derive(Clone, Debug, Serialize)]
pub struct Pages {
    pub after_create: Redirect,
    pub after_edit: Redirect,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            after_create: Redirect::Edit,
            after_edit: Redirect::Edit,
        }
    }
}

impl Pages {
    #[must_use]
    pub fn after_create(mut self, redirect: Redirect) -> Self {
        self.after_create = redirect;
        self
    }

    /// Path of one page. `record` is required for [`PageKind::Edit`] and ignored otherwise.
    pub fn url(slug: &str, kind: PageKind, record: Option<&str>) -> String {
        match (kind, record) {
            (PageKind::Index, _) => format!("{}/{}", ADMIN_PREFIX, slug),
            (PageKind::Create, _) => format!("{}/{}/create", ADMIN_PREFIX, slug),
            (PageKind::Edit, Some(id)) => format!("{}/{}/{}/edit", ADMIN_PREFIX, slug, id),
            (PageKind::Edit, None) => format!("{}/{}", ADMIN_PREFIX, slug),
        }
    }

    pub fn redirect_url(slug: &str, redirect: Redirect, record: &str) -> String {
        match redirect {
            Redirect::Index => Self::url(slug, PageKind::Index, None),
            Redirect::Edit => Self::url(slug, PageKind::Edit, Some(record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_urls() {
        assert_eq!(Pages::url("members", PageKind::Index, None), "/admin/members");
        assert_eq!(Pages::url("members", PageKind::Create, None), "/admin/members/create");
        assert_eq!(Pages::url("members", PageKind::Edit, Some("7")), "/admin/members/7/edit");
    }

    #[test]
    fn redirects() {
        assert_eq!(Pages::redirect_url("faq-categories", Redirect::Index, "3"), "/admin/faq-categories");
        assert_eq!(Pages::redirect_url("members", Redirect::Edit, "3"), "/admin/members/3/edit");
    }
}
