//! Member resource.

use crate::model::member::{self, gender_label, Gender};
use crate::resource::{
    BulkAction, FormField, FormSchema, Navigation, PageSize, Pages, QueryScope, ResourceDescriptor, RowAction,
    SelectOption, SortDirection, TableColumn, TableFilter, TableSchema,
};

pub const SLUG: &str = "members";

fn gender_options() -> Vec<SelectOption> {
    Gender::ALL
        .iter()
        .map(|g| SelectOption::new(g.as_str(), g.label()))
        .collect()
}

pub fn form() -> FormSchema {
    FormSchema::new(vec![
        FormField::text("name", "姓名").required().max_length(255),
        FormField::text("email", "電子郵件").email().required().max_length(255),
        FormField::text("phone", "電話").tel().required().max_length(255),
        FormField::text("address", "地址").required().max_length(255),
        FormField::select("gender", "性別", gender_options()).required(),
        FormField::toggle("is_active", "啟用狀態")
            .column_span_full()
            .inline(false)
            .required(),
    ])
}

pub fn table() -> TableSchema {
    TableSchema::new(vec![
        TableColumn::text("name", "姓名").searchable(),
        TableColumn::text("email", "電子郵件").searchable(),
        TableColumn::text("phone", "電話").searchable(),
        TableColumn::text("gender", "性別").format_state_using(gender_label),
        TableColumn::toggle("is_active", "啟用狀態"),
        TableColumn::text("created_at", "創建時間")
            .date_time()
            .sortable()
            .toggleable(true),
        TableColumn::text("updated_at", "更新時間")
            .date_time()
            .sortable()
            .toggleable(true),
    ])
    .filters(vec![
        TableFilter::select("gender", "性別", gender_options()),
        TableFilter::ternary("is_active", "啟用狀態"),
    ])
    .actions(vec![RowAction::Edit, RowAction::Delete])
    .bulk_actions(vec![BulkAction::DeleteMany])
    .default_sort("created_at", SortDirection::Desc)
    .paginated(
        vec![
            PageSize::Count(10),
            PageSize::Count(20),
            PageSize::Count(30),
            PageSize::Count(50),
            PageSize::Count(100),
            PageSize::All,
        ],
        PageSize::Count(20),
    )
}

pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor {
        slug: SLUG.into(),
        entity: member::TABLE.into(),
        navigation: Navigation {
            icon: "heroicon-o-users".into(),
            group: "網站管理".into(),
            label: "會員管理".into(),
            model_label: "會員".into(),
            plural_model_label: "會員".into(),
        },
        form: form(),
        table: table(),
        // Soft-deleted members stay listed; see DESIGN.md before changing.
        query_scope: QueryScope::WithTrashed,
        pages: Pages::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_renders_gender_labels_with_fallback() {
        let t = table();
        let cells = t.render_row(&json!({ "gender": "male" }));
        assert_eq!(cells["gender"], json!("男"));
        let cells = t.render_row(&json!({ "gender": "female" }));
        assert_eq!(cells["gender"], json!("女"));
        for odd in [json!(null), json!(""), json!("x"), json!(1)] {
            let cells = t.render_row(&json!({ "gender": odd }));
            assert_eq!(cells["gender"], json!("未知"));
        }
        let cells = t.render_row(&json!({}));
        assert_eq!(cells["gender"], json!("未知"));
    }

    #[test]
    fn timestamps_are_hidden_by_default() {
        let t = table();
        let created = t.column("created_at").unwrap();
        assert!(created.sortable && created.toggleable && created.hidden_by_default);
        assert!(!t.column("name").unwrap().hidden_by_default);
        assert_eq!(t.searchable_columns(), ["name", "email", "phone"]);
    }

    #[test]
    fn list_defaults() {
        let t = table();
        let sort = t.default_sort.as_ref().unwrap();
        assert_eq!(sort.column, "created_at");
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(t.pagination.default, PageSize::Count(20));
        assert_eq!(
            serde_json::to_value(&t.pagination.options).unwrap(),
            json!([10, 20, 30, 50, 100, "all"])
        );
        assert!(t.has_action(RowAction::Edit) && t.has_action(RowAction::Delete));
        assert!(t.has_bulk_action(BulkAction::DeleteMany));
    }

    #[test]
    fn create_and_edit_land_on_the_edit_page() {
        let r = resource();
        assert_eq!(Pages::redirect_url(SLUG, r.pages.after_create, "3"), "/admin/members/3/edit");
        assert_eq!(Pages::redirect_url(SLUG, r.pages.after_edit, "3"), "/admin/members/3/edit");
    }

    #[test]
    fn member_query_keeps_trashed_rows() {
        assert_eq!(resource().query_scope, QueryScope::WithTrashed);
    }
}
