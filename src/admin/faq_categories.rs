use crate::model::faq_category;
use crate::resource::{
    BulkAction, FormField, FormSchema, Navigation, PageSize, Pages, QueryScope, Redirect, ResourceDescriptor,
    RowAction, SortDirection, TableColumn, TableFilter, TableSchema,
};

pub const SLUG: &str = "faq-categories";

pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor {
        slug: SLUG.into(),
        entity: faq_category::TABLE.into(),
        navigation: Navigation {
            icon: "heroicon-o-question-mark-circle".into(),
            group: "網站管理".into(),
            label: "常見問題分類".into(),
            model_label: "常見問題分類".into(),
            plural_model_label: "常見問題分類".into(),
        },
        form: FormSchema::new(vec![
            FormField::text("name", "名稱").required().max_length(255),
            FormField::text("sort", "排序").numeric(),
            FormField::toggle("is_active", "啟用狀態").inline(false),
        ]),
        table: TableSchema::new(vec![
            TableColumn::text("name", "名稱").searchable(),
            TableColumn::text("sort", "排序").sortable(),
            TableColumn::toggle("is_active", "啟用狀態"),
            TableColumn::text("created_at", "創建時間")
                .date_time()
                .sortable()
                .toggleable(true),
        ])
        .filters(vec![TableFilter::ternary("is_active", "啟用狀態")])
        .actions(vec![RowAction::Edit, RowAction::Delete])
        .bulk_actions(vec![BulkAction::DeleteMany])
        .default_sort("sort", SortDirection::Asc)
        .paginated(
            vec![PageSize::Count(10), PageSize::Count(25), PageSize::Count(50)],
            PageSize::Count(10),
        ),
        query_scope: QueryScope::Default,
        pages: Pages::default().after_create(Redirect::Index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_to_the_list() {
        let r = resource();
        assert_eq!(Pages::redirect_url(SLUG, r.pages.after_create, "3"), "/admin/faq-categories");
        assert_eq!(Pages::redirect_url(SLUG, r.pages.after_edit, "3"), "/admin/faq-categories/3/edit");
    }
}
