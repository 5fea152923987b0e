//! Query-string parameters of a resource list page.

use crate::error::AppError;
use crate::model::EntityModel;
use crate::resource::{PageSize, ResourceDescriptor, SortDirection};
use crate::sql::{ListQuery, Search};
use serde::Serialize;
use std::collections::HashMap;

/// Parsed list request: which page, how many rows, in what order, narrowed how.
#[derive(Clone, Debug)]
pub struct ListParams {
    pub query: ListQuery,
    pub page: u32,
    pub per_page: PageSize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: PageSize,
    pub last_page: u32,
}

impl PageMeta {
    pub fn new(total: u64, page: u32, per_page: PageSize) -> Self {
        let last_page = match per_page.limit() {
            Some(n) if n > 0 => total.div_ceil(u64::from(n)).max(1),
            _ => 1,
        };
        Self {
            total,
            page,
            per_page,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
        }
    }
}

impl ListParams {
    /// Recognized keys: `search`, `sort`, `direction`, `page`, `per_page`, and
    /// the name of each table filter. Anything else is ignored.
    pub fn parse(
        resource: &ResourceDescriptor,
        entity: &EntityModel,
        params: &HashMap<String, String>,
    ) -> Result<Self, AppError> {
        let table = &resource.table;

        let search = params
            .get("search")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|term| Search {
                columns: table.searchable_columns(),
                term: term.to_string(),
            });

        let mut filters = Vec::new();
        for filter in &table.filters {
            let Some(raw) = params.get(&filter.name) else { continue };
            if let Some(v) = filter.parse(raw).map_err(AppError::BadRequest)? {
                filters.push((filter.name.clone(), entity.storage_value(&filter.name, &v)));
            }
        }

        let requested = params
            .get("sort")
            .filter(|c| table.is_sortable(c))
            .map(|c| {
                let dir = params
                    .get("direction")
                    .and_then(|d| SortDirection::parse(d))
                    .unwrap_or(SortDirection::Asc);
                (c.clone(), dir)
            });
        let order: Vec<(String, SortDirection)> = requested
            .or_else(|| {
                table
                    .default_sort
                    .as_ref()
                    .map(|s| (s.column.clone(), s.direction))
            })
            .into_iter()
            .collect();

        let per_page = table.pagination.resolve(params.get("per_page").map(String::as_str));
        let page = match per_page {
            PageSize::All => 1,
            PageSize::Count(_) => params
                .get("page")
                .and_then(|p| p.parse::<u32>().ok())
                .filter(|p| *p > 0)
                .unwrap_or(1),
        };
        let limit = per_page.limit();
        let offset = limit.map(|n| n.saturating_mul(page - 1)).unwrap_or(0);

        Ok(Self {
            query: ListQuery {
                scope: resource.query_scope,
                search,
                filters,
                order,
                limit,
                offset,
            },
            page,
            per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::members;
    use crate::model::member;
    use crate::resource::QueryScope;
    use serde_json::json;

    fn parse(pairs: &[(&str, &str)]) -> Result<ListParams, AppError> {
        let params = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ListParams::parse(&members::resource(), &member::entity(), &params)
    }

    #[test]
    fn defaults_follow_the_table_schema() {
        let p = parse(&[]).unwrap();
        assert_eq!(p.query.order, vec![("created_at".to_string(), SortDirection::Desc)]);
        assert_eq!(p.query.limit, Some(20));
        assert_eq!(p.query.offset, 0);
        assert_eq!(p.query.scope, QueryScope::WithTrashed);
        assert!(p.query.search.is_none());
    }

    #[test]
    fn only_sortable_columns_can_be_sorted() {
        let p = parse(&[("sort", "updated_at"), ("direction", "asc")]).unwrap();
        assert_eq!(p.query.order, vec![("updated_at".to_string(), SortDirection::Asc)]);
        let p = parse(&[("sort", "email"), ("direction", "asc")]).unwrap();
        assert_eq!(p.query.order[0].0, "created_at");
    }

    #[test]
    fn paging_and_filters() {
        let p = parse(&[("page", "3"), ("per_page", "50"), ("gender", "female"), ("is_active", "")]).unwrap();
        assert_eq!(p.query.limit, Some(50));
        assert_eq!(p.query.offset, 100);
        assert_eq!(p.query.filters, vec![("gender".to_string(), json!("female"))]);

        let p = parse(&[("per_page", "all"), ("page", "4"), ("is_active", "1")]).unwrap();
        assert_eq!(p.query.limit, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.query.filters, vec![("is_active".to_string(), json!(true))]);

        assert!(matches!(parse(&[("gender", "x")]), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn page_meta_rounds_up() {
        assert_eq!(PageMeta::new(41, 1, PageSize::Count(20)).last_page, 3);
        assert_eq!(PageMeta::new(0, 1, PageSize::Count(20)).last_page, 1);
        assert_eq!(PageMeta::new(500, 1, PageSize::All).last_page, 1);
    }
}
