//! Builds parameterized SELECT, COUNT, INSERT, UPDATE and DELETE from an entity model.

use crate::model::{Attribute, EntityModel, SOFT_DELETE_COLUMN};
use crate::resource::{QueryScope, SortDirection};
use crate::schema::quoted;
use serde_json::{Map, Value};

/// Full qualified table name.
fn qualified_table(entity: &EntityModel) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Case-insensitive substring search over several columns.
#[derive(Clone, Debug)]
pub struct Search {
    pub columns: Vec<String>,
    pub term: String,
}

/// Everything that shapes a list query.
#[derive(Clone, Debug)]
pub struct ListQuery {
    pub scope: QueryScope,
    pub search: Option<Search>,
    /// Exact-match filters (column, storage value).
    pub filters: Vec<(String, Value)>,
    pub order: Vec<(String, SortDirection)>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ListQuery {
    /// Unfiltered, unpaginated list in primary key order.
    pub fn all(scope: QueryScope) -> Self {
        Self {
            scope,
            search: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: 0,
        }
    }
}

/// `$n::<type>` for a column; plain `$n` for unknown columns.
fn placeholder(entity: &EntityModel, column: &str, n: usize) -> String {
    entity
        .find_attribute(column)
        .map(|a| format!("${}::{}", n, a.sql_type.cast_name()))
        .unwrap_or_else(|| format!("${}", n))
}

/// SELECT list: numeric columns as col::text so sqlx returns String.
fn select_column_list(entity: &EntityModel) -> String {
    entity
        .attributes
        .iter()
        .map(|a| {
            let q = quoted(&a.name);
            if a.sql_type.is_numeric() {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn scope_predicate(entity: &EntityModel, scope: QueryScope) -> Option<String> {
    (entity.soft_deletes && scope == QueryScope::Default).then(|| format!("{} IS NULL", quoted(SOFT_DELETE_COLUMN)))
}

fn where_clause(entity: &EntityModel, list: &ListQuery, q: &mut QueryBuf) -> String {
    let mut parts: Vec<String> = scope_predicate(entity, list.scope).into_iter().collect();
    for (col, val) in &list.filters {
        if !entity.has_attribute(col) {
            continue;
        }
        let n = q.push_param(val.clone());
        parts.push(format!("{} = {}", quoted(col), placeholder(entity, col, n)));
    }
    if let Some(ref search) = list.search {
        let cols: Vec<&String> = search.columns.iter().filter(|c| entity.has_attribute(c)).collect();
        if !cols.is_empty() && !search.term.trim().is_empty() {
            let n = q.push_param(Value::String(escape_like(search.term.trim())));
            let ors: Vec<String> = cols
                .iter()
                .map(|c| format!("{}::text ILIKE ${}", quoted(c), n))
                .collect();
            parts.push(format!("({})", ors.join(" OR ")));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// ORDER BY requested columns, then the primary key as tie-breaker (same
/// direction as the last requested column, ascending when none).
fn order_clause(entity: &EntityModel, order: &[(String, SortDirection)]) -> String {
    let pk = &entity.primary_key;
    let mut parts: Vec<String> = order
        .iter()
        .filter(|(c, _)| entity.has_attribute(c) && c != pk)
        .map(|(c, d)| format!("{} {}", quoted(c), d.as_sql()))
        .collect();
    let pk_dir = order
        .iter()
        .rev()
        .find(|(c, _)| entity.has_attribute(c))
        .map(|(_, d)| *d)
        .unwrap_or(SortDirection::Asc);
    parts.push(format!("{} {}", quoted(pk), pk_dir.as_sql()));
    format!(" ORDER BY {}", parts.join(", "))
}

/// SELECT list with scope, filters, search, ordering and optional LIMIT/OFFSET.
pub fn select_list(entity: &EntityModel, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(entity, list, &mut q);
    let order_clause = order_clause(entity, &list.order);
    let limit_clause = list.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = if list.offset > 0 || list.limit.is_some() {
        format!(" OFFSET {}", list.offset)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        select_column_list(entity),
        qualified_table(entity),
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// COUNT(*) under the same scope, filters and search as `select_list`.
pub fn count(entity: &EntityModel, list: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_clause(entity, list, &mut q);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", qualified_table(entity), where_clause);
    q
}

/// SELECT by primary key. Caller adds id as sole param.
pub fn select_by_id(entity: &EntityModel, scope: QueryScope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &entity.primary_key;
    let scope_clause = scope_predicate(entity, scope)
        .map(|p| format!(" AND {}", p))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}{}",
        select_column_list(entity),
        qualified_table(entity),
        quoted(pk),
        placeholder(entity, pk, 1),
        scope_clause
    );
    q
}

/// A null for a NOT NULL column with a default means "leave it to the database".
fn defers_to_default(attr: &Attribute, v: &Value) -> bool {
    v.is_null() && attr.has_default && !attr.nullable
}

/// INSERT columns present in `body`. Absent columns with a DB default or that
/// are nullable are omitted so the database fills them, as are nulls for
/// defaulted NOT NULL columns.
pub fn insert(entity: &EntityModel, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for a in &entity.attributes {
        let val = body.get(&a.name).cloned();
        if a.name == entity.primary_key && val.is_none() {
            continue;
        }
        if val.is_none() && (a.has_default || a.nullable) {
            continue;
        }
        if val.as_ref().is_some_and(|v| defers_to_default(a, v)) {
            continue;
        }
        let n = q.push_param(val.unwrap_or(Value::Null));
        cols.push(quoted(&a.name));
        placeholders.push(placeholder(entity, &a.name, n));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", qualified_table(entity), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(entity),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

fn is_system_column(entity: &EntityModel, name: &str) -> bool {
    name == entity.primary_key
        || (entity.timestamps && (name == "created_at" || name == "updated_at"))
        || (entity.soft_deletes && name == SOFT_DELETE_COLUMN)
}

/// UPDATE by id: SET only known, non-system columns present in body. A null
/// for a defaulted NOT NULL column leaves the stored value alone.
pub fn update(entity: &EntityModel, scope: QueryScope, id: &Value, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &entity.primary_key;
    let mut sets = Vec::new();
    for (k, v) in body {
        if is_system_column(entity, k) {
            continue;
        }
        let Some(attr) = entity.find_attribute(k) else { continue };
        if defers_to_default(attr, v) {
            continue;
        }
        let n = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(k), placeholder(entity, k, n)));
    }
    if sets.is_empty() {
        q.params.clear();
        let mut sel = select_by_id(entity, scope);
        sel.params.push(id.clone());
        return sel;
    }
    if entity.timestamps {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_param = q.push_param(id.clone());
    let scope_clause = scope_predicate(entity, scope)
        .map(|p| format!(" AND {}", p))
        .unwrap_or_default();
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}{} RETURNING {}",
        qualified_table(entity),
        sets.join(", "),
        quoted(pk),
        placeholder(entity, pk, id_param),
        scope_clause,
        select_column_list(entity)
    );
    q
}

/// SET clause that flags a row as deleted, keeping an earlier deletion time.
fn soft_delete_set(entity: &EntityModel) -> String {
    let col = quoted(SOFT_DELETE_COLUMN);
    let mut set = format!("{} = COALESCE({}, NOW())", col, col);
    if entity.timestamps {
        set.push_str(&format!(", {} = NOW()", quoted("updated_at")));
    }
    set
}

/// DELETE (or soft delete) by id. Caller adds id as sole param.
pub fn delete(entity: &EntityModel, scope: QueryScope) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let pk = &entity.primary_key;
    let scope_clause = scope_predicate(entity, scope)
        .map(|p| format!(" AND {}", p))
        .unwrap_or_default();
    let returning = select_column_list(entity);
    q.sql = if entity.soft_deletes {
        format!(
            "UPDATE {} SET {} WHERE {} = {}{} RETURNING {}",
            table,
            soft_delete_set(entity),
            quoted(pk),
            placeholder(entity, pk, 1),
            scope_clause,
            returning
        )
    } else {
        format!(
            "DELETE FROM {} WHERE {} = {} RETURNING {}",
            table,
            quoted(pk),
            placeholder(entity, pk, 1),
            returning
        )
    };
    q
}

/// DELETE (or soft delete) every row whose primary key is in `ids`.
pub fn delete_many(entity: &EntityModel, scope: QueryScope, ids: &[Value]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(entity);
    let pk = &entity.primary_key;
    if ids.is_empty() {
        q.sql = format!("SELECT 1 FROM {} WHERE 1 = 0", table);
        return q;
    }
    let placeholders: Vec<String> = ids
        .iter()
        .map(|v| {
            let n = q.push_param(v.clone());
            placeholder(entity, pk, n)
        })
        .collect();
    let scope_clause = scope_predicate(entity, scope)
        .map(|p| format!(" AND {}", p))
        .unwrap_or_default();
    q.sql = if entity.soft_deletes {
        format!(
            "UPDATE {} SET {} WHERE {} IN ({}){}",
            table,
            soft_delete_set(entity),
            quoted(pk),
            placeholders.join(", "),
            scope_clause
        )
    } else {
        format!(
            "DELETE FROM {} WHERE {} IN ({})",
            table,
            quoted(pk),
            placeholders.join(", ")
        )
    };
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{faq_category, member, product, product_spec};
    use serde_json::json;

    fn member_page() -> ListQuery {
        ListQuery {
            scope: QueryScope::WithTrashed,
            search: None,
            filters: vec![],
            order: vec![("created_at".into(), SortDirection::Desc)],
            limit: Some(20),
            offset: 0,
        }
    }

    #[test]
    fn member_list_has_no_soft_delete_predicate() {
        let q = select_list(&member::entity(), &member_page());
        assert!(!q.sql.contains("deleted_at\" IS NULL"), "{}", q.sql);
        assert!(q.sql.ends_with(" ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT 20 OFFSET 0"), "{}", q.sql);
    }

    #[test]
    fn default_scope_hides_soft_deleted_rows() {
        let q = select_list(&product::entity(), &ListQuery::all(QueryScope::Default));
        assert!(q.sql.contains(" WHERE \"deleted_at\" IS NULL ORDER BY \"id\" ASC"), "{}", q.sql);
        assert!(!q.sql.contains("LIMIT"));
        let q = select_list(&faq_category::entity(), &ListQuery::all(QueryScope::Default));
        assert!(!q.sql.contains("WHERE"), "{}", q.sql);
    }

    #[test]
    fn filters_and_search_are_parameterized() {
        let mut list = member_page();
        list.filters = vec![("gender".into(), json!("male")), ("is_active".into(), json!(true))];
        list.search = Some(Search {
            columns: vec!["name".into(), "email".into()],
            term: "50%_off".into(),
        });
        let q = select_list(&member::entity(), &list);
        assert!(q.sql.contains("\"gender\" = $1::varchar AND \"is_active\" = $2::boolean"), "{}", q.sql);
        assert!(q.sql.contains("(\"name\"::text ILIKE $3 OR \"email\"::text ILIKE $3)"), "{}", q.sql);
        assert_eq!(q.params[2], json!("%50\\%\\_off%"));

        let c = count(&member::entity(), &list);
        assert!(c.sql.starts_with("SELECT COUNT(*) FROM \"public\".\"members\" WHERE"));
        assert_eq!(c.params.len(), 3);
    }

    #[test]
    fn numeric_columns_are_selected_as_text() {
        let q = select_by_id(&product_spec::entity(), QueryScope::Default);
        assert!(q.sql.contains("\"special_price\"::text AS \"special_price\""));
        assert!(q.sql.contains("WHERE \"id\" = $1::bigint"));
    }

    #[test]
    fn insert_skips_defaults_and_casts_placeholders() {
        let body = json!({ "name": "A", "email": "a@b.com", "phone": "1", "address": "x", "gender": "male" });
        let q = insert(&member::entity(), body.as_object().unwrap());
        assert!(q.sql.starts_with(
            "INSERT INTO \"public\".\"members\" (\"name\", \"email\", \"phone\", \"address\", \"gender\") VALUES ($1::varchar"
        ), "{}", q.sql);
        assert!(!q.sql.contains("(\"id\""));
        assert_eq!(q.params.len(), 5);
    }

    #[test]
    fn blank_optional_integer_falls_back_to_its_default() {
        let form = crate::admin::faq_categories::resource().form;
        let body = json!({ "name": "Shipping", "sort": "", "is_active": true });
        let values = crate::service::FormValidator::validate(&form, body.as_object().unwrap()).unwrap();
        let attrs = faq_category::entity().fill(&values).unwrap();

        let q = insert(&faq_category::entity(), &attrs);
        assert!(
            q.sql.starts_with("INSERT INTO \"public\".\"faq_categories\" (\"name\", \"is_active\") VALUES"),
            "{}",
            q.sql
        );
        assert!(q.params.iter().all(|p| !p.is_null()), "{:?}", q.params);

        let q = update(&faq_category::entity(), QueryScope::Default, &json!(3), &attrs);
        assert!(!q.sql.contains("\"sort\" ="), "{}", q.sql);
        assert!(q.params.iter().all(|p| !p.is_null()), "{:?}", q.params);
    }

    #[test]
    fn nullable_columns_still_accept_null() {
        let body = json!({ "product_id": 1, "name": "M", "special_price": null });
        let q = insert(&product_spec::entity(), body.as_object().unwrap());
        assert!(q.sql.contains("\"special_price\""), "{}", q.sql);
        assert_eq!(q.params[2], Value::Null);
    }

    #[test]
    fn update_ignores_system_columns() {
        let body = json!({ "name": "B", "created_at": "2020-01-01T00:00:00Z", "id": 3 });
        let q = update(&member::entity(), QueryScope::WithTrashed, &json!(5), body.as_object().unwrap());
        assert!(q.sql.starts_with(
            "UPDATE \"public\".\"members\" SET \"name\" = $1::varchar, \"updated_at\" = NOW() WHERE \"id\" = $2::bigint RETURNING"
        ), "{}", q.sql);
        assert_eq!(q.params, vec![json!("B"), json!(5)]);
    }

    #[test]
    fn delete_is_soft_for_soft_deleting_entities() {
        let q = delete(&member::entity(), QueryScope::WithTrashed);
        assert!(q.sql.starts_with("UPDATE \"public\".\"members\" SET \"deleted_at\" = COALESCE(\"deleted_at\", NOW())"));
        let q = delete(&faq_category::entity(), QueryScope::Default);
        assert!(q.sql.starts_with("DELETE FROM \"public\".\"faq_categories\" WHERE \"id\" = $1::bigint"));
    }

    #[test]
    fn delete_many_binds_each_id() {
        let q = delete_many(&faq_category::entity(), QueryScope::Default, &[json!(1), json!(2)]);
        assert_eq!(
            q.sql,
            "DELETE FROM \"public\".\"faq_categories\" WHERE \"id\" IN ($1::bigint, $2::bigint)"
        );
        let q = delete_many(&member::entity(), QueryScope::Default, &[json!(1)]);
        assert!(q.sql.ends_with("WHERE \"id\" IN ($1::bigint) AND \"deleted_at\" IS NULL"), "{}", q.sql);
    }
}
