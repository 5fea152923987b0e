//! Generic CRUD execution against PostgreSQL.

use crate::error::AppError;
use crate::model::EntityModel;
use crate::resource::QueryScope;
use crate::service::listing::{ListParams, PageMeta};
use crate::sql::{self, ListQuery, PgBindValue, QueryBuf};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgConnection, PgPool, Postgres};

/// Upper bound on ids accepted by one bulk delete.
const BULK_LIMIT: usize = 1000;

pub struct CrudService;

impl CrudService {
    /// Rows matching `list`, read casts applied.
    pub async fn list(pool: &PgPool, entity: &EntityModel, list: &ListQuery) -> Result<Vec<Value>, AppError> {
        let q = sql::select_list(entity, list);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind(&q).fetch_all(pool).await?;
        Ok(rows.iter().map(|r| entity.cast_row(row_to_json(r))).collect())
    }

    /// Number of rows matching `list`, ignoring its order and limit.
    pub async fn count(pool: &PgPool, entity: &EntityModel, list: &ListQuery) -> Result<u64, AppError> {
        let q = sql::count(entity, list);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let n = query.fetch_one(pool).await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// One page of rows plus the meta needed to page through the rest.
    pub async fn page(
        pool: &PgPool,
        entity: &EntityModel,
        params: &ListParams,
    ) -> Result<(Vec<Value>, PageMeta), AppError> {
        let rows = Self::list(pool, entity, &params.query).await?;
        let total = Self::count(pool, entity, &params.query).await?;
        Ok((rows, PageMeta::new(total, params.page, params.per_page)))
    }

    /// Fetch one row by primary key. Returns JSON object or None.
    pub async fn read(
        pool: &PgPool,
        entity: &EntityModel,
        scope: QueryScope,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let mut q = sql::select_by_id(entity, scope);
        q.params.push(id.clone());
        Self::fetch_optional(pool, entity, &q).await
    }

    /// Insert one row from already-filled attributes. Returns created row.
    pub async fn create(pool: &PgPool, entity: &EntityModel, body: &Map<String, Value>) -> Result<Value, AppError> {
        let q = sql::insert(entity, body);
        Self::fetch_optional(pool, entity, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id. None when no visible row has that id.
    pub async fn update(
        pool: &PgPool,
        entity: &EntityModel,
        scope: QueryScope,
        id: &Value,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update(entity, scope, id, body);
        Self::fetch_optional(pool, entity, &q).await
    }

    /// Delete one row by id; soft-deleting entities only get flagged.
    pub async fn delete(
        pool: &PgPool,
        entity: &EntityModel,
        scope: QueryScope,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let mut q = sql::delete(entity, scope);
        q.params.push(id.clone());
        let row = Self::fetch_optional(pool, entity, &q).await?;
        if row.is_some() {
            tracing::info!(table = %entity.table_name, id = %id, soft = entity.soft_deletes, "row deleted");
        }
        Ok(row)
    }

    /// Bulk delete in a transaction. Returns the number of rows affected.
    pub async fn delete_many(
        pool: &PgPool,
        entity: &EntityModel,
        scope: QueryScope,
        ids: &[Value],
    ) -> Result<u64, AppError> {
        if ids.len() > BULK_LIMIT {
            return Err(AppError::BadRequest(format!("bulk delete limited to {} items", BULK_LIMIT)));
        }
        if ids.is_empty() {
            return Ok(0);
        }
        let mut tx = pool.begin().await?;
        let affected = Self::execute_tx(&mut tx, &sql::delete_many(entity, scope, ids)).await?;
        tx.commit().await?;
        tracing::info!(table = %entity.table_name, affected, soft = entity.soft_deletes, "rows deleted");
        Ok(affected)
    }

    async fn fetch_optional(pool: &PgPool, entity: &EntityModel, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind(q).fetch_optional(pool).await?;
        Ok(row.map(|r| entity.cast_row(row_to_json(&r))))
    }

    async fn execute_tx(tx: &mut PgConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
        let done = bind(q).execute(&mut *tx).await?;
        Ok(done.rows_affected())
    }
}

fn bind(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}
