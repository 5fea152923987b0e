//! Database-backed tests. Need a reachable PostgreSQL in `DATABASE_URL`:
//! `cargo test -- --ignored`.

use backoffice::admin::members;
use backoffice::migration;
use backoffice::model::{member, ProductSpec};
use backoffice::service::ListParams;
use backoffice::{CrudService, Migrator, Settings};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;

async fn migrated_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().unwrap();
    backoffice::ensure_database_exists(&settings.database_url).await.unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&settings.database_url)
        .await
        .unwrap();
    Migrator::new(&settings.schema).migrate(&pool, false).await.unwrap();
    pool
}

async fn columns(conn: &mut sqlx::PgConnection, table: &str) -> Vec<(String, String, String)> {
    sqlx::query_as(
        "SELECT column_name::text, data_type::text, is_nullable::text FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
    )
    .bind(table)
    .fetch_all(conn)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn order_id_up_then_down_restores_orders() {
    let pool = migrated_pool().await;
    let all = migration::all();
    let step = all
        .iter()
        .find(|m| m.name().contains("add_order_id_to_orders_table"))
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    step.revert(&mut tx).await.unwrap();
    let before = columns(&mut tx, "orders").await;
    assert!(!before.iter().any(|c| c.0 == "order_id"));

    step.apply(&mut tx).await.unwrap();
    let applied = columns(&mut tx, "orders").await;
    assert!(applied.iter().any(|c| c.0 == "order_id" && c.2 == "YES"));

    step.revert(&mut tx).await.unwrap();
    assert_eq!(columns(&mut tx, "orders").await, before);
    tx.rollback().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn member_list_is_newest_first_and_keeps_trashed_rows() {
    let pool = migrated_pool().await;
    let marker = format!("list-{}", std::process::id());
    for (i, age) in ["3 days", "1 day", "2 days"].iter().enumerate() {
        let sql = format!(
            "INSERT INTO public.members (name, email, phone, address, gender, created_at, deleted_at) \
             VALUES ($1, $2, '0900000000', 'x', 'male', NOW() - INTERVAL '{}', {})",
            age,
            if i == 0 { "NOW()" } else { "NULL" }
        );
        sqlx::query(&sql)
            .bind(format!("{} {}", marker, i))
            .bind(format!("{}-{}@example.com", marker, i))
            .execute(&pool)
            .await
            .unwrap();
    }

    let params: HashMap<String, String> = [("search".to_string(), marker.clone())].into_iter().collect();
    let list = ListParams::parse(&members::resource(), &member::entity(), &params).unwrap();
    let (rows, meta) = CrudService::page(&pool, &member::entity(), &list).await.unwrap();

    sqlx::query("DELETE FROM public.members WHERE name LIKE $1")
        .bind(format!("{}%", marker))
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(meta.total, 3);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|r| !r["deleted_at"].is_null()));
    let created: Vec<chrono::DateTime<chrono::Utc>> = rows
        .iter()
        .map(|r| r["created_at"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(created.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
#[ignore]
async fn product_spec_resolves_its_product() {
    let pool = migrated_pool().await;
    let (product_id,): (i64,) =
        sqlx::query_as("INSERT INTO public.products (name, price) VALUES ('spec owner', 100) RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let (spec_id,): (i64,) = sqlx::query_as(
        "INSERT INTO public.product_specs (product_id, name, price, special_price) VALUES ($1, 'M', 100, 80) RETURNING id",
    )
    .bind(product_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let spec = ProductSpec::find(&pool, spec_id).await.unwrap().unwrap();
    let product = spec.product(&pool).await.unwrap();

    sqlx::query("DELETE FROM public.products WHERE id = $1")
        .bind(product_id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(product.unwrap().id, product_id);
    assert!(spec.is_active);
    assert!(spec.special_price_consistent());
}

#[tokio::test]
#[ignore]
async fn dry_runs_leave_a_fresh_ledger_schema_absent() {
    let pool = migrated_pool().await;
    let schema = "backoffice_dry_run";
    sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", schema))
        .execute(&pool)
        .await
        .unwrap();

    let migrator = Migrator::new(schema);
    assert!(migrator.rollback(&pool, true).await.unwrap().is_empty());
    let planned = migrator.migrate(&pool, true).await.unwrap();
    assert_eq!(planned.len(), migration::all().len());

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_namespace WHERE nspname = $1)")
        .bind(schema)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!exists);
}
