//! Test helpers: a throwaway Postgres container holding the catalog schema.
//!
//! Run from workspace root: `cargo test -p ferry-db --test postgres_catalog_test`.
//! Schema path: from ferry-db crate root, `schema.sql`.

#![allow(dead_code)]

use ferry_core::Category;
use ferry_db::PgFileCatalog;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::testcontainers::ContainerAsync;

const SCHEMA: &str = include_str!("../../schema.sql");

/// Catalog under test plus the container keeping its database alive.
pub struct TestDb {
    pub catalog: PgFileCatalog,
    pub pool: PgPool,
    pub _container: ContainerAsync<Postgres>,
}

/// Start Postgres and load the schema, or `None` when Docker is not reachable.
pub async fn setup_test_db() -> Option<TestDb> {
    let container = match Postgres::default().start().await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("Skipping Postgres catalog test, Docker unavailable: {e}");
            return None;
        }
    };

    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get Postgres port");
    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/postgres");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to load catalog schema");

    Some(TestDb {
        catalog: PgFileCatalog::new(pool.clone()),
        pool,
        _container: container,
    })
}

impl TestDb {
    pub async fn insert(&self, category: Category, doc: Value) {
        let id = doc["_id"].as_str().expect("document needs an _id").to_string();
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", category.collection());
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .expect("Failed to insert document");
    }

    pub async fn set_namespace(&self, value: Value) {
        sqlx::query("INSERT INTO rocketchat_settings (id, doc) VALUES ('uniqueID', $1)")
            .bind(Json(serde_json::json!({ "_id": "uniqueID", "value": value })))
            .execute(&self.pool)
            .await
            .expect("Failed to insert setting");
    }

    pub async fn document(&self, category: Category, id: &str) -> Value {
        let sql = format!("SELECT doc FROM {} WHERE id = $1", category.collection());
        let Json(doc) = sqlx::query_scalar::<sqlx::Postgres, Json<Value>>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to load document");
        doc
    }
}
