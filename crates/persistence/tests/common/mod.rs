//! Common test utilities for repository integration tests.
//!
//! Tests run against a real PostgreSQL database named by `TEST_DATABASE_URL`
//! and are skipped when it is unset. Each test gets its own schema holding a
//! cut-down copy of the web application's tables.

#![allow(dead_code)]

use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use std::time::Duration;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE pbx_default_settings (
    id uuid PRIMARY KEY,
    category varchar(64) NOT NULL,
    subcategory varchar(64) NOT NULL,
    value_type varchar(32) NOT NULL,
    value text,
    sequence integer NOT NULL DEFAULT 10,
    enabled varchar(8) NOT NULL DEFAULT 'true'
);
CREATE TABLE pbx_domain_settings (
    id uuid PRIMARY KEY,
    domain_id_id uuid NOT NULL,
    category varchar(64) NOT NULL,
    subcategory varchar(64) NOT NULL,
    value_type varchar(32) NOT NULL,
    value text,
    sequence integer NOT NULL DEFAULT 10,
    enabled varchar(8) NOT NULL DEFAULT 'true'
);
CREATE TABLE pbx_user_settings (
    id uuid PRIMARY KEY,
    user_id_id uuid NOT NULL,
    category varchar(64) NOT NULL,
    subcategory varchar(64) NOT NULL,
    value_type varchar(32) NOT NULL,
    value text,
    sequence integer NOT NULL DEFAULT 10,
    enabled varchar(8) NOT NULL DEFAULT 'true'
);
CREATE TABLE pbx_email_templates (
    id uuid PRIMARY KEY,
    domain_id_id uuid,
    language varchar(8) NOT NULL,
    category varchar(32) NOT NULL,
    subcategory varchar(32) NOT NULL,
    subject varchar(256),
    body text,
    "type" varchar(8),
    enabled varchar(8) NOT NULL DEFAULT 'true'
);
CREATE TABLE pbx_call_flows (
    id uuid PRIMARY KEY,
    extension varchar(32) NOT NULL,
    feature_code varchar(32) NOT NULL,
    status varchar(8) NOT NULL,
    context varchar(128) NOT NULL,
    enabled varchar(8) NOT NULL DEFAULT 'true'
);
"#;

/// Connects to the test database, or returns `None` when none is configured.
///
/// The pool holds a single connection whose search path points at a fresh
/// schema, so tests never see each other's rows.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    let schema = format!("bus_test_{}", Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    admin
        .execute(format!("CREATE SCHEMA {}", schema).as_str())
        .await
        .expect("Failed to create test schema");
    admin.close().await;

    let search_path = format!("SET search_path TO {}", schema);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                conn.execute(search_path.as_str()).await?;
                Ok(())
            })
        })
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    pool.execute(SCHEMA_SQL)
        .await
        .expect("Failed to create test tables");

    Some(pool)
}

pub async fn insert_default_setting(
    pool: &PgPool,
    category: &str,
    subcategory: &str,
    value_type: &str,
    value: &str,
    sequence: i32,
) {
    sqlx::query(
        "INSERT INTO pbx_default_settings (id, category, subcategory, value_type, value, sequence) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(category)
    .bind(subcategory)
    .bind(value_type)
    .bind(value)
    .bind(sequence)
    .execute(pool)
    .await
    .expect("Failed to insert default setting");
}

pub async fn insert_domain_setting(
    pool: &PgPool,
    domain_id: Uuid,
    category: &str,
    subcategory: &str,
    value: &str,
    enabled: bool,
) {
    sqlx::query(
        "INSERT INTO pbx_domain_settings (id, domain_id_id, category, subcategory, value_type, value, enabled) \
         VALUES ($1, $2, $3, $4, 'text', $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(domain_id)
    .bind(category)
    .bind(subcategory)
    .bind(value)
    .bind(if enabled { "true" } else { "false" })
    .execute(pool)
    .await
    .expect("Failed to insert domain setting");
}

pub async fn insert_user_setting(
    pool: &PgPool,
    user_id: Uuid,
    category: &str,
    subcategory: &str,
    value: &str,
) {
    sqlx::query(
        "INSERT INTO pbx_user_settings (id, user_id_id, category, subcategory, value_type, value) \
         VALUES ($1, $2, $3, $4, 'text', $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(category)
    .bind(subcategory)
    .bind(value)
    .execute(pool)
    .await
    .expect("Failed to insert user setting");
}

pub async fn insert_template(
    pool: &PgPool,
    domain_id: Option<Uuid>,
    language: &str,
    subject: &str,
    body: &str,
) {
    sqlx::query(
        "INSERT INTO pbx_email_templates (id, domain_id_id, language, category, subcategory, subject, body, \"type\") \
         VALUES ($1, $2, $3, 'missed', 'default', $4, $5, 'text')",
    )
    .bind(Uuid::new_v4())
    .bind(domain_id)
    .bind(language)
    .bind(subject)
    .bind(body)
    .execute(pool)
    .await
    .expect("Failed to insert email template");
}

pub async fn insert_call_flow(
    pool: &PgPool,
    feature_code: &str,
    status: bool,
    context: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO pbx_call_flows (id, extension, feature_code, status, context) \
         VALUES ($1, '30', $2, $3, $4)",
    )
    .bind(id)
    .bind(feature_code)
    .bind(if status { "true" } else { "false" })
    .bind(context)
    .execute(pool)
    .await
    .expect("Failed to insert call flow");
    id
}
