//! Connection pool and schema setup for the PostgreSQL stores.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;

/// Schema statements, applied in order. Each one is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS pvzs (
        id          UUID PRIMARY KEY,
        city        TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS pvzs_created_at_idx ON pvzs (created_at, id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS receptions (
        id          UUID PRIMARY KEY,
        pvz_id      UUID NOT NULL REFERENCES pvzs (id),
        status      TEXT NOT NULL CHECK (status IN ('in_progress', 'close')),
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS receptions_pvz_recent_idx
        ON receptions (pvz_id, created_at DESC, id DESC)
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS receptions_one_open_per_pvz
        ON receptions (pvz_id) WHERE status = 'in_progress'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id            UUID PRIMARY KEY,
        reception_id  UUID NOT NULL REFERENCES receptions (id),
        product_type  TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS products_reception_recent_idx
        ON products (reception_id, created_at DESC, id DESC)
    "#,
];

pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(config.max_lifetime)
        .connect(&config.url)
        .await
}

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    tracing::info!("database schema ready");
    Ok(())
}
