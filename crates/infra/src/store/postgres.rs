//! Postgres-backed store implementation.
//!
//! All three store contracts are served from one connection pool. The invariants the
//! services rely on are enforced by the database itself, not by read-then-write logic:
//!
//! - `receptions_one_open_per_pvz` (partial unique index on `pvz_id WHERE status =
//!   'in_progress'`) rejects a second open reception.
//! - Product inserts and deletes are conditional statements that lock the owning
//!   reception row (`FOR SHARE`) and only touch rows whose reception is still open.
//! - Status changes are compare-and-set updates (`WHERE id = $1 AND status = $2`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | RowNotFound | N/A | `NotFound` |
//! | Anything else | Any other | `Internal` |
//!
//! The schema lives in [`crate::db::migrate`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use pvz_core::{PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::{Reception, ReceptionStatus};

use super::r#trait::{PickupPointFilter, PickupPointStore, ProductStore, ReceptionStore, StoreError};

/// Postgres-backed store for pickup points, receptions and products.
///
/// `Send + Sync` and cheap to clone; the SQLx pool handles connection sharing.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PickupPointStore for PostgresStore {
    #[instrument(skip(self, point), fields(pvz_id = %point.id, city = %point.city), err)]
    async fn create(&self, point: &PickupPoint) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pvzs (id, city, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(point.id.as_uuid())
        .bind(point.city.as_str())
        .bind(point.registered_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("pickup_points.create", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(pvz_id = %id), err)]
    async fn get_by_id(&self, id: PickupPointId) -> Result<PickupPoint, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, city, created_at
            FROM pvzs
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("pickup_points.get_by_id", e))?
        .ok_or(StoreError::NotFound)?;

        pickup_point_from_row(&row)
    }

    async fn list_all(&self) -> Result<Vec<PickupPoint>, StoreError> {
        self.list_filtered(&PickupPointFilter::default()).await
    }

    #[instrument(
        skip(self),
        fields(
            start = ?filter.range.start,
            end = ?filter.range.end,
            page = ?filter.page.page(),
            limit = ?filter.page.limit(),
            row_count = tracing::field::Empty
        ),
        err
    )]
    async fn list_filtered(
        &self,
        filter: &PickupPointFilter,
    ) -> Result<Vec<PickupPoint>, StoreError> {
        let (offset, limit) = match filter.page.window() {
            Some((offset, limit)) => (to_i64(offset)?, Some(to_i64(limit)?)),
            None => (0, None),
        };

        // LIMIT NULL is LIMIT ALL in PostgreSQL.
        let rows = sqlx::query(
            r#"
            SELECT id, city, created_at
            FROM pvzs
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.range.start)
        .bind(filter.range.end)
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("pickup_points.list", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(pickup_point_from_row).collect()
    }
}

#[async_trait]
impl ReceptionStore for PostgresStore {
    #[instrument(
        skip(self, reception),
        fields(reception_id = %reception.id, pvz_id = %reception.pickup_point_id),
        err
    )]
    async fn create(&self, reception: &Reception) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO receptions (id, pvz_id, status, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reception.id.as_uuid())
        .bind(reception.pickup_point_id.as_uuid())
        .bind(reception.status.as_str())
        .bind(reception.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("receptions.create", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    async fn get_most_recent(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Reception, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, pvz_id, status, created_at
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(pickup_point_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("receptions.get_most_recent", e))?
        .ok_or(StoreError::NotFound)?;

        reception_from_row(&row)
    }

    #[instrument(skip(self), fields(reception_id = %id, from = %from, to = %to), err)]
    async fn update_status(
        &self,
        id: ReceptionId,
        from: ReceptionStatus,
        to: ReceptionStatus,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE receptions
            SET status = $3
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("receptions.update_status", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    async fn list_by_pickup_point(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Vec<Reception>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, pvz_id, status, created_at
            FROM receptions
            WHERE pvz_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(pickup_point_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("receptions.list", e))?;

        rows.iter().map(reception_from_row).collect()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(
        skip(self, product),
        fields(product_id = %product.id, reception_id = %product.reception_id),
        err
    )]
    async fn create(&self, product: &Product) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            WITH open_reception AS (
                SELECT id
                FROM receptions
                WHERE id = $2 AND status = 'in_progress'
                FOR SHARE
            )
            INSERT INTO products (id, reception_id, product_type, created_at)
            SELECT $1, open_reception.id, $3, $4
            FROM open_reception
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.reception_id.as_uuid())
        .bind(product.product_type.as_str())
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.create", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing inserted: tell a missing reception apart from a closed one.
        let exists = sqlx::query("SELECT 1 FROM receptions WHERE id = $1")
            .bind(product.reception_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("products.create", e))?
            .is_some();

        if exists {
            Err(StoreError::Conflict(format!(
                "reception {} is closed",
                product.reception_id
            )))
        } else {
            Err(StoreError::NotFound)
        }
    }

    #[instrument(skip(self), fields(reception_id = %reception_id), err)]
    async fn get_most_recent(&self, reception_id: ReceptionId) -> Result<Product, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, reception_id, product_type, created_at
            FROM products
            WHERE reception_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(reception_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.get_most_recent", e))?
        .ok_or(StoreError::NotFound)?;

        product_from_row(&row)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            WITH open_reception AS (
                SELECT r.id
                FROM receptions r
                JOIN products p ON p.reception_id = r.id
                WHERE p.id = $1 AND r.status = 'in_progress'
                FOR SHARE OF r
            )
            DELETE FROM products
            WHERE id = $1
              AND reception_id IN (SELECT id FROM open_reception)
            "#,
        )
        .bind(id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.delete", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), fields(reception_id = %reception_id), err)]
    async fn list_by_reception(
        &self,
        reception_id: ReceptionId,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, reception_id, product_type, created_at
            FROM products
            WHERE reception_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(reception_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.list", e))?;

        rows.iter().map(product_from_row).collect()
    }
}

fn pickup_point_from_row(row: &sqlx::postgres::PgRow) -> Result<PickupPoint, StoreError> {
    let id: Uuid = row.try_get("id").map_err(decode_error)?;
    let city: String = row.try_get("city").map_err(decode_error)?;
    let registered_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_error)?;

    PickupPoint::register(PickupPointId::from_uuid(id), &city, registered_at)
        .map_err(|e| StoreError::Internal(format!("corrupt pvzs row {id}: {e}")))
}

fn reception_from_row(row: &sqlx::postgres::PgRow) -> Result<Reception, StoreError> {
    let id: Uuid = row.try_get("id").map_err(decode_error)?;
    let pvz_id: Uuid = row.try_get("pvz_id").map_err(decode_error)?;
    let status: String = row.try_get("status").map_err(decode_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_error)?;

    let status = status
        .parse::<ReceptionStatus>()
        .map_err(|e| StoreError::Internal(format!("corrupt receptions row {id}: {e}")))?;

    Ok(Reception {
        id: ReceptionId::from_uuid(id),
        pickup_point_id: PickupPointId::from_uuid(pvz_id),
        status,
        created_at,
    })
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let id: Uuid = row.try_get("id").map_err(decode_error)?;
    let reception_id: Uuid = row.try_get("reception_id").map_err(decode_error)?;
    let product_type: String = row.try_get("product_type").map_err(decode_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_error)?;

    Product::register(
        ProductId::from_uuid(id),
        ReceptionId::from_uuid(reception_id),
        &product_type,
        created_at,
    )
    .map_err(|e| StoreError::Internal(format!("corrupt products row {id}: {e}")))
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Internal(format!("failed to decode row: {err}"))
}

fn to_i64(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Internal(format!("pagination value {value} out of range")))
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation (primary key or the one-open-reception index)
                Some("23505") => StoreError::Conflict(msg),
                // Foreign key violation: the referenced pvz/reception is gone
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Internal(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Internal(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Internal(format!("sqlx error in {operation}: {err}")),
    }
}
