use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use pvz_core::{DateRange, PageRequest, PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::{Reception, ReceptionStatus};

/// Store operation error.
///
/// Services only ever interpret `NotFound` and `Conflict`; everything else is an
/// opaque `Internal` failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No matching row exists.
    #[error("record not found")]
    NotFound,

    /// A conditional write was rejected (uniqueness or state precondition).
    #[error("conflicting write: {0}")]
    Conflict(String),

    /// Any other storage failure.
    #[error("storage failure: {0}")]
    Internal(String),
}

/// Pickup point listing filter: inclusive registration-date range + pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickupPointFilter {
    pub range: DateRange,
    pub page: PageRequest,
}

/// Pickup point persistence.
///
/// Listings are ordered by `(registered_at, id)` ascending so pages are stable.
#[async_trait]
pub trait PickupPointStore: Send + Sync {
    async fn create(&self, point: &PickupPoint) -> Result<(), StoreError>;

    /// Fails with `NotFound` when no pickup point has this id.
    async fn get_by_id(&self, id: PickupPointId) -> Result<PickupPoint, StoreError>;

    async fn list_all(&self) -> Result<Vec<PickupPoint>, StoreError>;

    async fn list_filtered(&self, filter: &PickupPointFilter)
    -> Result<Vec<PickupPoint>, StoreError>;
}

/// Reception persistence.
///
/// Implementations must enforce "at most one `InProgress` reception per pickup point"
/// themselves: `create` fails with `Conflict` when the pickup point already has an
/// open reception, no matter what the caller read beforehand.
#[async_trait]
pub trait ReceptionStore: Send + Sync {
    async fn create(&self, reception: &Reception) -> Result<(), StoreError>;

    /// Latest reception by `created_at`, ties broken by id / insertion order.
    async fn get_most_recent(&self, pickup_point_id: PickupPointId)
    -> Result<Reception, StoreError>;

    /// Compare-and-set the status; returns the number of rows changed (0 or 1).
    async fn update_status(
        &self,
        id: ReceptionId,
        from: ReceptionStatus,
        to: ReceptionStatus,
    ) -> Result<u64, StoreError>;

    /// All receptions of a pickup point, oldest first.
    async fn list_by_pickup_point(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Vec<Reception>, StoreError>;
}

/// Product persistence.
///
/// `create` and `delete` only succeed while the owning reception is open: `create`
/// fails with `Conflict` (closed) or `NotFound` (missing reception), `delete` reports
/// zero rows.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: &Product) -> Result<(), StoreError>;

    /// Latest product by `created_at`, ties broken by id / insertion order.
    async fn get_most_recent(&self, reception_id: ReceptionId) -> Result<Product, StoreError>;

    async fn delete(&self, id: ProductId) -> Result<u64, StoreError>;

    /// All products of a reception, oldest first.
    async fn list_by_reception(&self, reception_id: ReceptionId)
    -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
impl<S> PickupPointStore for Arc<S>
where
    S: PickupPointStore + ?Sized,
{
    async fn create(&self, point: &PickupPoint) -> Result<(), StoreError> {
        (**self).create(point).await
    }

    async fn get_by_id(&self, id: PickupPointId) -> Result<PickupPoint, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<PickupPoint>, StoreError> {
        (**self).list_all().await
    }

    async fn list_filtered(
        &self,
        filter: &PickupPointFilter,
    ) -> Result<Vec<PickupPoint>, StoreError> {
        (**self).list_filtered(filter).await
    }
}

#[async_trait]
impl<S> ReceptionStore for Arc<S>
where
    S: ReceptionStore + ?Sized,
{
    async fn create(&self, reception: &Reception) -> Result<(), StoreError> {
        (**self).create(reception).await
    }

    async fn get_most_recent(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Reception, StoreError> {
        (**self).get_most_recent(pickup_point_id).await
    }

    async fn update_status(
        &self,
        id: ReceptionId,
        from: ReceptionStatus,
        to: ReceptionStatus,
    ) -> Result<u64, StoreError> {
        (**self).update_status(id, from, to).await
    }

    async fn list_by_pickup_point(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Vec<Reception>, StoreError> {
        (**self).list_by_pickup_point(pickup_point_id).await
    }
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn create(&self, product: &Product) -> Result<(), StoreError> {
        (**self).create(product).await
    }

    async fn get_most_recent(&self, reception_id: ReceptionId) -> Result<Product, StoreError> {
        (**self).get_most_recent(reception_id).await
    }

    async fn delete(&self, id: ProductId) -> Result<u64, StoreError> {
        (**self).delete(id).await
    }

    async fn list_by_reception(
        &self,
        reception_id: ReceptionId,
    ) -> Result<Vec<Product>, StoreError> {
        (**self).list_by_reception(reception_id).await
    }
}
