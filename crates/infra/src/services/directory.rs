use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use pvz_core::{Clock, DateRange, DomainError, DomainResult, PageRequest, PickupPointId};
use pvz_pickup_points::PickupPoint;

use super::store_failure;
use crate::store::{PickupPointFilter, PickupPointStore, StoreError};

/// Existence precondition used by the lifecycle and ledger services.
#[async_trait]
pub trait PickupPointGate: Send + Sync {
    /// `PvzNotFound` when absent, `Internal` when the lookup itself failed.
    async fn ensure_exists(&self, id: PickupPointId) -> DomainResult<()>;
}

#[async_trait]
impl<G> PickupPointGate for Arc<G>
where
    G: PickupPointGate + ?Sized,
{
    async fn ensure_exists(&self, id: PickupPointId) -> DomainResult<()> {
        (**self).ensure_exists(id).await
    }
}

/// Registry of pickup points.
#[derive(Debug, Clone)]
pub struct PvzDirectory<S, C> {
    store: S,
    clock: C,
}

impl<S, C> PvzDirectory<S, C>
where
    S: PickupPointStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Register a pickup point in `city`.
    ///
    /// The city is validated before the store is touched.
    #[instrument(skip(self), err)]
    pub async fn create(&self, city: &str) -> DomainResult<PickupPoint> {
        let point = PickupPoint::register(PickupPointId::new(), city, self.clock.now())?;

        self.store
            .create(&point)
            .await
            .map_err(|e| store_failure("pickup_points.create", e))?;

        tracing::info!(pvz_id = %point.id, city = %point.city, "pickup point registered");
        Ok(point)
    }

    #[instrument(skip(self, id), fields(pvz_id = %id), err)]
    pub async fn exists(&self, id: PickupPointId) -> DomainResult<()> {
        match self.store.get_by_id(id).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => Err(DomainError::PvzNotFound),
            Err(err) => Err(store_failure("pickup_points.get_by_id", err)),
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<PickupPoint>> {
        self.store
            .list_all()
            .await
            .map_err(|e| store_failure("pickup_points.list", e))
    }

    pub async fn list_filtered(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> DomainResult<Vec<PickupPoint>> {
        self.store
            .list_filtered(&PickupPointFilter { range, page })
            .await
            .map_err(|e| store_failure("pickup_points.list", e))
    }
}

#[async_trait]
impl<S, C> PickupPointGate for PvzDirectory<S, C>
where
    S: PickupPointStore,
    C: Clock,
{
    async fn ensure_exists(&self, id: PickupPointId) -> DomainResult<()> {
        self.exists(id).await
    }
}
