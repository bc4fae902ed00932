//! Application services: the four core operations on top of the store contracts.
//!
//! Every service is generic over its stores and a [`Clock`](pvz_core::Clock), so the
//! same code runs against the in-memory store in tests and PostgreSQL in production.
//! Lifecycle and ledger operations on one pickup point are serialized by a shared
//! [`PvzLocks`] registry; the stores' conditional writes back this up across processes.

pub mod aggregation;
pub mod directory;
pub mod locks;
pub mod product_ledger;
pub mod reception_lifecycle;

pub use aggregation::{AggregationQuery, PickupPointView, ReceptionView};
pub use directory::{PickupPointGate, PvzDirectory};
pub use locks::PvzLocks;
pub use product_ledger::ProductLedger;
pub use reception_lifecycle::ReceptionLifecycle;

use pvz_core::{DomainError, DomainResult, PickupPointId};
use pvz_receptions::Reception;

use crate::store::{ReceptionStore, StoreError};

/// Wrap an unexpected store failure as `Internal`, logging the cause.
pub(crate) fn store_failure(operation: &'static str, err: StoreError) -> DomainError {
    tracing::error!(operation, error = %err, "store call failed");
    DomainError::internal(format!("{operation}: {err}"))
}

/// Most recent reception of a pickup point, `None` when it never had one.
pub(crate) async fn latest_reception<R>(
    receptions: &R,
    pickup_point_id: PickupPointId,
) -> DomainResult<Option<Reception>>
where
    R: ReceptionStore + ?Sized,
{
    match receptions.get_most_recent(pickup_point_id).await {
        Ok(reception) => Ok(Some(reception)),
        Err(StoreError::NotFound) => Ok(None),
        Err(err) => Err(store_failure("receptions.get_most_recent", err)),
    }
}
