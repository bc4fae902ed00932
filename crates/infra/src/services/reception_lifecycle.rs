use tracing::instrument;

use pvz_core::{Clock, DomainError, DomainResult, PickupPointId, ReceptionId};
use pvz_receptions::{Reception, ReceptionStatus};

use super::directory::PickupPointGate;
use super::locks::PvzLocks;
use super::{latest_reception, store_failure};
use crate::store::{ReceptionStore, StoreError};

/// Opens and closes receptions, keeping at most one open reception per pickup point.
#[derive(Debug, Clone)]
pub struct ReceptionLifecycle<G, R, C> {
    gate: G,
    receptions: R,
    clock: C,
    locks: PvzLocks,
}

impl<G, R, C> ReceptionLifecycle<G, R, C>
where
    G: PickupPointGate,
    R: ReceptionStore,
    C: Clock,
{
    pub fn new(gate: G, receptions: R, clock: C, locks: PvzLocks) -> Self {
        Self {
            gate,
            receptions,
            clock,
            locks,
        }
    }

    /// Open a new reception at `pickup_point_id`.
    ///
    /// Fails with `ReceptionAlreadyOpen` while the most recent reception is still open.
    /// A concurrent open that slips past the read is rejected by the store's conditional
    /// write and reported the same way.
    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    pub async fn open_reception(&self, pickup_point_id: PickupPointId) -> DomainResult<Reception> {
        let _guard = self.locks.acquire(pickup_point_id).await;

        self.gate.ensure_exists(pickup_point_id).await?;
        let latest = latest_reception(&self.receptions, pickup_point_id).await?;
        Reception::ensure_can_open_after(latest.as_ref())?;

        let reception = Reception::open(ReceptionId::new(), pickup_point_id, self.clock.now());
        match self.receptions.create(&reception).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(DomainError::ReceptionAlreadyOpen),
            Err(StoreError::NotFound) => return Err(DomainError::PvzNotFound),
            Err(err) => return Err(store_failure("receptions.create", err)),
        }

        tracing::info!(reception_id = %reception.id, "reception opened");
        Ok(reception)
    }

    /// Close the most recent reception of `pickup_point_id`.
    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    pub async fn close_last_reception(
        &self,
        pickup_point_id: PickupPointId,
    ) -> DomainResult<Reception> {
        let _guard = self.locks.acquire(pickup_point_id).await;

        self.gate.ensure_exists(pickup_point_id).await?;
        let latest = latest_reception(&self.receptions, pickup_point_id)
            .await?
            .ok_or(DomainError::ReceptionNotFound)?;
        let closed = latest.close()?;

        let changed = self
            .receptions
            .update_status(closed.id, ReceptionStatus::InProgress, ReceptionStatus::Closed)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => DomainError::ReceptionNotFound,
                other => store_failure("receptions.update_status", other),
            })?;
        if changed == 0 {
            // Vanished or changed between read and write.
            return Err(DomainError::ReceptionNotFound);
        }

        tracing::info!(reception_id = %closed.id, "reception closed");
        Ok(closed)
    }
}
