use tracing::instrument;

use pvz_core::{Clock, DomainError, DomainResult, PickupPointId, ProductId};
use pvz_products::{Product, ProductType};
use pvz_receptions::Reception;

use super::directory::PickupPointGate;
use super::locks::PvzLocks;
use super::{latest_reception, store_failure};
use crate::store::{ProductStore, ReceptionStore, StoreError};

/// Appends products to the open reception of a pickup point and takes them back in
/// LIFO order.
#[derive(Debug, Clone)]
pub struct ProductLedger<G, R, P, C> {
    gate: G,
    receptions: R,
    products: P,
    clock: C,
    locks: PvzLocks,
}

impl<G, R, P, C> ProductLedger<G, R, P, C>
where
    G: PickupPointGate,
    R: ReceptionStore,
    P: ProductStore,
    C: Clock,
{
    pub fn new(gate: G, receptions: R, products: P, clock: C, locks: PvzLocks) -> Self {
        Self {
            gate,
            receptions,
            products,
            clock,
            locks,
        }
    }

    /// Log a product of `product_type` in the open reception of `pickup_point_id`.
    ///
    /// The type is validated before any lookup.
    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    pub async fn add_product(
        &self,
        pickup_point_id: PickupPointId,
        product_type: &str,
    ) -> DomainResult<Product> {
        let product_type = product_type.parse::<ProductType>()?;

        let _guard = self.locks.acquire(pickup_point_id).await;
        let reception = self.open_reception(pickup_point_id).await?;

        let product = Product::new(ProductId::new(), reception.id, product_type, self.clock.now());
        match self.products.create(&product).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(DomainError::ReceptionAlreadyClosed),
            Err(StoreError::NotFound) => return Err(DomainError::ReceptionNotFound),
            Err(err) => return Err(store_failure("products.create", err)),
        }

        tracing::info!(
            product_id = %product.id,
            reception_id = %reception.id,
            product_type = %product.product_type,
            "product added"
        );
        Ok(product)
    }

    /// Remove the most recently added product of the open reception.
    ///
    /// Returns the removed product.
    #[instrument(skip(self), fields(pvz_id = %pickup_point_id), err)]
    pub async fn delete_last_product(
        &self,
        pickup_point_id: PickupPointId,
    ) -> DomainResult<Product> {
        let _guard = self.locks.acquire(pickup_point_id).await;
        let reception = self.open_reception(pickup_point_id).await?;

        let last = match self.products.get_most_recent(reception.id).await {
            Ok(product) => product,
            Err(StoreError::NotFound) => return Err(DomainError::ProductNotFound),
            Err(err) => return Err(store_failure("products.get_most_recent", err)),
        };

        let removed = match self.products.delete(last.id).await {
            Ok(rows) => rows,
            Err(StoreError::NotFound) => 0,
            Err(err) => return Err(store_failure("products.delete", err)),
        };
        if removed == 0 {
            return Err(DomainError::ProductNotFound);
        }

        tracing::info!(product_id = %last.id, reception_id = %reception.id, "product removed");
        Ok(last)
    }

    /// The pickup point must exist and its most recent reception must be open.
    async fn open_reception(&self, pickup_point_id: PickupPointId) -> DomainResult<Reception> {
        self.gate.ensure_exists(pickup_point_id).await?;
        let reception = latest_reception(&self.receptions, pickup_point_id)
            .await?
            .ok_or(DomainError::ReceptionNotFound)?;
        reception.ensure_accepting_products()?;
        Ok(reception)
    }
}
