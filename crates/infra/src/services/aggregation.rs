use tracing::instrument;

use pvz_core::{DateRange, DomainResult, PageRequest};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::Reception;

use super::store_failure;
use crate::store::{PickupPointFilter, PickupPointStore, ProductStore, ReceptionStore};

/// A pickup point with its full reception history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupPointView {
    pub pickup_point: PickupPoint,
    pub receptions: Vec<ReceptionView>,
}

/// A reception with every product logged in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceptionView {
    pub reception: Reception,
    pub products: Vec<Product>,
}

/// Read-only reporting view over pickup points, receptions and products.
///
/// Filtering and pagination select pickup points only; each selected point carries its
/// entire history.
#[derive(Debug, Clone)]
pub struct AggregationQuery<PS, RS, PrS> {
    points: PS,
    receptions: RS,
    products: PrS,
}

impl<PS, RS, PrS> AggregationQuery<PS, RS, PrS>
where
    PS: PickupPointStore,
    RS: ReceptionStore,
    PrS: ProductStore,
{
    pub fn new(points: PS, receptions: RS, products: PrS) -> Self {
        Self {
            points,
            receptions,
            products,
        }
    }

    #[instrument(skip(self), err)]
    pub async fn list(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> DomainResult<Vec<PickupPointView>> {
        let points = self
            .points
            .list_filtered(&PickupPointFilter { range, page })
            .await
            .map_err(|e| store_failure("pickup_points.list", e))?;

        let mut views = Vec::with_capacity(points.len());
        for pickup_point in points {
            let receptions = self
                .receptions
                .list_by_pickup_point(pickup_point.id)
                .await
                .map_err(|e| store_failure("receptions.list", e))?;

            let mut reception_views = Vec::with_capacity(receptions.len());
            for reception in receptions {
                let products = self
                    .products
                    .list_by_reception(reception.id)
                    .await
                    .map_err(|e| store_failure("products.list", e))?;
                reception_views.push(ReceptionView {
                    reception,
                    products,
                });
            }

            views.push(PickupPointView {
                pickup_point,
                receptions: reception_views,
            });
        }

        tracing::debug!(pickup_points = views.len(), "aggregation assembled");
        Ok(views)
    }
}
