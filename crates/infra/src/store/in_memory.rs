use std::collections::HashSet;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use pvz_core::{Entity, PickupPointId, ProductId, ReceptionId};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::{Reception, ReceptionStatus};

use super::r#trait::{
    PickupPointFilter, PickupPointStore, ProductStore, ReceptionStore, StoreError,
};

#[derive(Debug, Default)]
struct State {
    // Insertion order doubles as the tie-break for equal timestamps.
    points: Vec<PickupPoint>,
    receptions: Vec<Reception>,
    products: Vec<Product>,
}

/// In-memory store implementing all three persistence contracts.
///
/// Intended for tests/dev. Conditional writes are checked under the same write
/// lock that applies them, so the store upholds the same invariants as the
/// PostgreSQL adapter.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    failing: Mutex<HashSet<&'static str>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` (e.g. `"receptions.create"`) fail with
    /// `StoreError::Internal` until `clear_failures` is called.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(operation);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        if failing.contains(operation) {
            return Err(StoreError::Internal(format!("injected failure in {operation}")));
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }
}

fn position<E: Entity>(items: &[E], id: &E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

fn has_open_reception(
    state: &State,
    pickup_point_id: PickupPointId,
    except: Option<ReceptionId>,
) -> bool {
    state.receptions.iter().any(|r| {
        r.pickup_point_id == pickup_point_id && r.is_open() && Some(r.id) != except
    })
}

#[async_trait]
impl PickupPointStore for InMemoryStore {
    async fn create(&self, point: &PickupPoint) -> Result<(), StoreError> {
        self.check("pickup_points.create")?;
        let mut state = self.write()?;
        if position(&state.points, &point.id).is_some() {
            return Err(StoreError::Conflict(format!("pickup point {} already exists", point.id)));
        }
        state.points.push(point.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: PickupPointId) -> Result<PickupPoint, StoreError> {
        self.check("pickup_points.get_by_id")?;
        let state = self.read()?;
        position(&state.points, &id)
            .map(|idx| state.points[idx].clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<PickupPoint>, StoreError> {
        self.list_filtered(&PickupPointFilter::default()).await
    }

    async fn list_filtered(
        &self,
        filter: &PickupPointFilter,
    ) -> Result<Vec<PickupPoint>, StoreError> {
        self.check("pickup_points.list")?;
        let state = self.read()?;

        let mut matching: Vec<(usize, &PickupPoint)> = state
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| filter.range.contains(p.registered_at))
            .collect();
        matching.sort_by_key(|(idx, p)| (p.registered_at, *idx));

        let iter = matching.into_iter().map(|(_, p)| p.clone());
        let points = match filter.page.window() {
            Some((offset, limit)) => iter
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => iter.collect(),
        };
        Ok(points)
    }
}

#[async_trait]
impl ReceptionStore for InMemoryStore {
    async fn create(&self, reception: &Reception) -> Result<(), StoreError> {
        self.check("receptions.create")?;
        let mut state = self.write()?;

        if position(&state.points, &reception.pickup_point_id).is_none() {
            return Err(StoreError::NotFound);
        }
        if reception.is_open() && has_open_reception(&state, reception.pickup_point_id, None) {
            return Err(StoreError::Conflict(format!(
                "pickup point {} already has an open reception",
                reception.pickup_point_id
            )));
        }

        state.receptions.push(reception.clone());
        Ok(())
    }

    async fn get_most_recent(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Reception, StoreError> {
        self.check("receptions.get_most_recent")?;
        let state = self.read()?;
        state
            .receptions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pickup_point_id == pickup_point_id)
            .max_by_key(|(idx, r)| (r.created_at, *idx))
            .map(|(_, r)| r.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update_status(
        &self,
        id: ReceptionId,
        from: ReceptionStatus,
        to: ReceptionStatus,
    ) -> Result<u64, StoreError> {
        self.check("receptions.update_status")?;
        let mut state = self.write()?;

        let Some(idx) = state
            .receptions
            .iter()
            .position(|r| r.id == id && r.status == from)
        else {
            return Ok(0);
        };

        let pickup_point_id = state.receptions[idx].pickup_point_id;
        if to == ReceptionStatus::InProgress
            && has_open_reception(&state, pickup_point_id, Some(id))
        {
            return Err(StoreError::Conflict(format!(
                "pickup point {pickup_point_id} already has an open reception"
            )));
        }

        state.receptions[idx].status = to;
        Ok(1)
    }

    async fn list_by_pickup_point(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Vec<Reception>, StoreError> {
        self.check("receptions.list")?;
        let state = self.read()?;
        let mut receptions: Vec<(usize, &Reception)> = state
            .receptions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pickup_point_id == pickup_point_id)
            .collect();
        receptions.sort_by_key(|(idx, r)| (r.created_at, *idx));
        Ok(receptions.into_iter().map(|(_, r)| r.clone()).collect())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create(&self, product: &Product) -> Result<(), StoreError> {
        self.check("products.create")?;
        let mut state = self.write()?;

        let idx = position(&state.receptions, &product.reception_id).ok_or(StoreError::NotFound)?;
        if !state.receptions[idx].is_open() {
            return Err(StoreError::Conflict(format!(
                "reception {} is closed",
                product.reception_id
            )));
        }

        state.products.push(product.clone());
        Ok(())
    }

    async fn get_most_recent(&self, reception_id: ReceptionId) -> Result<Product, StoreError> {
        self.check("products.get_most_recent")?;
        let state = self.read()?;
        state
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .max_by_key(|(idx, p)| (p.created_at, *idx))
            .map(|(_, p)| p.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<u64, StoreError> {
        self.check("products.delete")?;
        let mut state = self.write()?;

        let Some(idx) = position(&state.products, &id) else {
            return Ok(0);
        };
        let reception_id = state.products[idx].reception_id;
        let open = state
            .receptions
            .iter()
            .any(|r| r.id == reception_id && r.is_open());
        if !open {
            return Ok(0);
        }

        state.products.remove(idx);
        Ok(1)
    }

    async fn list_by_reception(
        &self,
        reception_id: ReceptionId,
    ) -> Result<Vec<Product>, StoreError> {
        self.check("products.list")?;
        let state = self.read()?;
        let mut products: Vec<(usize, &Product)> = state
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .collect();
        products.sort_by_key(|(idx, p)| (p.created_at, *idx));
        Ok(products.into_iter().map(|(_, p)| p.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pvz_core::PageRequest;
    use pvz_pickup_points::City;
    use pvz_products::ProductType;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, hour, 0, 0).unwrap()
    }

    fn point(hour: u32) -> PickupPoint {
        PickupPoint {
            id: PickupPointId::new(),
            city: City::Moscow,
            registered_at: at(hour),
        }
    }

    async fn seeded() -> (InMemoryStore, PickupPoint) {
        let store = InMemoryStore::new();
        let p = point(9);
        PickupPointStore::create(&store, &p).await.unwrap();
        (store, p)
    }

    #[tokio::test]
    async fn second_open_reception_is_a_conflict() {
        let (store, p) = seeded().await;
        let first = Reception::open(ReceptionId::new(), p.id, at(10));
        ReceptionStore::create(&store, &first).await.unwrap();

        let second = Reception::open(ReceptionId::new(), p.id, at(11));
        let err = ReceptionStore::create(&store, &second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn most_recent_breaks_timestamp_ties_by_insertion_order() {
        let (store, p) = seeded().await;
        let older = Reception::open(ReceptionId::new(), p.id, at(10)).close().unwrap();
        let newer = Reception::open(ReceptionId::new(), p.id, at(10));
        ReceptionStore::create(&store, &older).await.unwrap();
        ReceptionStore::create(&store, &newer).await.unwrap();

        let latest = ReceptionStore::get_most_recent(&store, p.id).await.unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[tokio::test]
    async fn update_status_is_compare_and_set() {
        let (store, p) = seeded().await;
        let r = Reception::open(ReceptionId::new(), p.id, at(10));
        ReceptionStore::create(&store, &r).await.unwrap();

        let changed = store
            .update_status(r.id, ReceptionStatus::InProgress, ReceptionStatus::Closed)
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let changed = store
            .update_status(r.id, ReceptionStatus::InProgress, ReceptionStatus::Closed)
            .await
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[tokio::test]
    async fn products_cannot_be_added_to_closed_reception() {
        let (store, p) = seeded().await;
        let r = Reception::open(ReceptionId::new(), p.id, at(10)).close().unwrap();
        ReceptionStore::create(&store, &r).await.unwrap();

        let product = Product::new(ProductId::new(), r.id, ProductType::Shoes, at(11));
        let err = ProductStore::create(&store, &product).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_refuses_products_of_closed_reception() {
        let (store, p) = seeded().await;
        let r = Reception::open(ReceptionId::new(), p.id, at(10));
        ReceptionStore::create(&store, &r).await.unwrap();
        let product = Product::new(ProductId::new(), r.id, ProductType::Shoes, at(11));
        ProductStore::create(&store, &product).await.unwrap();

        store
            .update_status(r.id, ReceptionStatus::InProgress, ReceptionStatus::Closed)
            .await
            .unwrap();

        assert_eq!(store.delete(product.id).await.unwrap(), 0);
        assert_eq!(store.list_by_reception(r.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_filtered_orders_and_pages() {
        let store = InMemoryStore::new();
        let late = point(12);
        let early = point(9);
        let mid = point(10);
        for p in [&late, &early, &mid] {
            PickupPointStore::create(&store, p).await.unwrap();
        }

        let all = store.list_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![early.id, mid.id, late.id]);

        let filter = PickupPointFilter {
            range: pvz_core::DateRange::new(Some(at(10)), None),
            page: PageRequest::new(Some(2), Some(1)).unwrap(),
        };
        let page = store.list_filtered(&filter).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, late.id);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_internal() {
        let (store, p) = seeded().await;
        store.fail_on("pickup_points.get_by_id");
        assert!(matches!(
            store.get_by_id(p.id).await,
            Err(StoreError::Internal(_))
        ));

        store.clear_failures();
        assert!(store.get_by_id(p.id).await.is_ok());
    }
}
