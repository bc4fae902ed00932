//! PostgreSQL store tests. Skipped unless `DATABASE_URL` points at a scratch database.

use std::time::Duration;

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

use pvz_core::{DateRange, PageRequest, PickupPointId, ProductId, ReceptionId};
use pvz_infra::config::DatabaseConfig;
use pvz_infra::db;
use pvz_infra::store::{
    PickupPointFilter, PickupPointStore, PostgresStore, ProductStore, ReceptionStore, StoreError,
};
use pvz_pickup_points::{City, PickupPoint};
use pvz_products::{Product, ProductType};
use pvz_receptions::{Reception, ReceptionStatus};

async fn store() -> Option<PostgresStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 5,
        max_lifetime: Duration::from_secs(60),
    };
    let pool = db::connect(&config).await.expect("connect");
    db::migrate(&pool).await.expect("migrate");
    Some(PostgresStore::new(pool))
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

async fn seeded_point(store: &PostgresStore) -> PickupPoint {
    let point = PickupPoint {
        id: PickupPointId::new(),
        city: City::SaintPetersburg,
        registered_at: now(),
    };
    PickupPointStore::create(store, &point).await.unwrap();
    point
}

#[tokio::test]
async fn pickup_point_round_trips() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let point = seeded_point(&store).await;

    let loaded = store.get_by_id(point.id).await.unwrap();
    assert_eq!(loaded, point);
    assert_eq!(
        store.get_by_id(PickupPointId::new()).await.unwrap_err(),
        StoreError::NotFound
    );
}

#[tokio::test]
async fn list_filtered_uses_inclusive_bounds_and_pages() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    // Other rows may share the window; only ours are compared.
    let at = |d: u32| Utc.with_ymd_and_hms(1999, 1, d, 0, 0, 0).unwrap();
    let mut ids = Vec::new();
    for d in 1..=3 {
        let point = PickupPoint {
            id: PickupPointId::new(),
            city: City::Kazan,
            registered_at: at(d),
        };
        PickupPointStore::create(&store, &point).await.unwrap();
        ids.push(point.id);
    }

    let filter = PickupPointFilter {
        range: DateRange::new(Some(at(2)), Some(at(3))),
        page: PageRequest::all(),
    };
    let listed: Vec<_> = store
        .list_filtered(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .filter(|id| ids.contains(id))
        .collect();
    assert_eq!(listed, vec![ids[1], ids[2]]);
}

#[tokio::test]
async fn second_open_reception_violates_unique_index() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let point = seeded_point(&store).await;

    let first = Reception::open(ReceptionId::new(), point.id, now());
    ReceptionStore::create(&store, &first).await.unwrap();

    let second = Reception::open(ReceptionId::new(), point.id, now());
    let err = ReceptionStore::create(&store, &second).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let latest = ReceptionStore::get_most_recent(&store, point.id).await.unwrap();
    assert_eq!(latest.id, first.id);
}

#[tokio::test]
async fn reception_for_unknown_point_is_not_found() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let reception = Reception::open(ReceptionId::new(), PickupPointId::new(), now());
    assert_eq!(
        ReceptionStore::create(&store, &reception).await.unwrap_err(),
        StoreError::NotFound
    );
}

#[tokio::test]
async fn status_update_is_compare_and_set() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let point = seeded_point(&store).await;
    let reception = Reception::open(ReceptionId::new(), point.id, now());
    ReceptionStore::create(&store, &reception).await.unwrap();

    let (open, closed) = (ReceptionStatus::InProgress, ReceptionStatus::Closed);
    assert_eq!(store.update_status(reception.id, open, closed).await.unwrap(), 1);
    assert_eq!(store.update_status(reception.id, open, closed).await.unwrap(), 0);
    assert_eq!(store.update_status(ReceptionId::new(), open, closed).await.unwrap(), 0);
}

#[tokio::test]
async fn products_follow_reception_state() {
    let Some(store) = store().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let point = seeded_point(&store).await;
    let reception = Reception::open(ReceptionId::new(), point.id, now());
    ReceptionStore::create(&store, &reception).await.unwrap();

    let first = Product::new(ProductId::new(), reception.id, ProductType::Electronics, now());
    let second = Product::new(ProductId::new(), reception.id, ProductType::Clothing, now());
    ProductStore::create(&store, &first).await.unwrap();
    ProductStore::create(&store, &second).await.unwrap();

    let latest = ProductStore::get_most_recent(&store, reception.id).await.unwrap();
    assert_eq!(latest.id, second.id);
    assert_eq!(store.delete(second.id).await.unwrap(), 1);
    assert_eq!(store.list_by_reception(reception.id).await.unwrap(), vec![first.clone()]);

    store
        .update_status(reception.id, ReceptionStatus::InProgress, ReceptionStatus::Closed)
        .await
        .unwrap();

    let late = Product::new(ProductId::new(), reception.id, ProductType::Shoes, now());
    assert!(matches!(
        ProductStore::create(&store, &late).await,
        Err(StoreError::Conflict(_))
    ));
    assert_eq!(store.delete(first.id).await.unwrap(), 0);

    let orphan = Product::new(ProductId::new(), ReceptionId::new(), ProductType::Shoes, now());
    assert_eq!(
        ProductStore::create(&store, &orphan).await.unwrap_err(),
        StoreError::NotFound
    );
}
