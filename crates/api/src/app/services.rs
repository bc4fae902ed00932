//! Service wiring: picks the store backend and exposes the core operations to handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;

use pvz_core::{Clock, DomainResult, SystemClock};
use pvz_infra::config::{AppConfig, DatabaseConfig};
use pvz_infra::db;
use pvz_infra::services::{
    AggregationQuery, ProductLedger, PvzDirectory, PvzLocks, ReceptionLifecycle,
};
use pvz_infra::store::{
    InMemoryStore, PickupPointStore, PostgresStore, ProductStore, ReceptionStore,
};

use crate::app::errors;

type DynClock = Arc<dyn Clock>;
type DynPoints = Arc<dyn PickupPointStore>;
type DynReceptions = Arc<dyn ReceptionStore>;
type DynProducts = Arc<dyn ProductStore>;

pub type Directory = PvzDirectory<DynPoints, DynClock>;
pub type Lifecycle = ReceptionLifecycle<Directory, DynReceptions, DynClock>;
pub type Ledger = ProductLedger<Directory, DynReceptions, DynProducts, DynClock>;
pub type Aggregation = AggregationQuery<DynPoints, DynReceptions, DynProducts>;

/// Everything the handlers need, shared through an `Extension<Arc<AppServices>>`.
pub struct AppServices {
    pub directory: Directory,
    pub lifecycle: Lifecycle,
    pub ledger: Ledger,
    pub aggregation: Aggregation,
    request_timeout: Duration,
}

impl AppServices {
    /// Wire services over arbitrary stores.
    pub fn from_stores(
        points: DynPoints,
        receptions: DynReceptions,
        products: DynProducts,
        clock: DynClock,
        request_timeout: Duration,
    ) -> Self {
        let locks = PvzLocks::new();
        let directory = PvzDirectory::new(Arc::clone(&points), Arc::clone(&clock));

        Self {
            lifecycle: ReceptionLifecycle::new(
                directory.clone(),
                Arc::clone(&receptions),
                Arc::clone(&clock),
                locks.clone(),
            ),
            ledger: ProductLedger::new(
                directory.clone(),
                Arc::clone(&receptions),
                Arc::clone(&products),
                clock,
                locks,
            ),
            aggregation: AggregationQuery::new(points, receptions, products),
            directory,
            request_timeout,
        }
    }

    /// In-memory stores (dev/test).
    pub fn in_memory(request_timeout: Duration) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::from_stores(
            store.clone(),
            store.clone(),
            store,
            Arc::new(SystemClock),
            request_timeout,
        )
    }

    /// PostgreSQL stores; connects and applies the schema.
    pub async fn persistent(
        config: &DatabaseConfig,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let pool = db::connect(config)
            .await
            .context("failed to connect to Postgres")?;
        db::migrate(&pool)
            .await
            .context("failed to apply database schema")?;

        let store = Arc::new(PostgresStore::new(pool));
        Ok(Self::from_stores(
            store.clone(),
            store.clone(),
            store,
            Arc::new(SystemClock),
            request_timeout,
        ))
    }

    /// Run one service call under the request deadline, mapping failures to responses.
    pub async fn run<T, F>(&self, call: F) -> Result<T, axum::response::Response>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(errors::domain_error_to_response(err)),
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(timeout_ms, "request deadline exceeded");
                Err(errors::json_error(
                    StatusCode::GATEWAY_TIMEOUT,
                    "Timeout",
                    "request deadline exceeded",
                ))
            }
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database {
        Some(database) => {
            tracing::info!("using PostgreSQL stores");
            AppServices::persistent(database, config.request_timeout).await
        }
        None => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory(config.request_timeout))
        }
    }
}
