use axum::Router;

pub mod products;
pub mod pvz;
pub mod receptions;
pub mod system;

/// Router for all PVZ endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/pvz", pvz::router())
        .nest("/receptions", receptions::router())
        .nest("/products", products::router())
}
