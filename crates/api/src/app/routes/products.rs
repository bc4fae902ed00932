use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(add_product))
}

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::bad_body(rejection),
    };
    let pvz_id = match dto::parse_pvz_id(&body.pvz_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services
        .run(services.ledger.add_product(pvz_id, &body.product_type))
        .await
    {
        Ok(product) => {
            (StatusCode::CREATED, Json(dto::product_to_response(&product))).into_response()
        }
        Err(response) => response,
    }
}
