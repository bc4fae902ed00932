use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use pvz_core::{DateRange, PageRequest};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_pvz).get(list_pvz))
        .route("/:pvz_id/close_last_reception", post(close_last_reception))
        .route("/:pvz_id/delete_last_product", post(delete_last_product))
}

pub async fn create_pvz(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePvzRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::bad_body(rejection),
    };

    match services.run(services.directory.create(&body.city)).await {
        Ok(point) => (StatusCode::CREATED, Json(dto::pvz_to_response(&point))).into_response(),
        Err(response) => response,
    }
}

pub async fn list_pvz(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListPvzQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::bad_body(rejection),
    };
    let page = match PageRequest::new(query.page, query.limit) {
        Ok(page) => page,
        Err(err) => return errors::domain_error_to_response(err),
    };
    let range = DateRange::new(query.start_date, query.end_date);

    match services.run(services.aggregation.list(range, page)).await {
        Ok(views) => {
            let body: Vec<_> = views.iter().map(dto::view_to_response).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(response) => response,
    }
}

pub async fn close_last_reception(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pvz_id): Path<String>,
) -> axum::response::Response {
    let pvz_id = match dto::parse_pvz_id(&pvz_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.run(services.lifecycle.close_last_reception(pvz_id)).await {
        Ok(reception) => {
            (StatusCode::OK, Json(dto::reception_to_response(&reception))).into_response()
        }
        Err(response) => response,
    }
}

pub async fn delete_last_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(pvz_id): Path<String>,
) -> axum::response::Response {
    let pvz_id = match dto::parse_pvz_id(&pvz_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.run(services.ledger.delete_last_product(pvz_id)).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(response) => response,
    }
}
