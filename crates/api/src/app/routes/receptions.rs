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
    Router::new().route("/", post(open_reception))
}

pub async fn open_reception(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateReceptionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::bad_body(rejection),
    };
    let pvz_id = match dto::parse_pvz_id(&body.pvz_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.run(services.lifecycle.open_reception(pvz_id)).await {
        Ok(reception) => {
            (StatusCode::CREATED, Json(dto::reception_to_response(&reception))).into_response()
        }
        Err(response) => response,
    }
}
