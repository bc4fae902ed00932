use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::PickupPointId;
use pvz_infra::services::{PickupPointView, ReceptionView};
use pvz_pickup_points::PickupPoint;
use pvz_products::Product;
use pvz_receptions::Reception;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePvzRequest {
    pub city: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceptionRequest {
    pub pvz_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    #[serde(rename = "type")]
    pub product_type: String,
    pub pvz_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPvzQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvzResponse {
    pub id: String,
    pub registration_date: DateTime<Utc>,
    pub city: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionResponse {
    pub id: String,
    pub date_time: DateTime<Utc>,
    pub pvz_id: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub product_type: &'static str,
    pub reception_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReceptionWithProducts {
    pub reception: ReceptionResponse,
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Serialize)]
pub struct PvzWithReceptions {
    pub pvz: PvzResponse,
    pub receptions: Vec<ReceptionWithProducts>,
}

// -------------------------
// Mapping helpers
// -------------------------

pub fn pvz_to_response(point: &PickupPoint) -> PvzResponse {
    PvzResponse {
        id: point.id.to_string(),
        registration_date: point.registered_at,
        city: point.city.as_str(),
    }
}

pub fn reception_to_response(reception: &Reception) -> ReceptionResponse {
    ReceptionResponse {
        id: reception.id.to_string(),
        date_time: reception.created_at,
        pvz_id: reception.pickup_point_id.to_string(),
        status: reception.status.as_str(),
    }
}

pub fn product_to_response(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id.to_string(),
        date_time: product.created_at,
        product_type: product.product_type.as_str(),
        reception_id: product.reception_id.to_string(),
    }
}

pub fn view_to_response(view: &PickupPointView) -> PvzWithReceptions {
    PvzWithReceptions {
        pvz: pvz_to_response(&view.pickup_point),
        receptions: view.receptions.iter().map(reception_view_to_response).collect(),
    }
}

fn reception_view_to_response(view: &ReceptionView) -> ReceptionWithProducts {
    ReceptionWithProducts {
        reception: reception_to_response(&view.reception),
        products: view.products.iter().map(product_to_response).collect(),
    }
}

pub fn parse_pvz_id(raw: &str) -> Result<PickupPointId, axum::response::Response> {
    raw.parse::<PickupPointId>().map_err(|e| {
        errors::json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "InvalidPVZId",
            e.to_string(),
        )
    })
}
