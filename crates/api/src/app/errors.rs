use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pvz_core::DomainError;

/// Map a domain outcome to an HTTP error response.
///
/// Rejected transitions and missing references are client errors (400); only
/// collaborator failures become 500.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = if err.is_retryable() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Response for a request body that failed to parse.
pub fn bad_body(rejection: impl std::fmt::Display) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "InvalidRequest", rejection.to_string())
}
