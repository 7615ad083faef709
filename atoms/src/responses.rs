use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::errors::ApprovalError;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    message: String,
}

/// Serialize `value` as a JSON response with the given status.
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}

/// Render a refused operation as `{"error": kind, "message": text}`.
pub fn error(err: &ApprovalError) -> Result<Response<Body>, Error> {
    match err {
        ApprovalError::Store(msg) => tracing::error!("Store failure: {}", msg),
        other => tracing::warn!("Request refused ({}): {}", other.kind(), other),
    }
    json(
        err.status_code(),
        &ErrorResponse {
            error: err.kind(),
            message: err.to_string(),
        },
    )
}

/// Map a service result onto a response, rendering refusals as error bodies.
pub fn respond<T: Serialize>(
    status: StatusCode,
    result: Result<T, ApprovalError>,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(value) => json(status, &value),
        Err(e) => error(&e),
    }
}
