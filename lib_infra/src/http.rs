//! # HTTP Response Helpers
//!
//! Builds `axum` responses carrying a JSON body and an explicit status code.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("[lib_infra] invalid status code {0}")]
    Status(u16),
    #[error("[lib_infra] failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("[lib_infra] failed to build response: {0}")]
    Build(#[from] axum::http::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    response: &'a str,
    status: &'a str,
}

/// Serializes `payload` and returns it with status `code` and `Content-Type: application/json`.
pub fn respond_with_json<T: Serialize + ?Sized>(code: u16, payload: &T) -> Result<Response, HttpError> {
    let status = StatusCode::from_u16(code).map_err(|_| HttpError::Status(code))?;
    let body = serde_json::to_vec(payload)?;
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?;
    Ok(response)
}

/// Responds with `{"response": msg, "status": "failed"}`.
pub fn respond_with_error(code: u16, msg: &str) -> Result<Response, HttpError> {
    respond_with_json(
        code,
        &ErrorBody {
            response: msg,
            status: "failed",
        },
    )
}
