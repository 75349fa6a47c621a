use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// The `{"data": ...}` envelope every successful response wraps, per
/// spec.md §6.
pub struct Envelope<T>(pub StatusCode, pub T);

impl<T> Envelope<T> {
    pub fn ok(value: T) -> Self {
        Self(StatusCode::OK, value)
    }

    pub fn created(value: T) -> Self {
        Self(StatusCode::CREATED, value)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let Envelope(status, value) = self;
        (status, Json(serde_json::json!({ "data": value }))).into_response()
    }
}
