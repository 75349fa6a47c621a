use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::errors::AuthError;
use crate::kernel::error::KernelError;

/// Wraps `KernelError` at the HTTP boundary so the kernel itself never
/// depends on `axum`. Status codes follow spec.md §7's taxonomy verbatim.
pub struct ApiError(pub KernelError);

impl From<KernelError> for ApiError {
    fn from(err: KernelError) -> Self {
        ApiError(err)
    }
}

fn status_for(err: &KernelError) -> StatusCode {
    match err {
        KernelError::NotFound(_) => StatusCode::NOT_FOUND,
        KernelError::NotEnrolled => StatusCode::NOT_FOUND,
        KernelError::Validation(_) => StatusCode::BAD_REQUEST,
        KernelError::InvalidEnrollmentState(_) => StatusCode::BAD_REQUEST,
        KernelError::MissingMax { .. } => StatusCode::BAD_REQUEST,
        KernelError::PrescriptionMismatch => StatusCode::BAD_REQUEST,
        KernelError::AmrapFlagMismatch => StatusCode::BAD_REQUEST,
        KernelError::ProgressionNotApplied { .. } => StatusCode::BAD_REQUEST,
        KernelError::SessionAlreadyOpen => StatusCode::CONFLICT,
        KernelError::DuplicateSet => StatusCode::CONFLICT,
        KernelError::AlreadyEnrolled => StatusCode::CONFLICT,
        // Finish/Abandon/LogSet on a non-IN_PROGRESS session: spec.md §8's
        // idempotence property requires re-finishing to read back as 409.
        KernelError::SessionNotOpen => StatusCode::CONFLICT,
        KernelError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = Json(json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

/// A handler-level validation failure that never reached the kernel (e.g. a
/// malformed request body field the kernel's types can't even express).
pub struct ValidationError(pub String);

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": { "code": "validation", "message": self.0 } }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// The union of failure modes a handler can return, so handlers can use a
/// single `?`-friendly error type.
pub enum HandlerError {
    Kernel(KernelError),
    Auth(AuthError),
    Validation(String),
}

impl From<KernelError> for HandlerError {
    fn from(err: KernelError) -> Self {
        HandlerError::Kernel(err)
    }
}

impl From<AuthError> for HandlerError {
    fn from(err: AuthError) -> Self {
        HandlerError::Auth(err)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Kernel(err) => ApiError(err).into_response(),
            HandlerError::Auth(err) => err.into_response(),
            HandlerError::Validation(msg) => ValidationError(msg).into_response(),
        }
    }
}
