use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingAuthHeader,
    #[error("invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("not the resource owner")]
    NotOwner,
    #[error("admin privileges required")]
    AdminRequired,
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthError::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AuthError::InvalidAuthHeaderFormat => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AuthError::NotOwner => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::AdminRequired => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::Jwt(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        };
        let body = Json(json!({ "error": { "code": code, "message": self.to_string() } }));
        (status, body).into_response()
    }
}
