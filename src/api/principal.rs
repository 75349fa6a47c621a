use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::jwt::extract_bearer_token;
use crate::auth::models::Principal;
use crate::api::state::AppState;
use crate::config::AuthMode;
use crate::kernel::ports::Store;

/// Resolves the authenticated caller per spec.md §6: either a bearer JWT
/// or, in trust mode, the `X-User-ID` / `X-Admin` headers. Handlers take
/// `Principal` as an ordinary extractor argument rather than reading
/// request extensions, since trust mode needs no prior middleware pass.
impl<S: Store + 'static> FromRequestParts<AppState<S>> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        match state.auth_mode {
            AuthMode::Bearer => {
                let header = parts
                    .headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(AuthError::MissingAuthHeader)?;
                let token = extract_bearer_token(header)?;
                state.jwt.extract_principal(token)
            }
            AuthMode::Trust => {
                let user_id = parts
                    .headers
                    .get("x-user-id")
                    .and_then(|v| v.to_str().ok())
                    .ok_or(AuthError::MissingAuthHeader)?;
                let user_id = Uuid::parse_str(user_id).map_err(|_| AuthError::InvalidToken)?;
                let is_admin = parts
                    .headers
                    .get("x-admin")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                Ok(Principal { user_id, is_admin })
            }
        }
    }
}
