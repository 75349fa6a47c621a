use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::models::{Claims, Principal};

/// HS256 access/refresh token issuer and validator, matching the teacher
/// crate's `auth::jwt::JwtService` shape (SPEC_FULL.md §6): 15-minute
/// access tokens, 30-day refresh tokens, `jti` for revocation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: Duration,
    refresh_token_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").field("encoding_key", &"[REDACTED]").finish()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: Duration::minutes(15),
            refresh_token_expires_in: Duration::days(30),
        }
    }

    pub fn create_access_token(&self, user_id: Uuid, is_admin: bool) -> Result<String, AuthError> {
        self.create_token(user_id, is_admin, self.access_token_expires_in)
    }

    pub fn create_refresh_token(&self, user_id: Uuid, is_admin: bool) -> Result<String, AuthError> {
        self.create_token(user_id, is_admin, self.refresh_token_expires_in)
    }

    fn create_token(&self, user_id: Uuid, is_admin: bool, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    pub fn extract_principal(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(Principal { user_id, is_admin: claims.is_admin })
    }
}

/// Extract the bearer token from an `Authorization` header value.
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    let token = auth_header.strip_prefix("Bearer ").ok_or(AuthError::InvalidAuthHeaderFormat)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeaderFormat);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let service = JwtService::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = service.create_access_token(user_id, true).unwrap();
        let principal = service.extract_principal(&token).unwrap();
        assert_eq!(principal.user_id, user_id);
        assert!(principal.is_admin);
    }

    #[test]
    fn rejects_malformed_bearer_header() {
        assert!(extract_bearer_token("Basic abc").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
        assert_eq!(extract_bearer_token("Bearer xyz").unwrap(), "xyz");
    }
}
