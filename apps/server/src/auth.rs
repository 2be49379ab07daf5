use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tradelens_core::connections::CallerIdentity;

use crate::error::ApiError;
use crate::main_lib::AppState;

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize,
}

/// Verifies HS256 caller tokens issued by the identity service.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<CallerIdentity, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired".into()),
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => ApiError::Unauthorized("Invalid token".into()),
                other => ApiError::Internal(format!("Failed to validate token: {other:?}")),
            })?;

        if claims.sub.trim().is_empty() {
            return Err(ApiError::Unauthorized("Token has no subject".into()));
        }
        let is_admin = claims.role.as_deref() == Some(ADMIN_ROLE);
        Ok(CallerIdentity {
            owner_id: claims.sub,
            is_admin,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".into()))
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CallerIdentity);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        state.jwt.verify(token).map(AuthUser)
    }
}

/// An authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CallerIdentity);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_admin {
            return Err(ApiError::Forbidden("Admin role required".into()));
        }
        Ok(AdminUser(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn token(sub: &str, role: Option<&str>, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.map(str::to_string),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn resolves_owner_and_admin_flag() {
        let verifier = JwtVerifier::new(SECRET);

        let user = verifier.verify(&token("u1", None, 600)).unwrap();
        assert_eq!(user, CallerIdentity::user("u1"));

        let admin = verifier.verify(&token("ops", Some("admin"), 600)).unwrap();
        assert_eq!(admin, CallerIdentity::admin("ops"));

        let other_role = verifier.verify(&token("u2", Some("viewer"), 600)).unwrap();
        assert!(!other_role.is_admin);
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let verifier = JwtVerifier::new(SECRET);
        assert!(matches!(
            verifier.verify(&token("u1", None, -600)),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            JwtVerifier::new(b"another").verify(&token("u1", None, 600)),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            verifier.verify("not-a-jwt"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
