//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with the shared `AUTH_SECRET`. The
//! upstream identity provider is a collaborator; this extractor only
//! turns a valid token into the owner identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vidgen_models::OwnerId;

use crate::error::ApiError;
use crate::state::AppState;

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration
    pub exp: i64,
    /// Issued at
    #[serde(default)]
    pub iat: i64,
}

/// Authenticated user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
}

impl AuthUser {
    /// The owner identity for record access checks.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::from_string(&self.uid)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected Bearer token"))?;

        let key = DecodingKey::from_secret(state.config.auth_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(ApiError::unauthorized("Token has no subject"));
        }

        debug!(uid = %data.claims.sub, "Authenticated request");
        Ok(AuthUser {
            uid: data.claims.sub,
        })
    }
}
