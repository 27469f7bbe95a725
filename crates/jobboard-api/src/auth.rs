//! Session token verification and caller extractors.
//!
//! Tokens are HS256 JWTs minted by the identity provider. They arrive in the
//! `token` cookie or an `Authorization: Bearer` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use jobboard_models::{UserId, UserRole};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie that carries the session token.
pub const SESSION_COOKIE: &str = "token";

const NOT_AUTHENTICATED: &str = "User not authenticated";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    #[serde(default)]
    pub role: UserRole,
    /// Expiry (seconds since epoch)
    pub exp: usize,
}

/// Verified identity of the caller, passed into every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: UserId,
    pub role: UserRole,
}

impl CallerContext {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_recruiter(&self) -> bool {
        self.role == UserRole::Recruiter
    }
}

/// Verifies session tokens against the shared HS256 secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and build the caller context from its claims.
    pub fn verify(&self, token: &str) -> Result<CallerContext, ApiError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Token verification failed: {}", e);
            ApiError::unauthorized(NOT_AUTHENTICATED)
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(ApiError::unauthorized(NOT_AUTHENTICATED));
        }

        Ok(CallerContext::new(UserId::from_string(claims.sub), claims.role))
    }
}

/// Pull the raw token from the session cookie, falling back to a bearer header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub CallerContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(&parts.headers).ok_or_else(|| ApiError::unauthorized(NOT_AUTHENTICATED))?;
        let caller = state.verifier.verify(&token)?;
        Ok(AuthUser(caller))
    }
}

/// Authenticated caller holding the recruiter role.
#[derive(Debug, Clone)]
pub struct RecruiterUser(pub CallerContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for RecruiterUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(caller) = AuthUser::from_request_parts(parts, state).await?;
        if !caller.is_recruiter() {
            return Err(ApiError::forbidden("Recruiter access required"));
        }
        Ok(RecruiterUser(caller))
    }
}
