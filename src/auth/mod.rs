//! Bearer-token identity gate.
//!
//! Tokens are HS256 JWTs carrying the user id and admin flag. Handlers ask for
//! the identity they need through the extractors below; rejection happens
//! before any catalog code runs.

use std::time::Duration;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::CurrentUser;
use crate::AppState;

/// Legacy header some clients still send the raw token in.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: i64,
}

/// Mint a signed token for `user_id`, valid for `ttl`.
pub fn issue_token(
    secret: &str,
    user_id: &str,
    is_admin: bool,
    ttl: Duration,
) -> Result<String, AppError> {
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| Utc::now().timestamp().checked_add(secs))
        .ok_or_else(|| AppError::Internal("Token lifetime is out of range".to_string()))?;
    let claims = Claims {
        sub: user_id.to_string(),
        is_admin,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Verify a token's signature and expiry and return the identity it carries.
pub fn decode_token(secret: &str, token: &str) -> Result<CurrentUser, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    if data.claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    }

    Ok(CurrentUser {
        id: data.claims.sub,
        is_admin: data.claims.is_admin,
    })
}

/// Pull the raw token from `Authorization: Bearer` or the legacy header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    bearer
        .or_else(|| {
            headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

async fn reject(state: &AppState, error: AppError) -> AppErrorWithRevision {
    AppErrorWithRevision {
        error,
        revision_id: state.repo.get_revision_id().await.unwrap_or(0),
    }
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = token_from_headers(&parts.headers)
        .ok_or_else(|| AppError::Unauthorized("Access denied. No token provided".to_string()))?;
    decode_token(&state.config.jwt_secret, token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state) {
            Ok(user) => Ok(user),
            Err(e) => Err(reject(state, e).await),
        }
    }
}

/// An authenticated caller with admin rights.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match authenticate(parts, state) {
            Ok(user) => user,
            Err(e) => return Err(reject(state, e).await),
        };

        if !user.is_admin {
            tracing::warn!("User {} attempted an admin-only action", user.id);
            let e = AppError::Forbidden("Admin rights required".to_string());
            return Err(reject(state, e).await);
        }
        Ok(AdminUser(user))
    }
}

/// The caller if a valid token was sent. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppErrorWithRevision;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(parts, state).ok()))
    }
}
