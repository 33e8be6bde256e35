// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance and the route gate for protected API routes.

use crate::error::AppError;
use anyhow::Context;
use crate::models::UserProfile;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Session token claims.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub user: UserProfile,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Why a request failed the session check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("authorization header missing or malformed")]
    MissingBearer,
    #[error("session token rejected: {0}")]
    Rejected(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingBearer => AppError::Unauthorized,
            SessionError::Rejected(_) => AppError::InvalidToken,
        }
    }
}

/// Middleware that requires a valid session token.
///
/// On success the decoded [`SessionClaims`] are available to handlers via
/// `Extension<SessionClaims>`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let claims = decode_session_token(token, &state.config.jwt_signing_key).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        e
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(SessionError::MissingBearer)?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(SessionError::MissingBearer),
    }
}

/// Create a session token for a verified user.
pub fn create_session_token(
    user: &UserProfile,
    signing_key: &[u8],
    ttl_secs: u64,
) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let exp = now
        .checked_add(ttl_secs)
        .context("session lifetime overflows the expiry timestamp")?;

    let claims = SessionClaims {
        user: user.clone(),
        iat: now,
        exp,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session token's signature and expiry and return its claims.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Result<SessionClaims, SessionError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    // We mint these tokens ourselves; no skew to allow for.
    validation.leeway = 0;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| SessionError::Rejected(e.to_string()))?;

    if token_data.claims.user.uid.is_empty() {
        return Err(SessionError::Rejected("empty uid claim".to_string()));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    fn user() -> UserProfile {
        UserProfile {
            uid: "firebase-uid-1".to_string(),
            name: Some("Grace Hopper".to_string()),
            email: Some("grace@example.com".to_string()),
            picture: Some("https://example.com/grace.png".to_string()),
        }
    }

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn session_token_roundtrip_preserves_claims() {
        let token = create_session_token(&user(), KEY, 3600).unwrap();
        let claims = decode_session_token(&token, KEY).unwrap();

        assert_eq!(claims.user, user());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn session_token_overflowing_ttl_is_an_error() {
        assert!(create_session_token(&user(), KEY, u64::MAX).is_err());
    }

    #[test]
    fn session_token_wrong_key_rejected() {
        let token = create_session_token(&user(), KEY, 3600).unwrap();
        assert!(matches!(
            decode_session_token(&token, b"some_other_key"),
            Err(SessionError::Rejected(_))
        ));
    }

    #[test]
    fn session_token_garbage_rejected() {
        assert!(matches!(
            decode_session_token("not.a.jwt", KEY),
            Err(SessionError::Rejected(_))
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Ok("abc"));
        assert_eq!(
            bearer_token(&HeaderMap::new()),
            Err(SessionError::MissingBearer)
        );
        assert_eq!(
            bearer_token(&headers_with("Basic abc")),
            Err(SessionError::MissingBearer)
        );
        assert_eq!(
            bearer_token(&headers_with("Bearer ")),
            Err(SessionError::MissingBearer)
        );
        assert_eq!(
            bearer_token(&headers_with("bearer abc")),
            Err(SessionError::MissingBearer)
        );
    }
}
