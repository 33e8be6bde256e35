// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity token exchange routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::create_session_token;
use crate::models::UserProfile;
use crate::services::identity::{decode_unverified_identity_token, IdentityError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/google", post(google_exchange))
        .route("/api/auth/logout", post(logout))
}

/// Body of a token exchange request.
#[derive(Deserialize)]
pub struct TokenExchangeRequest {
    #[serde(default)]
    token: Option<String>,
}

/// Session token plus the profile it was minted for.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenExchangeResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Exchange a third-party identity token for a session token.
async fn google_exchange(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TokenExchangeRequest>, JsonRejection>,
) -> Result<Json<TokenExchangeResponse>> {
    let token = match payload {
        Ok(Json(body)) => body.token,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable token exchange body");
            None
        }
    }
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::BadRequest("No token provided".to_string()))?;

    let user = match state.identity_verifier.verify_identity_token(&token).await {
        Ok(user) => user,
        Err(IdentityError::Misconfigured(reason)) if unverified_fallback_enabled(&state.config) => {
            tracing::warn!(
                reason = %reason,
                "INSECURE: identity provider unconfigured, accepting identity token without signature verification"
            );
            decode_unverified_identity_token(&token).map_err(|e| {
                tracing::warn!(error = %e, "Unverified identity token could not be decoded");
                AppError::InvalidIdentityToken
            })?
        }
        Err(err) => {
            match &err {
                IdentityError::Transient(_) => {
                    tracing::error!(error = %err, "Identity verification transient failure")
                }
                _ => tracing::warn!(error = %err, "Identity token rejected"),
            }
            return Err(AppError::InvalidIdentityToken);
        }
    };

    let session_token = create_session_token(
        &user,
        &state.config.jwt_signing_key,
        state.config.session_ttl_secs,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    tracing::info!(uid = %user.uid, "Issued session token");

    Ok(Json(TokenExchangeResponse {
        token: session_token,
        user,
    }))
}

/// The decode-without-verify path. Config loading already refuses the flag
/// in production; the environment is checked again here.
fn unverified_fallback_enabled(config: &Config) -> bool {
    config.allow_unverified_identity_tokens && !config.environment.is_production()
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: &'static str,
}

/// Logout - session tokens are bearer credentials held by the client, so
/// there is nothing to revoke server-side.
async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logged out successfully",
    })
}
