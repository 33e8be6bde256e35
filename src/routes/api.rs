// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::middleware::auth::SessionClaims;
use crate::models::UserProfile;
use crate::AppState;
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a session token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/user", get(get_user))
        .route("/api/dashboard", get(get_dashboard))
}

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CurrentUserResponse {
    pub user: UserProfile,
}

/// Return the user the session token was issued for.
async fn get_user(Extension(claims): Extension<SessionClaims>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse { user: claims.user })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub message: String,
}

async fn get_dashboard(Extension(claims): Extension<SessionClaims>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        message: format!(
            "Welcome to the dashboard, {}",
            claims.user.display_name()
        ),
    })
}
