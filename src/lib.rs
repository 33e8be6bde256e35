// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fashion-Auth: authentication server for the fashion recommendation app
//!
//! This crate exchanges third-party identity tokens (Firebase or Google
//! Sign-In) for short-lived session tokens and gates the protected API
//! routes on them.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::IdentityVerifier;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity_verifier: Arc<IdentityVerifier>,
}
