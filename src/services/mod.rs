// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod jwks;

pub use identity::{decode_unverified_identity_token, IdentityError, IdentityVerifier};
