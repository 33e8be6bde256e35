// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::Response;
use fashion_auth::config::Config;
use fashion_auth::routes::create_router;
use fashion_auth::services::IdentityVerifier;
use fashion_auth::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key id the static test verifier accepts.
pub const TEST_KID: &str = "fashion-test-key";

const IDENTITY_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/identity_test_key.pem");
const IDENTITY_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/identity_test_key.pub.pem");

#[allow(dead_code)]
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Create a test app whose identity verifier trusts the fixture RSA key.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let decoding_key =
        DecodingKey::from_rsa_pem(IDENTITY_PUBLIC_KEY).expect("fixture public key should parse");
    let identity_verifier = IdentityVerifier::new_with_static_key(&config, TEST_KID, decoding_key)
        .expect("static verifier should build");

    let state = Arc::new(AppState {
        config,
        identity_verifier: Arc::new(identity_verifier),
    });

    (create_router(state.clone()), state)
}

/// Create a test app using the production verifier constructor.
#[allow(dead_code)]
pub fn create_test_app_with_remote_verifier(config: Config) -> (axum::Router, Arc<AppState>) {
    let identity_verifier = IdentityVerifier::new(&config).expect("verifier should build");

    let state = Arc::new(AppState {
        config,
        identity_verifier: Arc::new(identity_verifier),
    });

    (create_router(state.clone()), state)
}

/// Valid Firebase ID token claims for the test project.
#[allow(dead_code)]
pub fn firebase_claims(project_id: &str) -> Value {
    let now = now();
    json!({
        "iss": format!("https://securetoken.google.com/{project_id}"),
        "aud": project_id,
        "sub": "firebase-uid-42",
        "user_id": "firebase-uid-42",
        "iat": now,
        "auth_time": now,
        "exp": now + 3600,
        "name": "Coco Chanel",
        "email": "coco@example.com",
        "email_verified": true,
        "picture": "https://example.com/coco.png",
    })
}

/// Valid Google Sign-In ID token claims for the given OAuth client.
#[allow(dead_code)]
pub fn google_claims(client_id: &str) -> Value {
    let now = now();
    json!({
        "iss": "https://accounts.google.com",
        "azp": client_id,
        "aud": client_id,
        "sub": "google-sub-7",
        "iat": now,
        "exp": now + 3600,
        "name": "Yves Saint Laurent",
        "email": "yves@example.com",
        "email_verified": true,
        "picture": "https://example.com/yves.png",
    })
}

/// Sign identity token claims with the fixture RSA key.
#[allow(dead_code)]
pub fn sign_identity_token(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());

    let key =
        EncodingKey::from_rsa_pem(IDENTITY_PRIVATE_KEY).expect("fixture private key should parse");
    encode(&header, claims, &key).expect("Failed to sign identity token")
}

/// Sign session claims with an HMAC key, bypassing the crate's own helper.
#[allow(dead_code)]
pub fn sign_session_claims(claims: &Value, signing_key: &[u8]) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(signing_key),
    )
    .expect("Failed to create JWT")
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
