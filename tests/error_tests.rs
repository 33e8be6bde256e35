// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fashion_auth::error::AppError;
use fashion_auth::middleware::auth::SessionError;

mod common;

#[tokio::test]
async fn test_error_status_codes() {
    let cases = [
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED, "unauthorized"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::InvalidIdentityToken,
            StatusCode::UNAUTHORIZED,
            "invalid_identity_token",
        ),
        (
            AppError::BadRequest("No token provided".to_string()),
            StatusCode::BAD_REQUEST,
            "bad_request",
        ),
    ];

    for (err, status, code) in cases {
        let message = err.to_string();
        let response = err.into_response();
        assert_eq!(response.status(), status);

        let body = common::body_json(response).await;
        assert_eq!(body["error"], code);
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn test_internal_error_does_not_leak_details() {
    let err = AppError::Internal(anyhow::anyhow!("signing key exploded"));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = common::body_json(response).await;
    assert_eq!(body["message"], "Internal server error");
}

#[test]
fn test_session_errors_map_to_unauthorized_variants() {
    assert!(matches!(
        AppError::from(SessionError::MissingBearer),
        AppError::Unauthorized
    ));
    assert!(matches!(
        AppError::from(SessionError::Rejected("bad signature".to_string())),
        AppError::InvalidToken
    ));
}
