// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CORS policy for the single-page frontend.
//!
//! Allowed origins are the configured frontend origin plus plain-HTTP
//! loopback dev servers on any port. Origins are compared after parsing, so
//! `http://localhost.evil.example` is not mistaken for `http://localhost`.

use axum::http::{header, request::Parts, HeaderValue, Method};
use reqwest::Url;
use tower_http::cors::{AllowOrigin, CorsLayer};

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Build the CORS layer for the given frontend URL.
pub fn cors_layer(frontend_url: &str) -> CorsLayer {
    let frontend_origin = origin_of(frontend_url);
    if frontend_origin.is_none() {
        tracing::warn!(frontend_url = %frontend_url, "FRONTEND_URL is not a valid URL; only loopback origins allowed");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|o| is_allowed_origin(o, frontend_origin.as_deref()))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Whether a browser `Origin` header value may call the API.
pub fn is_allowed_origin(origin: &str, frontend_origin: Option<&str>) -> bool {
    let Some(parsed) = origin_of(origin) else {
        return false;
    };

    if frontend_origin == Some(parsed.as_str()) {
        return true;
    }

    let Ok(url) = Url::parse(&parsed) else {
        return false;
    };
    url.scheme() == "http" && url.host_str().is_some_and(|h| LOOPBACK_HOSTS.contains(&h))
}

/// Normalized `scheme://host[:port]` of a URL, or None for opaque origins.
fn origin_of(value: &str) -> Option<String> {
    let url = Url::parse(value.trim()).ok()?;
    if !url.username().is_empty() || url.password().is_some() {
        return None;
    }
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTEND: Option<&str> = Some("https://style.example.com");

    #[test]
    fn frontend_origin_allowed() {
        let frontend = origin_of("https://style.example.com/").unwrap();
        assert_eq!(frontend, "https://style.example.com");
        assert!(is_allowed_origin("https://style.example.com", Some(&frontend)));
    }

    #[test]
    fn loopback_dev_servers_allowed() {
        for origin in [
            "http://localhost",
            "http://localhost:5173",
            "http://127.0.0.1:3000",
        ] {
            assert!(is_allowed_origin(origin, FRONTEND), "{origin}");
        }
    }

    #[test]
    fn lookalike_hosts_rejected() {
        for origin in [
            "http://localhost.evil.example",
            "http://127.0.0.1.evil.example",
            "http://localhost:5173.evil.example",
            "https://style.example.com.evil.example",
            "http://evil.example#http://localhost",
            "https://localhost:5173",
            "null",
            "",
        ] {
            assert!(!is_allowed_origin(origin, FRONTEND), "{origin}");
        }
    }
}
