// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development. Identity provider
//! settings are optional: when neither is present the server still starts,
//! but identity token verification reports a misconfiguration.

use std::env;

/// Default session lifetime (one hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Longest session lifetime accepted from `SESSION_TTL_SECS` (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Which third-party identity provider issues the inbound tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProviderConfig {
    /// Firebase Authentication ID tokens for the given project.
    Firebase { project_id: String },
    /// Google Sign-In ID tokens for the given OAuth client.
    Google { client_id: String },
    /// Nothing configured; verification cannot succeed.
    Unconfigured,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Identity provider used to verify inbound identity tokens
    pub identity_provider: IdentityProviderConfig,
    /// HMAC signing secret for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session token lifetime in seconds
    pub session_ttl_secs: u64,
    /// Decode identity tokens without verifying their signature when the
    /// provider is unconfigured. Never honored in production.
    pub allow_unverified_identity_tokens: bool,
}

impl Config {
    /// Config for tests: Firebase provider, development environment.
    pub fn test_default() -> Self {
        Self {
            port: 5001,
            frontend_url: "http://localhost:5173".to_string(),
            environment: Environment::Development,
            identity_provider: IdentityProviderConfig::Firebase {
                project_id: "fashion-test".to_string(),
            },
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            allow_unverified_identity_tokens: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let environment = Environment::parse(&env::var("APP_ENV").unwrap_or_default());

        let allow_unverified_identity_tokens = match env::var("ALLOW_UNVERIFIED_IDENTITY_TOKENS")
        {
            Ok(v) => parse_bool(&v)
                .ok_or(ConfigError::Invalid("ALLOW_UNVERIFIED_IDENTITY_TOKENS"))?,
            Err(_) => false,
        };

        if allow_unverified_identity_tokens && environment.is_production() {
            return Err(ConfigError::UnverifiedTokensInProduction);
        }

        let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ttl| (1..=MAX_SESSION_TTL_SECS).contains(ttl))
                .ok_or(ConfigError::Invalid("SESSION_TTL_SECS"))?,
            Err(_) => DEFAULT_SESSION_TTL_SECS,
        };

        let jwt_signing_key = env::var("JWT_SECRET")
            .map(|v| v.trim().to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()
                .unwrap_or(5001),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            environment,
            identity_provider: identity_provider_from_env(),
            jwt_signing_key,
            session_ttl_secs,
            allow_unverified_identity_tokens,
        })
    }
}

fn identity_provider_from_env() -> IdentityProviderConfig {
    let non_empty = |name: &str| {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(project_id) = non_empty("FIREBASE_PROJECT_ID") {
        return IdentityProviderConfig::Firebase { project_id };
    }
    if let Some(client_id) = non_empty("GOOGLE_CLIENT_ID") {
        return IdentityProviderConfig::Google { client_id };
    }
    IdentityProviderConfig::Unconfigured
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("ALLOW_UNVERIFIED_IDENTITY_TOKENS must not be enabled when APP_ENV=production")]
    UnverifiedTokensInProduction,
}
