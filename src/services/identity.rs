// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Third-party identity token verification.
//!
//! Inbound identity tokens are RS256 JWTs issued either by Firebase
//! Authentication or by Google Sign-In. Each provider's signing keys come
//! from its fixed JWKS URL; see [`crate::services::jwks`].

use crate::config::{Config, IdentityProviderConfig};
use crate::models::UserProfile;
use crate::services::jwks::RemoteKeys;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity verification error categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The token is malformed, badly signed, expired, or has wrong claims.
    #[error("invalid identity token: {0}")]
    Invalid(String),
    /// No identity provider is configured, so nothing can be verified.
    #[error("identity verification misconfigured: {0}")]
    Misconfigured(String),
    /// Provider keys could not be fetched.
    #[error("identity provider unavailable: {0}")]
    Transient(String),
}

/// Issuer and audience rules of the configured provider.
#[derive(Debug, Clone)]
enum Provider {
    Firebase { project_id: String },
    Google { client_id: String },
}

impl Provider {
    fn from_config(config: &IdentityProviderConfig) -> Option<Self> {
        match config {
            IdentityProviderConfig::Firebase { project_id } => Some(Provider::Firebase {
                project_id: project_id.clone(),
            }),
            IdentityProviderConfig::Google { client_id } => Some(Provider::Google {
                client_id: client_id.clone(),
            }),
            IdentityProviderConfig::Unconfigured => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Provider::Firebase { .. } => "firebase",
            Provider::Google { .. } => "google",
        }
    }

    fn jwks_url(&self) -> &'static str {
        match self {
            Provider::Firebase { .. } => FIREBASE_JWKS_URL,
            Provider::Google { .. } => GOOGLE_JWKS_URL,
        }
    }

    /// RS256 validation pinned to this provider's issuer(s) and audience.
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = CLOCK_SKEW_SECS;

        match self {
            Provider::Firebase { project_id } => {
                validation.set_issuer(&[format!("{FIREBASE_ISSUER_PREFIX}{project_id}")]);
                validation.set_audience(&[project_id]);
            }
            Provider::Google { client_id } => {
                validation.set_issuer(&GOOGLE_ISSUERS);
                validation.set_audience(&[client_id]);
            }
        }

        validation
    }
}

/// Where signing keys come from.
enum SigningKeys {
    Remote(RemoteKeys),
    /// A single pinned key, for tests and local runs without network.
    Pinned {
        kid: String,
        key: Arc<DecodingKey>,
    },
}

/// Verifier for identity provider ID tokens.
pub struct IdentityVerifier {
    http_client: reqwest::Client,
    provider: Option<Provider>,
    signing_keys: Option<SigningKeys>,
}

impl IdentityVerifier {
    /// Create a verifier that fetches and caches the provider's JWKS.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let provider = Provider::from_config(&config.identity_provider);
        let signing_keys = provider
            .as_ref()
            .map(|p| SigningKeys::Remote(RemoteKeys::new(p.jwks_url())));

        if let Some(provider) = &provider {
            tracing::info!(
                provider = provider.name(),
                jwks_url = provider.jwks_url(),
                "Initialized identity token verifier"
            );
        }

        Self::build(provider, signing_keys)
    }

    /// Create a verifier that trusts exactly one RSA public key.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static identity key kid must not be empty");
        }

        Self::build(
            Provider::from_config(&config.identity_provider),
            Some(SigningKeys::Pinned {
                kid,
                key: Arc::new(decoding_key),
            }),
        )
    }

    fn build(provider: Option<Provider>, signing_keys: Option<SigningKeys>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http_client,
            provider,
            signing_keys,
        })
    }

    /// Whether an identity provider is configured at all.
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Verify an identity token and extract the user it identifies.
    pub async fn verify_identity_token(&self, token: &str) -> Result<UserProfile, IdentityError> {
        let (Some(provider), Some(signing_keys)) = (&self.provider, &self.signing_keys) else {
            return Err(IdentityError::Misconfigured(
                "no identity provider configured".to_string(),
            ));
        };

        let header = decode_header(token)
            .map_err(|e| IdentityError::Invalid(format!("invalid JWT header: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::Invalid(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::Invalid("missing JWT kid".to_string()))?;

        let key = match signing_keys {
            SigningKeys::Remote(remote) => remote.key_for(&self.http_client, &kid).await?,
            SigningKeys::Pinned { kid: pinned, key } if *pinned == kid => key.clone(),
            SigningKeys::Pinned { .. } => {
                return Err(IdentityError::Invalid(format!("unknown JWT kid: {kid}")))
            }
        };

        let claims = decode::<IdentityTokenClaims>(token, &key, &provider.validation())
            .map_err(|e| IdentityError::Invalid(format!("JWT validation failed: {e}")))?
            .claims;

        claims.check_times(now_unix_secs())?;
        let profile = claims.into_profile()?;

        tracing::debug!(
            provider = provider.name(),
            uid = %profile.uid,
            "Identity token verified"
        );

        Ok(profile)
    }
}

/// Decode an identity token WITHOUT verifying its signature, issuer,
/// audience, or expiry.
///
/// Anyone can forge a token that passes this. Callers must only reach it
/// through the development-only fallback gated by
/// `Config::allow_unverified_identity_tokens`.
pub fn decode_unverified_identity_token(token: &str) -> Result<UserProfile, IdentityError> {
    let header = decode_header(token)
        .map_err(|e| IdentityError::Invalid(format!("invalid JWT header: {e}")))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_exp = false;
    validation.validate_aud = false;

    let claims = decode::<IdentityTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| IdentityError::Invalid(format!("undecodable JWT: {e}")))?
        .claims;

    claims.into_profile()
}

/// Claims of a Firebase or Google ID token. Registered claims are checked
/// by `jsonwebtoken`; only the ones we read afterwards are listed.
#[derive(Debug, Deserialize)]
struct IdentityTokenClaims {
    sub: Option<String>,
    iat: Option<u64>,
    auth_time: Option<u64>,
    /// Firebase mirrors `sub` here.
    user_id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl IdentityTokenClaims {
    /// `iat` is required; neither it nor `auth_time` may lie in the future.
    fn check_times(&self, now: u64) -> Result<(), IdentityError> {
        let Some(iat) = self.iat else {
            return Err(IdentityError::Invalid("missing iat claim".to_string()));
        };

        [("iat", Some(iat)), ("auth_time", self.auth_time)]
            .into_iter()
            .filter_map(|(claim, ts)| ts.map(|ts| (claim, ts)))
            .find(|&(_, ts)| ts > now + CLOCK_SKEW_SECS)
            .map_or(Ok(()), |(claim, _)| {
                Err(IdentityError::Invalid(format!(
                    "{claim} claim is in the future"
                )))
            })
    }

    fn into_profile(self) -> Result<UserProfile, IdentityError> {
        let uid = self
            .user_id
            .filter(|id| !id.is_empty())
            .or(self.sub)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IdentityError::Invalid("missing subject claim".to_string()))?;

        Ok(UserProfile {
            uid,
            name: self.name,
            email: self.email,
            picture: self.picture,
        })
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
