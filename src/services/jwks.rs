// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider signing keys.
//!
//! Each configured provider publishes its RS256 keys as a JWKS document at a
//! fixed URL. Keys are cached for the `Cache-Control: max-age` the provider
//! sends. A token naming an unknown `kid` may trigger a refetch (keys
//! rotate), but at most once per [`FORCED_REFRESH_COOLDOWN`]: the exchange
//! endpoint is public, so anyone can send such tokens.

use crate::services::identity::IdentityError;
use jsonwebtoken::DecodingKey;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Minimum spacing between JWKS fetches not caused by cache expiry.
pub const FORCED_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Outcome of looking a `kid` up in the cache.
#[derive(Clone)]
pub(crate) enum CacheLookup {
    Hit(Arc<DecodingKey>),
    /// Fetch the key set now.
    Refresh,
    /// Keys are current and do not contain this kid; refetch is cooling down.
    Unknown,
    /// No current keys and the last fetch attempt was too recent to retry.
    Unavailable,
}

/// Cached key set for one provider.
#[derive(Default)]
pub(crate) struct KeyCache {
    keys: HashMap<String, Arc<DecodingKey>>,
    expires_at: Option<Instant>,
    last_fetch_attempt: Option<Instant>,
}

impl KeyCache {
    pub(crate) fn lookup(&self, kid: &str, now: Instant) -> CacheLookup {
        let current = self.expires_at.is_some_and(|expires_at| now < expires_at);
        if current {
            if let Some(key) = self.keys.get(kid) {
                return CacheLookup::Hit(key.clone());
            }
        }

        let cooling_down = self
            .last_fetch_attempt
            .is_some_and(|at| now.saturating_duration_since(at) < FORCED_REFRESH_COOLDOWN);

        match (current, cooling_down) {
            (_, false) => CacheLookup::Refresh,
            (true, true) => CacheLookup::Unknown,
            (false, true) => CacheLookup::Unavailable,
        }
    }

    /// Replace the key set. The TTL never drops below the cooldown, or a
    /// `max-age=0` provider would lock every token out between fetches.
    pub(crate) fn store(
        &mut self,
        keys: HashMap<String, Arc<DecodingKey>>,
        now: Instant,
        ttl: Duration,
    ) {
        self.keys = keys;
        self.expires_at = Some(now + ttl.max(FORCED_REFRESH_COOLDOWN));
        self.last_fetch_attempt = Some(now);
    }

    pub(crate) fn record_failed_fetch(&mut self, now: Instant) {
        self.last_fetch_attempt = Some(now);
    }
}

/// Remotely published key set of one identity provider.
pub(crate) struct RemoteKeys {
    jwks_url: String,
    cache: RwLock<KeyCache>,
    fetch_lock: Mutex<()>,
}

impl RemoteKeys {
    pub(crate) fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache: RwLock::new(KeyCache::default()),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Find the decoding key for `kid`, fetching the key set if allowed.
    pub(crate) async fn key_for(
        &self,
        client: &reqwest::Client,
        kid: &str,
    ) -> Result<Arc<DecodingKey>, IdentityError> {
        if let CacheLookup::Hit(key) = self.cache.read().await.lookup(kid, Instant::now()) {
            return Ok(key);
        }

        // One fetch at a time; whoever waited here re-checks what it stored.
        let _fetching = self.fetch_lock.lock().await;

        match self.cache.read().await.lookup(kid, Instant::now()) {
            CacheLookup::Hit(key) => return Ok(key),
            CacheLookup::Unknown => return Err(unknown_kid(kid)),
            CacheLookup::Unavailable => {
                return Err(IdentityError::Transient(
                    "provider signing keys unavailable, retry later".to_string(),
                ))
            }
            CacheLookup::Refresh => {}
        }

        let fetched = fetch_jwks(client, &self.jwks_url).await;

        let mut cache = self.cache.write().await;
        let now = Instant::now();
        match fetched {
            Ok((keys, ttl)) => {
                tracing::debug!(
                    jwks_url = %self.jwks_url,
                    keys = keys.len(),
                    ttl_secs = ttl.as_secs(),
                    "Identity provider signing keys refreshed"
                );
                cache.store(keys, now, ttl);
            }
            Err(e) => {
                cache.record_failed_fetch(now);
                return Err(e);
            }
        }

        match cache.lookup(kid, now) {
            CacheLookup::Hit(key) => Ok(key),
            _ => Err(unknown_kid(kid)),
        }
    }
}

fn unknown_kid(kid: &str) -> IdentityError {
    IdentityError::Invalid(format!("JWT kid not among provider signing keys: {kid}"))
}

async fn fetch_jwks(
    client: &reqwest::Client,
    url: &str,
) -> Result<(HashMap<String, Arc<DecodingKey>>, Duration), IdentityError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| IdentityError::Transient(format!("JWKS request failed: {e}")))?;

    let ttl = response
        .headers()
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(max_age)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CACHE_TTL);

    let jwks: Jwks = response
        .json()
        .await
        .map_err(|e| IdentityError::Transient(format!("invalid JWKS JSON: {e}")))?;

    let keys: HashMap<_, _> = jwks.keys.into_iter().filter_map(Jwk::into_rs256_key).collect();
    if keys.is_empty() {
        return Err(IdentityError::Transient(
            "JWKS response did not include any usable RSA keys".to_string(),
        ));
    }

    Ok((keys, ttl))
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    /// RSA signing keys for RS256 only; anything else is skipped.
    fn into_rs256_key(self) -> Option<(String, Arc<DecodingKey>)> {
        let usable = self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && self.alg.as_deref().map_or(true, |alg| alg == "RS256")
            && self.use_.as_deref().map_or(true, |use_| use_ == "sig");
        if !usable {
            return None;
        }

        match DecodingKey::from_rsa_components(&self.n, &self.e) {
            Ok(key) => Some((self.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(error = %e, kid = %self.kid, "Skipping malformed RSA JWK");
                None
            }
        }
    }
}

/// `max-age` directive of a `Cache-Control` value, in seconds.
fn max_age(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().split_once('='))
        .find(|(name, _)| name.eq_ignore_ascii_case("max-age"))
        .and_then(|(_, secs)| secs.trim_matches('"').parse().ok())
}
