//! Signing key derivation.
//!
//! The chain is `HMAC("AWS4" + secret, date) -> region -> service ->
//! "aws4_request"`. Every intermediate key is the raw 32-byte HMAC output of
//! the previous step, never its hex text. Each step has its own type so the
//! chain can only be walked in order.

use crate::constants::{AWS4_REQUEST, AWS4_SECRET_PREFIX};
use chrono::{Days, NaiveTime};
use loadreport_core::hash::{hmac_sha256, sha256, HexDigest, RawDigest, SHA256_OUTPUT_LEN};
use loadreport_core::time::DateTime;
use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;

/// `HMAC("AWS4" + secret, date_stamp)`
#[derive(Debug, Clone, Copy)]
pub struct DateKey(RawDigest);

/// `HMAC(date_key, region)`
#[derive(Debug, Clone, Copy)]
pub struct RegionKey(RawDigest);

/// `HMAC(region_key, service)`
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey(RawDigest);

/// `HMAC(service_key, "aws4_request")`, the key that signs the string to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningKey(RawDigest);

impl DateKey {
    /// First step of the chain.
    pub fn new(secret_access_key: &str, date_stamp: &str) -> Self {
        let mut key = String::with_capacity(AWS4_SECRET_PREFIX.len() + secret_access_key.len());
        key.push_str(AWS4_SECRET_PREFIX);
        key.push_str(secret_access_key);
        Self(hmac_sha256(key.as_bytes(), date_stamp.as_bytes()))
    }

    /// Scope to a region.
    pub fn region(self, region: &str) -> RegionKey {
        RegionKey(hmac_sha256(self.0.as_ref(), region.as_bytes()))
    }
}

impl RegionKey {
    /// Scope to a service.
    pub fn service(self, service: &str) -> ServiceKey {
        ServiceKey(hmac_sha256(self.0.as_ref(), service.as_bytes()))
    }
}

impl ServiceKey {
    /// Terminate the chain.
    pub fn signing_key(self) -> SigningKey {
        SigningKey(hmac_sha256(self.0.as_ref(), AWS4_REQUEST.as_bytes()))
    }
}

impl SigningKey {
    /// Walk the full chain for one credential scope.
    pub fn derive(secret_access_key: &str, date_stamp: &str, region: &str, service: &str) -> Self {
        DateKey::new(secret_access_key, date_stamp)
            .region(region)
            .service(service)
            .signing_key()
    }

    /// Sign a string to sign.
    ///
    /// The signature is the lowercase hex of the raw HMAC output.
    pub fn sign(&self, string_to_sign: &str) -> HexDigest {
        hmac_sha256(self.0.as_ref(), string_to_sign.as_bytes()).to_hex()
    }

    /// Borrow the raw key bytes.
    pub fn as_raw(&self) -> &RawDigest {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    // The secret itself is never stored, only its digest.
    secret_digest: [u8; SHA256_OUTPUT_LEN],
    date_stamp: String,
    region: String,
    service: String,
}

#[derive(Debug, Clone, Copy)]
struct CachedKey {
    key: SigningKey,
    expires_at: DateTime,
}

/// Cache of derived signing keys, shared by every signer that is handed the
/// same instance.
///
/// A key depends only on `(secret, date, region, service)` and is valid for
/// that UTC day, so entries expire at the next UTC midnight after they were
/// derived. Safe to use from concurrent signers.
#[derive(Debug, Default)]
pub struct SigningKeyCache {
    entries: Mutex<HashMap<CacheKey, CachedKey>>,
}

impl SigningKeyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached key for this scope or derive and remember it.
    ///
    /// `now` decides expiry; expired entries are dropped on every call.
    pub fn get_or_derive(
        &self,
        secret_access_key: &str,
        date_stamp: &str,
        region: &str,
        service: &str,
        now: DateTime,
    ) -> SigningKey {
        let cache_key = CacheKey {
            secret_digest: *sha256(secret_access_key.as_bytes()).as_bytes(),
            date_stamp: date_stamp.to_string(),
            region: region.to_string(),
            service: service.to_string(),
        };

        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.retain(|_, v| v.expires_at > now);

        if let Some(cached) = entries.get(&cache_key) {
            return cached.key;
        }

        debug!("derive signing key for scope {date_stamp}/{region}/{service}");
        let key = SigningKey::derive(secret_access_key, date_stamp, region, service);
        entries.insert(
            cache_key,
            CachedKey {
                key,
                expires_at: next_utc_midnight(now),
            },
        );
        key
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock poisoned").len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn next_utc_midnight(now: DateTime) -> DateTime {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(now.date_naive());
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}
