//! Expiring Envelope
//!
//! Wire format for values written with a per-key TTL:
//! `{"value": "<base64>", "expires_at": "<RFC3339>"}`.
//!
//! The engine stores envelopes and plain values side by side, so every read
//! tries to open the stored bytes as an envelope first. Anything that does
//! not parse as exactly this shape is a plain value. A plain value that
//! happens to be a well-formed envelope document will be read as one; there
//! is no type tag.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// A payload paired with the instant it stops being visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Envelope {
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

/// What a stored value turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Opened {
    /// Not an envelope; the bytes as stored
    Plain(Vec<u8>),
    /// An envelope still within its TTL; the inner payload
    Live(Vec<u8>),
    /// An envelope whose TTL has passed
    Expired,
}

impl Envelope {
    /// Wraps `value` so that it expires `ttl` after `now`.
    ///
    /// A zero `ttl` yields an envelope that is already expired.
    pub fn new(value: Vec<u8>, ttl: Duration, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(CacheError::InvalidTtl(ttl))?;

        Ok(Self { value, expires_at })
    }

    /// Serializes the envelope for storage.
    pub fn seal(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(CacheError::marshal)
    }

    /// Classifies stored bytes as of `now`.
    ///
    /// An envelope is expired once `now >= expires_at`.
    pub fn open(raw: Vec<u8>, now: DateTime<Utc>) -> Opened {
        // Sealed envelopes always start with an object brace.
        if raw.first() != Some(&b'{') {
            return Opened::Plain(raw);
        }

        match serde_json::from_slice::<Envelope>(&raw) {
            Ok(envelope) if now >= envelope.expires_at => Opened::Expired,
            Ok(envelope) => Opened::Live(envelope.value),
            Err(_) => Opened::Plain(raw),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(de::Error::custom)
    }
}
