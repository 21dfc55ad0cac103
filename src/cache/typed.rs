//! Typed Facade
//!
//! Text, raw-byte, and JSON convenience operations. Every read goes through
//! the expiration overlay's [`Cache::get`], so per-key TTLs apply to typed
//! values as well.

use std::borrow::Cow;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Cache;
use crate::error::{CacheError, Result};

// == Value ==
/// A value in one of the shapes the cache knows how to store.
///
/// Text is stored as its UTF-8 bytes, raw bytes as-is, and structured
/// values as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Json(serde_json::Value),
}

/// Which shape a stored value should be read back as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Bytes,
    Json,
}

impl Value<'_> {
    /// Converts any serializable value into [`Value::Json`].
    ///
    /// # Errors
    /// `Serialization` if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Value<'static>> {
        serde_json::to_value(value)
            .map(Value::Json)
            .map_err(CacheError::marshal)
    }

    /// Returns the kind this value would be read back as.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Json(_) => ValueKind::Json,
        }
    }

    fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Value::Text(text) => Ok(text.into_owned().into_bytes()),
            Value::Bytes(bytes) => Ok(bytes.into_owned()),
            Value::Json(json) => serde_json::to_vec(&json).map_err(CacheError::marshal),
        }
    }

    fn from_stored(bytes: Vec<u8>, kind: ValueKind) -> Result<Value<'static>> {
        match kind {
            ValueKind::Text => Ok(Value::Text(Cow::Owned(String::from_utf8(bytes)?))),
            ValueKind::Bytes => Ok(Value::Bytes(Cow::Owned(bytes))),
            ValueKind::Json => serde_json::from_slice(&bytes)
                .map(Value::Json)
                .map_err(CacheError::unmarshal),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(text: &'a str) -> Self {
        Value::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::Text(Cow::Owned(text))
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for Value<'_> {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(bytes))
    }
}

impl From<serde_json::Value> for Value<'_> {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl Cache {
    // == Text ==
    /// Stores `value` as UTF-8 bytes.
    pub async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value).await
    }

    /// Stores `value` as UTF-8 bytes, visible for `ttl`.
    pub async fn set_ex_string(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.set_ex(key, value, ttl).await
    }

    /// Reads the value under `key` as text.
    ///
    /// # Errors
    /// Anything [`get`](Cache::get) returns, or `InvalidUtf8`.
    pub async fn get_string(&self, key: &str) -> Result<String> {
        Ok(String::from_utf8(self.get(key).await?)?)
    }

    // == Value ==
    /// Stores a value according to its shape.
    pub async fn set_value<'a>(&self, key: &str, value: impl Into<Value<'a>>) -> Result<()> {
        let bytes = value.into().into_bytes()?;
        self.set(key, bytes).await
    }

    /// Stores a value according to its shape, visible for `ttl`.
    pub async fn set_ex_value<'a>(
        &self,
        key: &str,
        value: impl Into<Value<'a>>,
        ttl: Duration,
    ) -> Result<()> {
        let bytes = value.into().into_bytes()?;
        self.set_ex(key, bytes, ttl).await
    }

    /// Reads the value under `key` back as `kind`.
    ///
    /// # Errors
    /// Anything [`get`](Cache::get) returns, `InvalidUtf8` for text, or
    /// `Serialization` for JSON.
    pub async fn get_value(&self, key: &str, kind: ValueKind) -> Result<Value<'static>> {
        Value::from_stored(self.get(key).await?, kind)
    }

    // == JSON ==
    /// Serializes `value` to JSON and stores it.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set_value(key, Value::json(value)?).await
    }

    /// Serializes `value` to JSON and stores it, visible for `ttl`.
    pub async fn set_ex_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.set_ex_value(key, Value::json(value)?, ttl).await
    }

    /// Reads the value under `key` and deserializes it from JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let bytes = self.get(key).await?;
        serde_json::from_slice(&bytes).map_err(CacheError::unmarshal)
    }
}
