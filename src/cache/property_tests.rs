//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the cache's correctness properties.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};

use super::envelope::{Envelope, Opened};
use crate::cache::Cache;
use crate::config::with_clean_window;
use crate::error::CacheError;

// == Test Configuration ==
const TEST_LIFE_MINUTES: u64 = 5;
const LONG_TTL: Duration = Duration::from_secs(3600);

// == Helpers ==
/// Cache without a sweep, so it can be built outside a runtime
fn test_cache() -> Cache {
    Cache::new(TEST_LIFE_MINUTES, [with_clean_window(Duration::ZERO)]).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// == Strategies ==
/// Generates valid cache keys (non-empty)
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}".prop_map(|s| s)
}

/// Generates non-empty binary payloads, including ones that look like JSON
fn valid_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 1..256),
        "\\{[a-z\":0-9,]{0,32}\\}".prop_map(String::into_bytes),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Vec<u8> },
    SetEx { key: String, value: Vec<u8> },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_payload_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        (valid_key_strategy(), valid_payload_strategy())
            .prop_map(|(key, value)| CacheOp::SetEx { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Round-trip: a plain write reads back unchanged, whatever the bytes.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_payload_strategy()) {
        runtime().block_on(async {
            let cache = test_cache();
            cache.set(&key, value.clone()).await.unwrap();

            let retrieved = cache.get(&key).await.unwrap();
            prop_assert_eq!(retrieved, value, "Round-trip value mismatch");
            prop_assert!(cache.has(&key).await);
            Ok(())
        })?;
    }

    // A write with a TTL reads back unwrapped before it expires.
    #[test]
    fn prop_set_ex_roundtrip(key in valid_key_strategy(), value in valid_payload_strategy()) {
        runtime().block_on(async {
            let cache = test_cache();
            cache.set_ex(&key, value.clone(), LONG_TTL).await.unwrap();

            let retrieved = cache.get(&key).await.unwrap();
            prop_assert_eq!(retrieved, value, "TTL round-trip value mismatch");
            Ok(())
        })?;
    }

    // Overwrite semantics: the last write wins, with or without a TTL.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_payload_strategy(),
        value2 in valid_payload_strategy(),
        first_with_ttl in any::<bool>()
    ) {
        runtime().block_on(async {
            let cache = test_cache();
            if first_with_ttl {
                cache.set_ex(&key, value1, LONG_TTL).await.unwrap();
            } else {
                cache.set(&key, value1).await.unwrap();
            }
            cache.set(&key, value2.clone()).await.unwrap();

            prop_assert_eq!(cache.get(&key).await.unwrap(), value2);
            prop_assert_eq!(cache.len().await.unwrap(), 1);
            Ok(())
        })?;
    }

    // Delete removes the entry and Has agrees.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_payload_strategy()) {
        runtime().block_on(async {
            let cache = test_cache();
            prop_assert!(!cache.has(&key).await, "Key should not exist before write");

            cache.set(&key, value).await.unwrap();
            prop_assert!(cache.has(&key).await, "Key should exist after write");

            cache.delete(&key).await.unwrap();
            prop_assert!(!cache.has(&key).await, "Key should not exist after delete");
            prop_assert!(matches!(cache.get(&key).await, Err(CacheError::KeyNotFound)));
            Ok(())
        })?;
    }

    // Empty keys fail with KeyEmpty, open or closed.
    #[test]
    fn prop_empty_key_always_rejected(value in valid_payload_strategy(), closed in any::<bool>()) {
        runtime().block_on(async {
            let cache = test_cache();
            if closed {
                cache.close().await;
            }

            prop_assert!(matches!(cache.get("").await, Err(CacheError::KeyEmpty)));
            prop_assert!(matches!(cache.set("", value.clone()).await, Err(CacheError::KeyEmpty)));
            prop_assert!(matches!(cache.set_ex("", value, LONG_TTL).await, Err(CacheError::KeyEmpty)));
            prop_assert!(matches!(cache.delete("").await, Err(CacheError::KeyEmpty)));
            Ok(())
        })?;
    }

    // An empty payload is rejected and never touches the key.
    #[test]
    fn prop_empty_value_has_no_side_effect(
        key in valid_key_strategy(),
        existing in proptest::option::of(valid_payload_strategy())
    ) {
        runtime().block_on(async {
            let cache = test_cache();
            if let Some(value) = &existing {
                cache.set(&key, value.clone()).await.unwrap();
            }

            prop_assert!(matches!(cache.set(&key, Vec::<u8>::new()).await, Err(CacheError::ValueEmpty)));
            prop_assert!(matches!(
                cache.set_ex(&key, Vec::<u8>::new(), LONG_TTL).await,
                Err(CacheError::ValueEmpty)
            ));

            match existing {
                Some(value) => prop_assert_eq!(cache.get(&key).await.unwrap(), value),
                None => prop_assert!(!cache.has(&key).await),
            }
            Ok(())
        })?;
    }

    // Statistics: hits and misses match the outcome of every read.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        runtime().block_on(async {
            let cache = test_cache();
            let mut expected_hits: u64 = 0;
            let mut expected_misses: u64 = 0;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, value).await.unwrap();
                    }
                    CacheOp::SetEx { key, value } => {
                        cache.set_ex(&key, value, LONG_TTL).await.unwrap();
                    }
                    CacheOp::Get { key } => match cache.get(&key).await {
                        Ok(_) => expected_hits += 1,
                        Err(_) => expected_misses += 1,
                    },
                    CacheOp::Delete { key } => {
                        let _ = cache.delete(&key).await;
                    }
                }
            }

            let stats = cache.stats().await.unwrap();
            prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
            prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
            prop_assert_eq!(stats.total_entries, cache.len().await.unwrap(), "Total entries mismatch");
            Ok(())
        })?;
    }

    // Expiry boundary: live strictly before expires_at, expired from it on.
    #[test]
    fn prop_envelope_expiry_boundary(
        value in valid_payload_strategy(),
        ttl_ms in 1u64..86_400_000
    ) {
        let written = Utc::now();
        let envelope = Envelope::new(value.clone(), Duration::from_millis(ttl_ms), written).unwrap();
        let expires_at = envelope.expires_at;
        let sealed = envelope.seal().unwrap();

        let just_before = expires_at - TimeDelta::milliseconds(1);
        prop_assert_eq!(Envelope::open(sealed.clone(), just_before), Opened::Live(value));
        prop_assert_eq!(Envelope::open(sealed, expires_at), Opened::Expired);
    }
}

// == Property Test for Concurrent Operation Correctness ==

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent writers and readers on disjoint keys: every completed read
    // returns a value fully written for that key, or KeyNotFound.
    #[test]
    fn prop_concurrent_operation_correctness(
        entries in prop::collection::hash_map(
            valid_key_strategy(),
            prop::collection::vec(valid_payload_strategy(), 1..5),
            1..16
        ),
        readers_per_key in 1usize..4
    ) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let cache = Arc::new(test_cache());
            let entries: Arc<HashMap<String, Vec<Vec<u8>>>> = Arc::new(entries);
            let mut handles = vec![];

            for (key, values) in entries.iter() {
                let writer_cache = Arc::clone(&cache);
                let key_clone = key.clone();
                let values_clone = values.clone();
                handles.push(tokio::spawn(async move {
                    for (i, value) in values_clone.into_iter().enumerate() {
                        if i % 2 == 0 {
                            writer_cache.set(&key_clone, value).await.map_err(|e| e.to_string())?;
                        } else {
                            writer_cache
                                .set_ex(&key_clone, value, LONG_TTL)
                                .await
                                .map_err(|e| e.to_string())?;
                        }
                        tokio::task::yield_now().await;
                    }
                    Ok::<_, String>(())
                }));

                for _ in 0..readers_per_key {
                    let reader_cache = Arc::clone(&cache);
                    let reader_entries = Arc::clone(&entries);
                    let key_clone = key.clone();
                    handles.push(tokio::spawn(async move {
                        for _ in 0..8 {
                            match reader_cache.get(&key_clone).await {
                                Ok(value) => {
                                    if !reader_entries[&key_clone].contains(&value) {
                                        return Err(format!(
                                            "Read a value never written for '{}'",
                                            key_clone
                                        ));
                                    }
                                }
                                Err(CacheError::KeyNotFound) => {}
                                Err(other) => return Err(other.to_string()),
                            }
                            tokio::task::yield_now().await;
                        }
                        Ok(())
                    }));
                }
            }

            for handle in handles {
                let result = handle.await.expect("Task should not panic");
                prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
            }

            // Every key ends on its last written value
            for (key, values) in entries.iter() {
                let last = values.last().unwrap();
                prop_assert_eq!(&cache.get(key).await.unwrap(), last);
            }
            prop_assert_eq!(cache.len().await.unwrap(), entries.len());
            Ok(())
        })?;
    }
}
