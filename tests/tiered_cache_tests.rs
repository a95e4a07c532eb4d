//! End-to-end Tests for the Tiered Cache
//!
//! Drives the orchestrator against the in-process remote tier with a manual
//! clock, including injected remote failures.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tiercache::cache::{CacheKey, KeyPart, ManualClock, SetOutcome};
use tiercache::remote::{InMemoryRemote, RemoteStore};
use tiercache::{Config, TieredCache};

// == Helper Functions ==

const START_MS: u64 = 1_700_000_000_000;

struct Harness {
    cache: TieredCache,
    clock: Arc<ManualClock>,
    remote: Arc<InMemoryRemote>,
}

fn harness(config: Config) -> Harness {
    let clock = Arc::new(ManualClock::new(START_MS));
    let remote = Arc::new(InMemoryRemote::with_clock(clock.clone()));
    let cache = TieredCache::with_clock(&config, remote.clone(), clock.clone());
    Harness {
        cache,
        clock,
        remote,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u64,
    total_cents: u64,
    items: Vec<String>,
}

fn sample_order() -> Order {
    Order {
        id: 42,
        total_cents: 1999,
        items: vec!["book".to_string(), "pen".to_string()],
    }
}

// == Scenario Tests ==

#[tokio::test]
async fn test_set_then_get_hits_local_tier() {
    let h = harness(Config::default());

    let outcome = h
        .cache
        .set_json("orders", "42", &sample_order(), Duration::from_secs(300))
        .await
        .unwrap();
    assert_eq!(outcome, SetOutcome::Stored);

    let before = h.cache.stats().local_hits;
    let order: Option<Order> = h.cache.get_json("orders", "42").await.unwrap();

    assert_eq!(order, Some(sample_order()));
    assert_eq!(h.cache.stats().local_hits, before + 1);
    assert_eq!(h.remote.get_calls(), 0);
}

#[tokio::test]
async fn test_expired_key_misses_and_leaves_local_tier() {
    let h = harness(Config::default());

    h.cache
        .set("sessions", "abc", b"token".to_vec(), Duration::from_secs(1))
        .await
        .unwrap();
    assert!(h.cache.local_entry("sessions", "abc").unwrap().is_some());

    h.clock.advance(Duration::from_secs(2));

    assert_eq!(h.cache.get("sessions", "abc").await.unwrap(), None);
    assert!(h.cache.local_entry("sessions", "abc").unwrap().is_none());
    assert_eq!(h.cache.stats().misses, 1);
}

#[tokio::test]
async fn test_recently_read_key_survives_eviction() {
    let max_entries = 5;
    let h = harness(Config {
        max_entries,
        ..Config::default()
    });

    for i in 1..=max_entries {
        h.cache
            .set("lru", &format!("K{i}"), vec![i as u8], Duration::from_secs(300))
            .await
            .unwrap();
        h.clock.advance(Duration::from_millis(10));
    }

    assert!(h.cache.get("lru", "K1").await.unwrap().is_some());
    h.clock.advance(Duration::from_millis(10));

    h.cache
        .set("lru", "K6", vec![6], Duration::from_secs(300))
        .await
        .unwrap();

    assert_eq!(h.cache.local_len(), max_entries);
    assert!(h.cache.local_entry("lru", "K1").unwrap().is_some());
    assert!(h.cache.local_entry("lru", "K2").unwrap().is_none());
    assert_eq!(h.cache.stats().evictions, 1);
}

#[tokio::test]
async fn test_regular_reads_are_predicted() {
    let h = harness(Config::default());

    h.cache
        .set("feed", "X", b"payload".to_vec(), Duration::from_secs(300))
        .await
        .unwrap();

    for i in 0..5 {
        if i > 0 {
            h.clock.advance(Duration::from_secs(10));
        }
        assert!(h.cache.get("feed", "X").await.unwrap().is_some());
    }

    h.clock.advance(Duration::from_secs(5));
    assert!(h
        .cache
        .will_likely_be_accessed("feed", "X", Duration::from_secs(15))
        .unwrap());

    // Fewer than three reads never predict
    h.cache.get("feed", "Y").await.unwrap();
    assert!(!h
        .cache
        .will_likely_be_accessed("feed", "Y", Duration::from_secs(3600))
        .unwrap());
}

#[tokio::test]
async fn test_remote_timeouts_degrade_to_local_only() {
    let h = harness(Config {
        remote_timeout_ms: 20,
        ..Config::default()
    });
    h.remote.set_latency(Some(Duration::from_millis(500)));

    // Miss in both tiers; the remote lookup times out
    assert_eq!(h.cache.get("orders", "42").await.unwrap(), None);

    let outcome = h
        .cache
        .set("orders", "42", b"local".to_vec(), Duration::from_secs(300))
        .await
        .unwrap();
    assert_eq!(outcome, SetOutcome::Degraded);

    assert_eq!(
        h.cache.get("orders", "42").await.unwrap(),
        Some(b"local".to_vec())
    );

    let stats = h.cache.stats();
    assert_eq!(stats.remote_failures, 2);
    assert_eq!(stats.degraded_writes, 1);
    assert_eq!(stats.local_hits, 1);
    assert!(!h.cache.health().await.remote_available);
}

#[tokio::test]
async fn test_invalidate_pattern_clears_both_tiers() {
    let h = harness(Config::default());

    for key in ["42", "423", "5"] {
        h.cache
            .set("orders", key, b"v".to_vec(), Duration::from_secs(300))
            .await
            .unwrap();
    }

    let removed = h.cache.invalidate_pattern("orders", "42*").await.unwrap();
    assert_eq!(removed, 2);

    assert!(!h.remote.contains("orders:42"));
    assert!(!h.remote.contains("orders:423"));
    assert!(h.remote.contains("orders:5"));

    assert_eq!(h.cache.get("orders", "42").await.unwrap(), None);
    assert_eq!(h.cache.get("orders", "423").await.unwrap(), None);
    assert!(h.cache.get("orders", "5").await.unwrap().is_some());
}

#[tokio::test]
async fn test_invalidate_pattern_reaches_hashed_remote_keys() {
    let h = harness(Config::default());
    let long_key = format!("42{}", "x".repeat(300));
    let physical = h.cache.physical_key("orders", &long_key).unwrap();

    h.cache
        .set("orders", &long_key, b"v".to_vec(), Duration::from_secs(300))
        .await
        .unwrap();
    h.cache
        .set("orders", "5", b"v".to_vec(), Duration::from_secs(300))
        .await
        .unwrap();
    assert!(h.remote.contains(&physical));

    let removed = h.cache.invalidate_pattern("orders", "42*").await.unwrap();
    assert_eq!(removed, 1);

    assert!(!h.remote.contains(&physical));
    assert!(h.remote.contains("orders:5"));
    assert_eq!(h.cache.get("orders", &long_key).await.unwrap(), None);
}

#[tokio::test]
async fn test_slow_remote_read_cannot_outlive_invalidation() {
    let h = harness(Config::default());
    h.remote
        .set_with_ttl("orders:42", b"old", Duration::from_secs(300))
        .await
        .unwrap();
    h.remote.set_latency(Some(Duration::from_millis(50)));
    let cache = Arc::new(h.cache);

    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get("orders", "42").await.unwrap() })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let removed = cache.invalidate_pattern("orders", "42*").await.unwrap();
    assert_eq!(removed, 1);
    reader.await.unwrap();

    assert!(!h.remote.contains("orders:42"));
    assert!(cache.local_entry("orders", "42").unwrap().is_none());
    assert_eq!(cache.get("orders", "42").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_respect_bound_and_own_writes() {
    let max_entries = 8;
    let h = harness(Config {
        max_entries,
        ..Config::default()
    });
    let cache = Arc::new(h.cache);

    let mut handles = Vec::new();
    for task in 0..8u8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..50u8 {
                let shared = format!("k{}", (task as usize + round as usize) % 12);
                cache
                    .set("shared", &shared, vec![round], Duration::from_secs(300))
                    .await
                    .unwrap();
                cache.get("shared", &shared).await.unwrap();
                if round % 10 == 0 {
                    cache.delete("shared", &shared).await.unwrap();
                }
                if round % 25 == 0 {
                    cache.invalidate_pattern("shared", "k1*").await.unwrap();
                }

                let own = format!("task{task}");
                cache
                    .set("private", &own, vec![task, round], Duration::from_secs(300))
                    .await
                    .unwrap();
                assert_eq!(
                    cache.get("private", &own).await.unwrap(),
                    Some(vec![task, round])
                );
                assert!(cache.local_len() <= max_entries);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(cache.local_len() <= max_entries);
    let stats = cache.stats();
    assert_eq!(stats.sets, 8 * 50 * 2);
    assert_eq!(stats.local_entries, cache.local_len());
}

// == Property Checks ==

#[tokio::test]
async fn test_remote_hit_is_promoted() {
    let h = harness(Config::default());

    h.remote
        .set_with_ttl("users:u1", b"alice", Duration::from_secs(300))
        .await
        .unwrap();

    assert_eq!(
        h.cache.get("users", "u1").await.unwrap(),
        Some(b"alice".to_vec())
    );
    assert_eq!(
        h.cache.get("users", "u1").await.unwrap(),
        Some(b"alice".to_vec())
    );

    assert_eq!(h.remote.get_calls(), 1);
    let stats = h.cache.stats();
    assert_eq!(stats.remote_hits, 1);
    assert_eq!(stats.local_hits, 1);
    assert_eq!(stats.promotions, 1);
}

#[tokio::test]
async fn test_promotion_uses_local_ttl() {
    let h = harness(Config {
        local_ttl: 10,
        ..Config::default()
    });

    h.remote
        .set_with_ttl("users:u2", b"bob", Duration::from_secs(300))
        .await
        .unwrap();
    h.cache.get("users", "u2").await.unwrap();

    let info = h.cache.local_entry("users", "u2").unwrap().unwrap();
    assert_eq!(info.ttl_remaining_ms, 10_000);

    // Local copy expires first; the remote still has it
    h.clock.advance(Duration::from_secs(11));
    assert!(h.cache.get("users", "u2").await.unwrap().is_some());
    assert_eq!(h.remote.get_calls(), 2);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let h = harness(Config::default());

    h.cache
        .set("orders", "1", b"v".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();

    h.cache.delete("orders", "1").await.unwrap();
    let after_first = h.cache.local_len();
    h.cache.delete("orders", "1").await.unwrap();

    assert_eq!(h.cache.local_len(), after_first);
    assert!(h.remote.is_empty());
    assert_eq!(h.cache.get("orders", "1").await.unwrap(), None);
}

#[tokio::test]
async fn test_long_keys_resolve_to_one_physical_key() {
    let h = harness(Config::default());
    let long_key = "segment/".repeat(40);

    let physical = h.cache.physical_key("reports", &long_key).unwrap();
    assert_eq!(physical, h.cache.physical_key("reports", &long_key).unwrap());
    assert!(physical.starts_with("reports:#"));

    h.cache
        .set("reports", &long_key, b"big".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(h.remote.contains(&physical));
    assert_eq!(
        h.cache.get("reports", &long_key).await.unwrap(),
        Some(b"big".to_vec())
    );

    h.cache.delete("reports", &long_key).await.unwrap();
    assert!(!h.remote.contains(&physical));
}

#[tokio::test]
async fn test_keys_from_parts() {
    let h = harness(Config::default());
    let key = CacheKey::from_parts("orders", &[KeyPart::from(42u64), "eu".into()]).unwrap();
    assert_eq!(key.key(), "42:eu");

    h.cache
        .set_key(&key, b"v".to_vec(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(
        h.cache.get("orders", "42:eu").await.unwrap(),
        Some(b"v".to_vec())
    );
}

#[tokio::test]
async fn test_popular_keys_prefer_recent() {
    let h = harness(Config::default());

    for key in ["old", "new"] {
        h.cache
            .set("p", key, b"v".to_vec(), Duration::from_secs(300))
            .await
            .unwrap();
    }

    h.cache.get("p", "old").await.unwrap();
    h.clock.advance(Duration::from_secs(30));
    h.cache.get("p", "new").await.unwrap();

    let popular = h.cache.popular_keys(2);
    assert_eq!(popular.len(), 2);
    assert_eq!(popular[0].key(), "new");
    assert_eq!(popular[1].key(), "old");
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected() {
    let h = harness(Config::default());

    assert!(h.cache.get("bad:ns", "k").await.is_err());
    assert!(h.cache.get("ns", "").await.is_err());
    assert!(h
        .cache
        .set("ns", "k", b"v".to_vec(), Duration::ZERO)
        .await
        .is_err());
    assert!(h.cache.invalidate_pattern("ns", "").await.is_err());
}
