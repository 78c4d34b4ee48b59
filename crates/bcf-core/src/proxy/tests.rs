//! Pool behavior: selection order, ban semantics, deduplication.

use super::*;
use crate::error::ConfigError;

fn addresses(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn user_pool(list: &[&str]) -> ProxyPool {
    ProxyPool::build(
        ProxySources {
            user: addresses(list),
            ..Default::default()
        },
        false,
    )
    .unwrap()
}

#[test]
fn empty_without_direct_is_a_config_error() {
    let err = ProxyPool::build(ProxySources::default(), false).unwrap_err();
    assert!(matches!(err, ConfigError::NoActiveProxies));

    let pool = ProxyPool::build(ProxySources::default(), true).unwrap();
    assert!(pool.direct_allowed());
    assert_eq!(pool.active_count(), 0);
    assert_eq!(pool.select(), None);
}

#[test]
fn dedup_prefers_supplied_over_public() {
    let pool = ProxyPool::build(
        ProxySources {
            user: addresses(&["http://a:1"]),
            file: addresses(&["http://b:1"]),
            public: addresses(&["http://a:1", "http://c:1"]),
        },
        false,
    )
    .unwrap();
    assert_eq!(pool.active_count(), 3);
    assert_eq!(
        pool.record("http://a:1").unwrap().origin,
        ProxyOrigin::UserSupplied
    );
    assert_eq!(
        pool.record("http://c:1").unwrap().origin,
        ProxyOrigin::PublicPool
    );
}

#[test]
fn select_walks_insertion_order_then_recency() {
    let pool = user_pool(&["http://a:1", "http://b:1", "http://c:1"]);
    for expected in ["http://a:1", "http://b:1", "http://c:1"] {
        let picked = pool.select().unwrap();
        assert_eq!(picked, expected);
        pool.mark_used(&picked);
    }
    // All used once; the least recently used is first again.
    assert_eq!(pool.select().unwrap(), "http://a:1");
    pool.mark_used("http://a:1");
    assert_eq!(pool.select().unwrap(), "http://b:1");
}

#[test]
fn banned_is_never_selected_again() {
    let pool = user_pool(&["http://a:1", "http://b:1"]);
    pool.mark_banned("http://a:1", "rate-limited");
    for _ in 0..10 {
        let picked = pool.select().unwrap();
        assert_ne!(picked, "http://a:1");
        pool.mark_used(&picked);
    }
}

#[test]
fn ban_is_idempotent_one_transition_two_log_entries() {
    let pool = user_pool(&["http://a:1"]);
    assert!(pool.mark_banned("http://a:1", "rate-limited"));
    assert!(!pool.mark_banned("http://a:1", "blocked"));

    let record = pool.record("http://a:1").unwrap();
    assert_eq!(record.status, ProxyStatus::Banned);
    assert_eq!(record.failure_log.len(), 2);
    assert_eq!(record.failure_log[0].reason, "rate-limited");
    assert_eq!(record.failure_log[1].reason, "blocked");

    assert_eq!(pool.select(), None);
}

#[test]
fn usage_count_tracks_selections() {
    let pool = user_pool(&["http://a:1"]);
    assert!(pool.mark_used("http://a:1"));
    assert!(!pool.mark_used("http://a:1"));
    let record = pool.record("http://a:1").unwrap();
    assert_eq!(record.usage_count, 2);
    assert!(record.last_used_at.is_some());
}

#[test]
fn snapshots_stay_ordered_and_disjoint() {
    let pool = user_pool(&["http://a:1", "http://b:1", "http://c:1"]);
    pool.mark_banned("http://b:1", "blocked");
    assert_eq!(pool.snapshot_active(), addresses(&["http://a:1", "http://c:1"]));
    assert_eq!(pool.banned(), addresses(&["http://b:1"]));

    pool.mark_banned("http://c:1", "blocked");
    assert_eq!(pool.banned(), addresses(&["http://b:1", "http://c:1"]));
    assert_eq!(pool.active_count(), 1);
}

#[test]
fn unknown_addresses_are_ignored() {
    let pool = user_pool(&["http://a:1"]);
    assert!(!pool.mark_used("http://nope:1"));
    assert!(!pool.mark_banned("http://nope:1", "whatever"));
    assert!(pool.record("http://nope:1").is_none());
}
