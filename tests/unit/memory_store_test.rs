// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存存储与 Redis 存储共享的原子操作约定

use std::sync::Arc;
use std::time::Duration;

use gatewayrs::infrastructure::cache::cache_store::CacheStore;
use gatewayrs::infrastructure::cache::memory_store::MemoryCacheStore;

#[tokio::test]
async fn window_counter_keeps_first_expiry() {
    let store = MemoryCacheStore::new();
    assert_eq!(
        store.incr_window("rate:public:a", 1, Duration::from_secs(60)).await.unwrap(),
        1
    );
    assert_eq!(
        store.incr_window("rate:public:a", 1, Duration::from_secs(3600)).await.unwrap(),
        2
    );
    let ttl = store.ttl("rate:public:a").unwrap();
    assert!(ttl <= Duration::from_secs(60));
}

#[tokio::test]
async fn concurrent_window_increments_are_not_lost() {
    let store = Arc::new(MemoryCacheStore::new());
    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .incr_window("rate:protected:u1", 1, Duration::from_secs(60))
                .await
                .unwrap()
        }));
    }
    let mut seen: Vec<i64> = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (1..=50).collect::<Vec<i64>>());
}

#[tokio::test]
async fn settle_moves_amount_and_keeps_concurrent_increments() {
    let store = MemoryCacheStore::new();
    let ttl = Duration::from_secs(3600);
    store.incr_refresh("events:user:u1:2026-10", 10, ttl).await.unwrap();

    // 10 个已上报，期间又新增 3 个
    store.incr_refresh("events:user:u1:2026-10", 3, ttl).await.unwrap();
    let remaining = store
        .settle("events:user:u1:2026-10", "events:synced:u1:2026-10", 10, ttl)
        .await
        .unwrap();

    assert_eq!(remaining, 3);
    assert_eq!(
        store.get("events:synced:u1:2026-10").await.unwrap(),
        Some("10".to_string())
    );
}

#[tokio::test]
async fn settle_to_zero_removes_pending_key() {
    let store = MemoryCacheStore::new();
    let ttl = Duration::from_secs(3600);
    store.incr_refresh("events:user:u2:2026-10", 5, ttl).await.unwrap();
    let remaining = store
        .settle("events:user:u2:2026-10", "events:synced:u2:2026-10", 5, ttl)
        .await
        .unwrap();

    assert_eq!(remaining, 0);
    assert_eq!(store.get("events:user:u2:2026-10").await.unwrap(), None);
}

#[tokio::test]
async fn scan_matches_glob_pattern() {
    let store = MemoryCacheStore::new();
    let ttl = Duration::from_secs(60);
    store.set("events:user:a:2026-10", "1", ttl).await.unwrap();
    store.set("events:user:b:2026-10", "2", ttl).await.unwrap();
    store.set("events:user:a:2026-09", "3", ttl).await.unwrap();
    store.set("events:synced:a:2026-10", "4", ttl).await.unwrap();

    let mut keys = store.scan("events:user:*:2026-10").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["events:user:a:2026-10", "events:user:b:2026-10"]);
}

#[tokio::test]
async fn expired_entries_are_invisible() {
    let store = MemoryCacheStore::new();
    store
        .set("validation:short", "{}", Duration::from_millis(20))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(store.get("validation:short").await.unwrap(), None);
}
