// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use tokio::time::Instant;

use crate::infrastructure::cache::cache_store::{CacheError, CacheStore};

/// 缓存条目
#[derive(Clone, Debug)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// 内存键值存储
///
/// 与 Redis 后端语义一致的进程内实现，用于测试和本地开发。
/// 单个键上的操作通过 `DashMap` 分片锁保持原子性。
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 键的剩余存活时间，键不存在或无过期时间时返回 None
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries.get(key).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                entry.expires_at.map(|at| at.saturating_duration_since(now))
            }
        })
    }

    /// 当前未过期的键数量
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn parse_counter(entry: Option<&MemoryEntry>) -> Result<i64, CacheError> {
        match entry {
            Some(e) => e
                .value
                .parse::<i64>()
                .map_err(|_| CacheError::Backend("value is not an integer".to_string())),
            None => Ok(0),
        }
    }
}

/// 将 glob 模式转换为正则表达式（仅支持 `*`）
fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let escaped = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", escaped)).map_err(|e| CacheError::Backend(e.to_string()))
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let value = self
            .entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone());
        if value.is_none() {
            self.entries.remove_if(key, |_, e| e.is_expired(now));
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            if let Some((_, entry)) = self.entries.remove(key) {
                if !entry.is_expired(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn incr_window(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert(MemoryEntry {
            value: "0".to_string(),
            expires_at: None,
        });
        if entry.is_expired(now) {
            entry.value = "0".to_string();
            entry.expires_at = None;
        }
        let current = Self::parse_counter(Some(&*entry))? + delta;
        entry.value = current.to_string();
        if entry.expires_at.is_none() {
            entry.expires_at = Some(now + ttl);
        }
        Ok(current)
    }

    async fn incr_refresh(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert(MemoryEntry {
            value: "0".to_string(),
            expires_at: None,
        });
        if entry.is_expired(now) {
            entry.value = "0".to_string();
        }
        let current = Self::parse_counter(Some(&*entry))? + delta;
        entry.value = current.to_string();
        entry.expires_at = Some(now + ttl);
        Ok(current)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_expired(now) && matcher.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn settle(
        &self,
        pending_key: &str,
        settled_key: &str,
        amount: i64,
        ttl: Duration,
    ) -> Result<i64, CacheError> {
        let now = Instant::now();
        let remaining = {
            let mut pending = self
                .entries
                .entry(pending_key.to_string())
                .or_insert(MemoryEntry {
                    value: "0".to_string(),
                    expires_at: None,
                });
            if pending.is_expired(now) {
                pending.value = "0".to_string();
            }
            let remaining = Self::parse_counter(Some(&*pending))? - amount;
            pending.value = remaining.to_string();
            remaining
        };
        if remaining <= 0 {
            self.entries.remove(pending_key);
        }

        let mut settled = self
            .entries
            .entry(settled_key.to_string())
            .or_insert(MemoryEntry {
                value: "0".to_string(),
                expires_at: None,
            });
        if settled.is_expired(now) {
            settled.value = "0".to_string();
        }
        let total = Self::parse_counter(Some(&*settled))? + amount;
        settled.value = total.to_string();
        settled.expires_at = Some(now + ttl);

        Ok(remaining.max(0))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
