// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use crate::infrastructure::cache::cache_store::{CacheError, CacheStore};

// INCRBY, then attach the window TTL if the key has none yet.
static WINDOW_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local current = redis.call("INCRBY", KEYS[1], ARGV[1])
        if redis.call("TTL", KEYS[1]) < 0 then
            redis.call("EXPIRE", KEYS[1], ARGV[2])
        end
        return current
    "#,
    )
});

// Move a confirmed amount from the pending counter to the settled counter.
static SETTLE_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
        local amount = tonumber(ARGV[1])
        local remaining = redis.call("DECRBY", KEYS[1], amount)
        redis.call("INCRBY", KEYS[2], amount)
        redis.call("EXPIRE", KEYS[2], ARGV[2])
        if remaining <= 0 then
            redis.call("DEL", KEYS[1])
        end
        return remaining
    "#,
    )
});

const SCAN_BATCH: usize = 200;

/// Redis客户端
///
/// 启动时建立一条多路复用连接，所有请求任务共享其克隆
#[derive(Clone)]
pub struct RedisClient {
    /// 多路复用连接
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// 连接Redis
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(CacheError)` - URL无效或连接失败
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis");
        Ok(Self { connection })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

#[async_trait]
impl CacheStore for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut con = self.conn();
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut con = self.conn();
        con.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut con = self.conn();
        let removed: u64 = con.del(keys).await?;
        Ok(removed)
    }

    async fn incr_window(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError> {
        let mut con = self.conn();
        let value: i64 = WINDOW_SCRIPT
            .key(key)
            .arg(delta)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut con)
            .await?;
        Ok(value)
    }

    async fn incr_refresh(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError> {
        let mut con = self.conn();
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, delta)
            .expire(key, ttl.as_secs().max(1) as i64)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(value)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut con = self.conn();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut con)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn settle(
        &self,
        pending_key: &str,
        settled_key: &str,
        amount: i64,
        ttl: Duration,
    ) -> Result<i64, CacheError> {
        let mut con = self.conn();
        let remaining: i64 = SETTLE_SCRIPT
            .key(pending_key)
            .key(settled_key)
            .arg(amount)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut con)
            .await?;
        Ok(remaining.max(0))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut con = self.conn();
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        // 多路复用连接在最后一个句柄释放时断开，这里只确认没有未完成的写入
        self.ping().await
    }
}
