// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// 缓存错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis命令或连接失败
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 缓存值无法序列化/反序列化
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 其他后端错误
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// 键值存储接口
///
/// 所有共享可变状态都通过该接口的原子操作完成，网关进程本身不持有锁。
/// TTL 由存储后端负责过期。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取键的值
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 设置键值并指定过期时间
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// 删除键，返回实际删除的数量
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// 固定窗口计数：原子地增加计数，若键尚无过期时间则设置 `ttl`
    async fn incr_window(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError>;

    /// 原子地增加计数并刷新过期时间
    async fn incr_refresh(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64, CacheError>;

    /// 按 glob 模式（仅支持 `*`）列出键
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// 将 `amount` 从待同步计数原子地转移到已同步计数
    ///
    /// 待同步计数归零时删除该键。返回剩余的待同步计数。
    async fn settle(
        &self,
        pending_key: &str,
        settled_key: &str,
        amount: i64,
        ttl: Duration,
    ) -> Result<i64, CacheError>;

    /// 检查后端是否可用
    async fn ping(&self) -> Result<(), CacheError>;

    /// 关闭连接，进程退出前调用
    async fn close(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
