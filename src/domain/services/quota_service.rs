// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::quota::{Plan, QuotaDecision};
use crate::infrastructure::cache::cache_store::CacheError;

/// 配额错误类型
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),
}

/// 每月事件配额服务接口
#[async_trait]
pub trait EventsQuotaService: Send + Sync {
    /// 检查 `n` 个事件是否在套餐上限内，允许时累加待同步计数
    async fn check_and_increment(
        &self,
        user_id: &str,
        plan: Plan,
        n: u64,
    ) -> Result<QuotaDecision, QuotaError>;

    /// 当月用量（待同步 + 已同步）
    async fn current_usage(&self, user_id: &str, month_year: &str) -> Result<u64, QuotaError>;

    /// 列出某月所有非零的待同步计数
    async fn pending_counts(&self, month_year: &str) -> Result<Vec<(String, u64)>, QuotaError>;

    /// 将已确认的数量从待同步转移到已同步，返回剩余待同步计数
    async fn settle(&self, user_id: &str, month_year: &str, amount: u64)
        -> Result<u64, QuotaError>;
}
