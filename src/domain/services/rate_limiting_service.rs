// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::route::RateLimitClass;
use crate::infrastructure::cache::cache_store::CacheError;

/// 限流结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// 是否允许通过
    pub allowed: bool,
    /// 当前窗口内的计数（包含本次）
    pub current: u64,
    /// 该分类的上限
    pub limit: u32,
    /// 剩余可用次数
    pub remaining: u32,
}

impl RateLimitDecision {
    /// 根据计数与上限构造结果
    pub fn from_count(current: u64, limit: u32) -> Self {
        Self {
            allowed: current <= u64::from(limit),
            current,
            limit,
            remaining: u64::from(limit).saturating_sub(current) as u32,
        }
    }

    /// 计数失败时放行
    pub fn fail_open(limit: u32) -> Self {
        Self {
            allowed: true,
            current: 0,
            limit,
            remaining: limit,
        }
    }
}

/// 固定窗口限流服务接口
#[async_trait]
pub trait RateLimitingService: Send + Sync {
    /// 为 (分类, 标识) 计数一次并判断是否超限
    async fn check_rate_limit(
        &self,
        class: RateLimitClass,
        identifier: &str,
    ) -> Result<RateLimitDecision, RateLimitingError>;

    /// 分类对应的上限
    fn limit_for(&self, class: RateLimitClass) -> u32;
}

/// 限流错误类型
#[derive(Debug, thiserror::Error)]
pub enum RateLimitingError {
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),
}
