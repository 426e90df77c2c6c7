// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::settings::RateLimitingSettings;
use crate::domain::models::route::RateLimitClass;
use crate::domain::services::rate_limiting_service::{
    RateLimitDecision, RateLimitingError, RateLimitingService,
};
use crate::infrastructure::cache::cache_keys;
use crate::infrastructure::cache::cache_store::CacheStore;

/// 固定窗口限流服务实现
///
/// 每个 (分类, 标识) 一个计数键，首次计数时设置窗口过期时间，窗口内不再刷新。
pub struct RateLimitingServiceImpl {
    store: Arc<dyn CacheStore>,
    config: RateLimitingSettings,
}

impl RateLimitingServiceImpl {
    pub fn new(store: Arc<dyn CacheStore>, config: RateLimitingSettings) -> Self {
        Self { store, config }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }
}

#[async_trait]
impl RateLimitingService for RateLimitingServiceImpl {
    async fn check_rate_limit(
        &self,
        class: RateLimitClass,
        identifier: &str,
    ) -> Result<RateLimitDecision, RateLimitingError> {
        let limit = self.limit_for(class);
        let key = cache_keys::rate_key(class, identifier);
        let count = self.store.incr_window(&key, 1, self.window()).await?;
        Ok(RateLimitDecision::from_count(count.max(0) as u64, limit))
    }

    fn limit_for(&self, class: RateLimitClass) -> u32 {
        match class {
            RateLimitClass::Public => self.config.public_limit,
            RateLimitClass::Protected => self.config.protected_limit,
            RateLimitClass::Unprotected => self.config.unprotected_limit,
            RateLimitClass::Auth => self.config.auth_limit,
        }
    }
}
