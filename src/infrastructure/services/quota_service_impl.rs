// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use tracing::debug;

use crate::domain::models::quota::{month_year, Plan, PlanLimits, QuotaDecision};
use crate::domain::services::quota_service::{EventsQuotaService, QuotaError};
use crate::infrastructure::cache::cache_keys;
use crate::infrastructure::cache::cache_store::CacheStore;

/// 事件计数键的保留时间（35天）
pub const EVENTS_COUNTER_TTL: Duration = Duration::from_secs(35 * 24 * 60 * 60);

/// 每月事件配额服务实现
///
/// 当月用量 = 待同步计数 + 已同步计数。并发准入可能略微超过软上限。
pub struct EventsQuotaServiceImpl {
    store: Arc<dyn CacheStore>,
    limits: PlanLimits,
}

impl EventsQuotaServiceImpl {
    pub fn new(store: Arc<dyn CacheStore>, limits: PlanLimits) -> Self {
        Self { store, limits }
    }

    async fn read_counter(&self, key: &str) -> Result<u64, QuotaError> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(|v| v.max(0) as u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl EventsQuotaService for EventsQuotaServiceImpl {
    async fn check_and_increment(
        &self,
        user_id: &str,
        plan: Plan,
        n: u64,
    ) -> Result<QuotaDecision, QuotaError> {
        let now = Utc::now();
        let month = month_year(now);
        let limit = self.limits.limit_for(plan);
        let used = self.current_usage(user_id, &month).await?;

        if used.saturating_add(n) > limit {
            counter!("gateway_quota_rejections_total", "plan" => plan.to_string()).increment(1);
            return Ok(QuotaDecision {
                allowed: false,
                current: used,
                limit,
                plan,
            });
        }

        let pending_key = cache_keys::events_key(user_id, &month);
        self.store
            .incr_refresh(&pending_key, n as i64, EVENTS_COUNTER_TTL)
            .await?;
        self.store
            .set(
                &cache_keys::events_activity_key(user_id),
                &now.to_rfc3339(),
                EVENTS_COUNTER_TTL,
            )
            .await?;

        debug!(user_id, n, current = used + n, limit, "Events admitted");
        Ok(QuotaDecision {
            allowed: true,
            current: used + n,
            limit,
            plan,
        })
    }

    async fn current_usage(&self, user_id: &str, month_year: &str) -> Result<u64, QuotaError> {
        let pending = self
            .read_counter(&cache_keys::events_key(user_id, month_year))
            .await?;
        let settled = self
            .read_counter(&cache_keys::events_settled_key(user_id, month_year))
            .await?;
        Ok(pending + settled)
    }

    async fn pending_counts(&self, month_year: &str) -> Result<Vec<(String, u64)>, QuotaError> {
        let mut counts = Vec::new();
        for key in self.store.scan(&cache_keys::events_pattern(month_year)).await? {
            let Some(user_id) = cache_keys::user_id_from_events_key(&key, month_year) else {
                continue;
            };
            let count = self.read_counter(&key).await?;
            if count > 0 {
                counts.push((user_id.to_string(), count));
            }
        }
        Ok(counts)
    }

    async fn settle(
        &self,
        user_id: &str,
        month_year: &str,
        amount: u64,
    ) -> Result<u64, QuotaError> {
        let remaining = self
            .store
            .settle(
                &cache_keys::events_key(user_id, month_year),
                &cache_keys::events_settled_key(user_id, month_year),
                amount as i64,
                EVENTS_COUNTER_TTL,
            )
            .await?;
        Ok(remaining.max(0) as u64)
    }
}
