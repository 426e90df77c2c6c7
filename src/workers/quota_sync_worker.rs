// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::settings::QuotaSettings;
use crate::domain::models::quota::{
    month_year, previous_month_year, EventSyncBatch, EventSyncEntry,
};
use crate::domain::services::quota_service::{EventsQuotaService, QuotaError};
use crate::domain::services::user_service::UserServiceClient;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to list pending counters: {0}")]
    Pending(#[from] QuotaError),
}

/// 单轮同步结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub batches_sent: usize,
    pub batches_failed: usize,
    /// 已确认并结算的事件数
    pub events_synced: u64,
}

/// 事件计数同步工作器
///
/// 定期把 Redis 中的待同步计数批量推送给用户服务，
/// 只有用户服务确认的批次才会结算，失败的批次留到下一轮。
pub struct QuotaSyncWorker {
    quota: Arc<dyn EventsQuotaService>,
    user_service: Arc<dyn UserServiceClient>,
    interval: Duration,
    batch_size: usize,
}

impl QuotaSyncWorker {
    pub fn new(
        quota: Arc<dyn EventsQuotaService>,
        user_service: Arc<dyn UserServiceClient>,
        settings: &QuotaSettings,
    ) -> Self {
        Self {
            quota,
            user_service,
            interval: Duration::from_secs(settings.sync_interval_secs.max(1)),
            batch_size: settings.sync_batch_size.max(1),
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            batch_size = self.batch_size,
            "Quota sync worker started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 第一次 tick 立即完成
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(report) if report.batches_sent + report.batches_failed > 0 => {
                    info!(
                        sent = report.batches_sent,
                        failed = report.batches_failed,
                        events = report.events_synced,
                        "Quota sync finished"
                    );
                }
                Ok(_) => debug!("Quota sync found nothing to send"),
                Err(e) => error!("Quota sync failed: {}", e),
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 执行一轮同步（上月剩余计数 + 当月计数）
    pub async fn run_once(&self) -> Result<SyncReport, SyncError> {
        counter!("gateway_quota_sync_runs_total").increment(1);
        let now = Utc::now();
        let mut report = SyncReport::default();

        for month in [previous_month_year(now), month_year(now)] {
            let pending = self.quota.pending_counts(&month).await?;
            for chunk in pending.chunks(self.batch_size) {
                self.sync_chunk(&month, chunk, &mut report).await;
            }
        }

        Ok(report)
    }

    async fn sync_chunk(&self, month: &str, chunk: &[(String, u64)], report: &mut SyncReport) {
        let batch = EventSyncBatch {
            month_year: month.to_string(),
            users: chunk
                .iter()
                .map(|(user_id, count)| EventSyncEntry {
                    user_id: user_id.clone(),
                    count: *count,
                })
                .collect(),
        };

        if let Err(e) = self.user_service.sync_event_counts(&batch).await {
            warn!(
                month_year = month,
                users = batch.users.len(),
                error = %e,
                "Event count batch rejected, keeping counters for retry"
            );
            counter!("gateway_quota_sync_batches_total", "outcome" => "failure").increment(1);
            report.batches_failed += 1;
            return;
        }

        counter!("gateway_quota_sync_batches_total", "outcome" => "success").increment(1);
        report.batches_sent += 1;

        for entry in &batch.users {
            match self.quota.settle(&entry.user_id, month, entry.count).await {
                Ok(remaining) => {
                    report.events_synced += entry.count;
                    counter!("gateway_quota_sync_events_total").increment(entry.count);
                    debug!(
                        user_id = %entry.user_id,
                        month_year = month,
                        synced = entry.count,
                        remaining,
                        "Settled event counter"
                    );
                }
                Err(e) => {
                    // 结算失败时该用户的计数会在下一轮重复上报
                    error!(
                        user_id = %entry.user_id,
                        month_year = month,
                        error = %e,
                        "Failed to settle synced events"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "quota_sync_worker_test.rs"]
mod tests;
