// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::quota::EventSyncBatch;
use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};

/// 上游服务调用错误
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// 服务地址未配置
    #[error("{0} service is not configured")]
    NotConfigured(&'static str),

    /// 网络或连接错误
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// 超时
    #[error("upstream request timed out")]
    Timeout,

    /// 非 2xx 响应
    #[error("upstream returned status {0}")]
    Status(u16),

    /// 上游明确拒绝（`success: false`）
    #[error("upstream rejected the request: {0}")]
    Rejected(String),

    /// 响应体无法解析
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// 上游是否给出了明确的否定答复（而非不可用）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            UpstreamError::Rejected(_) | UpstreamError::Status(400..=499)
        )
    }
}

/// 用户服务内部接口
///
/// 所有调用都携带服务间 API Key，响应统一为 `{success, data}` 信封。
#[async_trait]
pub trait UserServiceClient: Send + Sync {
    /// 校验网站/域名，`origin` 存在时一并转发用于来源校验
    async fn validate_website(
        &self,
        website_id: Option<&str>,
        domain: Option<&str>,
        origin: Option<&str>,
    ) -> Result<ValidationRecord, UpstreamError>;

    /// 校验 JWT 并返回用户身份
    async fn validate_token(&self, token: &str) -> Result<UserIdentity, UpstreamError>;

    /// 查询网站归属
    async fn website_ownership(&self, website_id: &str) -> Result<WebsiteOwnership, UpstreamError>;

    /// 上报一批待同步的事件计数，仅 200 视为成功
    async fn sync_event_counts(&self, batch: &EventSyncBatch) -> Result<(), UpstreamError>;
}
