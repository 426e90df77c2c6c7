// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::identity::RequestIdentity;
use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};
use crate::domain::services::user_service::UpstreamError;
use crate::utils::validators::FormatError;

/// 网站校验失败原因
///
/// 对调用方统一表现为 403，内部按变体区分并记录日志。
#[derive(Error, Debug)]
pub enum ValidationFailure {
    #[error("site id or domain required")]
    IdentityRequired,

    #[error("{0}")]
    InvalidFormat(#[from] FormatError),

    #[error("validation cooldown active for {0}")]
    CooldownActive(String),

    #[error("origin header required")]
    OriginRequired,

    #[error("website rejected: {0}")]
    Rejected(String),

    #[error("website validation unavailable: {0}")]
    Upstream(UpstreamError),
}

impl ValidationFailure {
    /// 日志中使用的简短原因
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationFailure::IdentityRequired => "identity_required",
            ValidationFailure::InvalidFormat(_) => "invalid_format",
            ValidationFailure::CooldownActive(_) => "cooldown",
            ValidationFailure::OriginRequired => "origin_required",
            ValidationFailure::Rejected(_) => "rejected",
            ValidationFailure::Upstream(_) => "upstream",
        }
    }
}

impl From<UpstreamError> for ValidationFailure {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Rejected(msg) => ValidationFailure::Rejected(msg),
            other if other.is_rejection() => ValidationFailure::Rejected(other.to_string()),
            other => ValidationFailure::Upstream(other),
        }
    }
}

/// JWT 认证失败原因，对调用方统一表现为 401
#[derive(Error, Debug)]
pub enum AuthFailure {
    #[error("authorization header required")]
    MissingHeader,

    #[error("malformed bearer token")]
    MalformedToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token validation unavailable: {0}")]
    Upstream(UpstreamError),
}

impl From<UpstreamError> for AuthFailure {
    fn from(err: UpstreamError) -> Self {
        if err.is_rejection() {
            AuthFailure::InvalidToken
        } else {
            AuthFailure::Upstream(err)
        }
    }
}

/// 网站归属校验失败原因，对调用方统一表现为 403
#[derive(Error, Debug)]
pub enum OwnershipFailure {
    #[error("invalid website id")]
    InvalidWebsiteId,

    #[error("website {website_id} is not owned by the caller")]
    NotOwner { website_id: String },

    #[error("website ownership lookup failed: {0}")]
    Lookup(UpstreamError),
}

/// 校验引擎
#[async_trait]
pub trait ValidationService: Send + Sync {
    /// public 请求的网站/域名校验
    async fn validate_website(
        &self,
        identity: &RequestIdentity,
    ) -> Result<ValidationRecord, ValidationFailure>;

    /// 带来源绑定的网站校验，缺少 `Origin` 时直接失败
    async fn validate_website_for_origin(
        &self,
        identity: &RequestIdentity,
        origin: Option<&str>,
    ) -> Result<ValidationRecord, ValidationFailure>;

    /// protected 请求的 JWT 校验，参数为原始 `Authorization` 头
    async fn validate_token(&self, authorization: Option<&str>)
        -> Result<UserIdentity, AuthFailure>;

    /// 校验网站是否属于当前用户
    async fn verify_ownership(
        &self,
        website_id: &str,
        user: &UserIdentity,
    ) -> Result<WebsiteOwnership, OwnershipFailure>;
}

/// 从 `Authorization` 头中取出 Bearer 令牌
pub fn bearer_token(header: &str) -> Result<&str, AuthFailure> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AuthFailure::MalformedToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthFailure::MalformedToken);
    }
    let token = token.trim();
    if !is_structural_jwt(token) {
        return Err(AuthFailure::MalformedToken);
    }
    Ok(token)
}

/// 结构检查：三段非空 base64url
pub fn is_structural_jwt(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'=')
        })
}
