// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::models::quota::QuotaDecision;
use crate::domain::services::rate_limiting_service::RateLimitDecision;
use crate::domain::services::validation_service::{
    AuthFailure, OwnershipFailure, ValidationFailure,
};
use crate::infrastructure::proxy::backend_proxy::ProxyError;

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// 网关错误类型
///
/// 每个变体对应一个固定的状态码，响应体至少包含 `error` 与 `message`。
/// 内部原因只写日志，不回显给调用方。
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0} service is not configured")]
    BackendNotConfigured(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error(transparent)]
    OwnershipDenied(#[from] OwnershipFailure),

    #[error("rate limit exceeded")]
    RateLimited(RateLimitDecision),

    #[error("monthly events quota exceeded")]
    QuotaExceeded(QuotaDecision),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no route for {0}")]
    NotFound(String),

    #[error("admin access denied")]
    AdminDenied,

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::BackendNotConfigured(_) | GatewayError::UpstreamUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Validation(_)
            | GatewayError::OwnershipDenied(_)
            | GatewayError::AdminDenied => StatusCode::FORBIDDEN,
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::RateLimited(_) | GatewayError::QuotaExceeded(_) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// 对外的 (error, message)
    fn public_text(&self) -> (String, String) {
        match self {
            GatewayError::Validation(failure) => {
                let message = match failure {
                    ValidationFailure::IdentityRequired => "siteId or domain is required",
                    ValidationFailure::InvalidFormat(_) => "siteId or domain has an invalid format",
                    ValidationFailure::OriginRequired => "Origin header is required",
                    ValidationFailure::CooldownActive(_) => {
                        "Too many validation attempts, please retry shortly"
                    }
                    ValidationFailure::Rejected(_) | ValidationFailure::Upstream(_) => {
                        "Website validation failed"
                    }
                };
                ("forbidden".to_string(), message.to_string())
            }
            GatewayError::Auth(failure) => {
                let error = match failure {
                    AuthFailure::Upstream(_) => "invalid or expired token".to_string(),
                    other => other.to_string(),
                };
                (error, "Authentication required".to_string())
            }
            GatewayError::OwnershipDenied(_) => (
                "forbidden".to_string(),
                "You do not have access to this website".to_string(),
            ),
            GatewayError::RateLimited(_) => (
                "rate limit exceeded".to_string(),
                "Too many requests, please try again later".to_string(),
            ),
            GatewayError::QuotaExceeded(_) => (
                "monthly events quota exceeded".to_string(),
                "Upgrade your plan to keep tracking events this month".to_string(),
            ),
            GatewayError::BackendNotConfigured(_) | GatewayError::UpstreamUnavailable(_) => (
                "service unavailable".to_string(),
                "The requested service is temporarily unavailable".to_string(),
            ),
            GatewayError::PayloadTooLarge => (
                "payload too large".to_string(),
                "Request body exceeds the allowed size".to_string(),
            ),
            GatewayError::BadRequest(msg) => ("bad request".to_string(), msg.clone()),
            GatewayError::NotFound(_) => (
                "not found".to_string(),
                "No service handles this path".to_string(),
            ),
            GatewayError::AdminDenied => (
                "forbidden".to_string(),
                "Admin access required".to_string(),
            ),
            GatewayError::Configuration(_) | GatewayError::Internal(_) => (
                "internal server error".to_string(),
                "An unexpected error occurred".to_string(),
            ),
        }
    }
}

impl From<ProxyError> for GatewayError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::NoRoute => GatewayError::NotFound("path".to_string()),
            ProxyError::NotConfigured(service) => {
                GatewayError::BackendNotConfigured(service.to_string())
            }
            ProxyError::BodyTooLarge => GatewayError::PayloadTooLarge,
            err @ ProxyError::Unavailable { .. } => {
                GatewayError::UpstreamUnavailable(err.to_string())
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let (error, message) = self.public_text();
        let mut body = json!({ "error": error, "message": message });
        if let GatewayError::QuotaExceeded(decision) = &self {
            body["current"] = json!(decision.current);
            body["limit"] = json!(decision.limit);
            body["plan"] = json!(decision.plan);
            body["upgrade_required"] = json!(true);
        }

        let mut response = (status, Json(body)).into_response();
        if let GatewayError::RateLimited(decision) = &self {
            set_rate_limit_headers(response.headers_mut(), decision);
        }
        response
    }
}

/// 写入限流响应头
pub fn set_rate_limit_headers(headers: &mut axum::http::HeaderMap, decision: &RateLimitDecision) {
    headers.insert(RATE_LIMIT_LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(decision.remaining));
}
