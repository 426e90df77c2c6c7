// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::dto::service_envelope::{
    ServiceEnvelope, TokenValidationData, ValidateWebsiteRequest,
};
use crate::config::settings::ServiceSettings;
use crate::domain::models::quota::EventSyncBatch;
use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};
use crate::domain::services::user_service::{UpstreamError, UserServiceClient};

/// 服务间认证头
pub const API_KEY_HEADER: &str = "X-API-Key";

/// 通过 HTTP 访问用户服务
pub struct HttpUserServiceClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpUserServiceClient {
    pub fn new(client: Client, settings: &ServiceSettings) -> Self {
        Self {
            client,
            base_url: settings
                .user_url
                .as_deref()
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            api_key: settings.api_key.clone(),
            timeout: settings.validation_timeout(),
        }
    }

    fn url(&self, path: &str) -> Result<String, UpstreamError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("user"))?;
        Ok(format!("{}{}", base, path))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.timeout(self.timeout);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// 发送请求并记录指标，非 2xx 转为错误
    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<reqwest::Response, UpstreamError> {
        let start = Instant::now();
        let result = builder.send().await;
        histogram!("gateway_upstream_duration_seconds", "service" => "user", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let err = map_transport_error(e);
                warn!(operation, error = %err, "User service request failed");
                counter!("gateway_upstream_requests_total", "service" => "user", "outcome" => "error")
                    .increment(1);
                return Err(err);
            }
        };

        let status = response.status();
        let outcome = if status.is_success() { "success" } else { "failure" };
        counter!("gateway_upstream_requests_total", "service" => "user", "outcome" => outcome)
            .increment(1);
        if !status.is_success() {
            debug!(operation, status = status.as_u16(), "User service returned non-success");
            return Err(UpstreamError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, UpstreamError> {
        let response = self.send(builder, operation).await?;
        let envelope: ServiceEnvelope<T> = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        envelope.into_data().map_err(UpstreamError::Rejected)
    }
}

/// 将 reqwest 错误归类为超时或传输错误
pub fn map_transport_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Transport(err.to_string())
    }
}

#[async_trait]
impl UserServiceClient for HttpUserServiceClient {
    async fn validate_website(
        &self,
        website_id: Option<&str>,
        domain: Option<&str>,
        origin: Option<&str>,
    ) -> Result<ValidationRecord, UpstreamError> {
        let url = self.url("/api/v1/user/websites/validate")?;
        let mut builder = self
            .authorize(self.client.post(url))
            .json(&ValidateWebsiteRequest { website_id, domain });
        if let Some(origin) = origin {
            builder = builder.header(reqwest::header::ORIGIN, origin);
        }
        self.send_envelope(builder, "validate_website").await
    }

    async fn validate_token(&self, token: &str) -> Result<UserIdentity, UpstreamError> {
        let url = self.url("/api/v1/user/auth/validate")?;
        let builder = self.authorize(self.client.get(url)).bearer_auth(token);
        let data: TokenValidationData = self.send_envelope(builder, "validate_token").await?;
        Ok(data.into())
    }

    async fn website_ownership(&self, website_id: &str) -> Result<WebsiteOwnership, UpstreamError> {
        let url = self.url(&format!("/api/v1/user/internal/websites/{}", website_id))?;
        let builder = self.authorize(self.client.get(url));
        self.send_envelope(builder, "website_ownership").await
    }

    async fn sync_event_counts(&self, batch: &EventSyncBatch) -> Result<(), UpstreamError> {
        let url = self.url("/api/v1/user/internal/events/sync")?;
        let builder = self.authorize(self.client.post(url)).json(batch);
        let response = self.send(builder, "sync_event_counts").await?;
        // Only a plain 200 confirms the counts were recorded.
        if response.status() != StatusCode::OK {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
