// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::config::settings::ServiceSettings;
use crate::domain::services::user_service::UpstreamError;
use crate::infrastructure::proxy::backend_router::{BackendService, BackendTable};
use crate::infrastructure::services::user_service_client::{map_transport_error, API_KEY_HEADER};

/// 访问各服务内部管理接口的客户端
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    backends: BackendTable,
    api_key: Option<String>,
    timeout: Duration,
}

impl AdminClient {
    pub fn new(client: Client, settings: &ServiceSettings) -> Self {
        Self {
            client,
            backends: BackendTable::from_settings(settings),
            api_key: settings.api_key.clone(),
            timeout: settings.admin_timeout(),
        }
    }

    /// 获取某个服务的管理资源（stats / users / websites）
    ///
    /// 响应若为 `{success, data}` 信封则取出 `data`，否则原样返回。
    pub async fn fetch(
        &self,
        service: BackendService,
        resource: &str,
        query: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let base = self
            .backends
            .base_url(service)
            .ok_or(UpstreamError::NotConfigured(service.as_str()))?;
        let mut url = format!("{}{}/{}", base, service.admin_prefix(), resource);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self.client.get(url).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        counter!(
            "gateway_upstream_requests_total",
            "service" => service.as_str(),
            "outcome" => if status.is_success() { "success" } else { "failure" }
        )
        .increment(1);
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        unwrap_envelope(body)
    }

    /// 并发获取全部服务的统计，失败的服务记为 None
    pub async fn fetch_all_stats(&self) -> Vec<(BackendService, Option<Value>)> {
        let results = futures::future::join_all(
            BackendService::ALL
                .iter()
                .map(|service| async move { (*service, self.fetch(*service, "stats", None).await) }),
        )
        .await;

        results
            .into_iter()
            .map(|(service, result)| match result {
                Ok(value) => (service, Some(value)),
                Err(e) => {
                    warn!(service = service.as_str(), error = %e, "Admin stats unavailable");
                    (service, None)
                }
            })
            .collect()
    }
}

fn unwrap_envelope(body: Value) -> Result<Value, UpstreamError> {
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(body.get("data").cloned().unwrap_or(Value::Null)),
        Some(false) => Err(UpstreamError::Rejected(
            body.get("error")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("request was not successful")
                .to_string(),
        )),
        None => Ok(body),
    }
}
