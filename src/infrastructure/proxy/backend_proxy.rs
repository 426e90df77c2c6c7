// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response};
use metrics::{counter, histogram};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::settings::ServiceSettings;
use crate::domain::models::admission::{AdmissionContext, INJECTED_HEADERS};
use crate::domain::services::user_service::UpstreamError;
use crate::infrastructure::proxy::backend_router::{BackendService, BackendTable};
use crate::infrastructure::services::user_service_client::{map_transport_error, API_KEY_HEADER};

/// 转发请求体的最大字节数
pub const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 逐跳头，不在任何方向上转发
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 代理错误
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("no backend serves this path")]
    NoRoute,

    #[error("{0} service is not configured")]
    NotConfigured(BackendService),

    #[error("{service} service unavailable: {source}")]
    Unavailable {
        service: BackendService,
        source: UpstreamError,
    },

    #[error("request body too large")]
    BodyTooLarge,
}

/// 反向代理
///
/// 转发前剔除逐跳头与客户端伪造的身份头，再注入准入上下文与服务间 API Key。
#[derive(Clone)]
pub struct BackendProxy {
    client: Client,
    backends: BackendTable,
    api_key: Option<String>,
    timeout: Duration,
}

impl BackendProxy {
    pub fn new(client: Client, settings: &ServiceSettings) -> Self {
        Self {
            client,
            backends: BackendTable::from_settings(settings),
            api_key: settings.api_key.clone(),
            timeout: Duration::from_secs(settings.proxy_timeout_secs),
        }
    }

    pub fn backends(&self) -> &BackendTable {
        &self.backends
    }

    /// 将请求转发到 `service`
    pub async fn forward(
        &self,
        service: BackendService,
        request: Request<Body>,
        context: &AdmissionContext,
    ) -> Result<Response<Body>, ProxyError> {
        let base = self
            .backends
            .base_url(service)
            .ok_or(ProxyError::NotConfigured(service))?;
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", base, path_and_query);

        let body = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
            .await
            .map_err(|_| ProxyError::BodyTooLarge)?;
        let headers = self.outbound_headers(&parts.headers, context);

        debug!(service = service.as_str(), method = %parts.method, path = parts.uri.path(), "Forwarding request");
        let start = Instant::now();
        let result = self
            .client
            .request(parts.method.clone(), url)
            .headers(headers)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await;
        histogram!("gateway_proxy_duration_seconds", "service" => service.as_str())
            .record(start.elapsed().as_secs_f64());

        let upstream = match result {
            Ok(response) => response,
            Err(e) => {
                let source = map_transport_error(e);
                warn!(service = service.as_str(), error = %source, "Backend unreachable");
                counter!("gateway_upstream_requests_total", "service" => service.as_str(), "outcome" => "error")
                    .increment(1);
                return Err(ProxyError::Unavailable { service, source });
            }
        };

        let outcome = if upstream.status().is_server_error() {
            "failure"
        } else {
            "success"
        };
        counter!("gateway_upstream_requests_total", "service" => service.as_str(), "outcome" => outcome)
            .increment(1);

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            copy_end_to_end_headers(upstream.headers(), headers);
        }
        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| ProxyError::Unavailable {
                service,
                source: UpstreamError::Decode(e.to_string()),
            })
    }

    fn outbound_headers(&self, inbound: &HeaderMap, context: &AdmissionContext) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(inbound.len() + 12);
        copy_end_to_end_headers(inbound, &mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        for name in INJECTED_HEADERS {
            headers.remove(*name);
        }

        for (name, value) in context.injected_headers() {
            match HeaderValue::from_bytes(value.as_bytes()) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(name), value);
                }
                Err(_) => debug!(header = name, "Skipping header with unrepresentable value"),
            }
        }
        if let Some(key) = self.api_key.as_deref() {
            let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes());
            if let (Ok(name), Ok(value)) = (name, HeaderValue::from_str(key)) {
                headers.insert(name, value);
            }
        }

        if !headers.contains_key(REQUEST_ID_HEADER) {
            if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
                headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
        }
        let forwarded_for = match inbound
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            Some(existing) => format!("{}, {}", existing, context.client_ip),
            None => context.client_ip.clone(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(HeaderName::from_static("x-forwarded-for"), value);
        }
        headers
    }
}

/// 复制端到端头：跳过逐跳头以及 `Connection` 中列出的头
pub fn copy_end_to_end_headers(from: &HeaderMap, to: &mut HeaderMap) {
    let listed: Vec<String> = from
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.trim().to_ascii_lowercase())
        .collect();
    for (name, value) in from {
        let lower = name.as_str();
        if HOP_BY_HOP_HEADERS.contains(&lower) || listed.iter().any(|l| l == lower) {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}
