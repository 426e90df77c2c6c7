// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

/// 客户端IP解析器
///
/// 未配置可信代理时按 `X-Forwarded-For` 第一项、`X-Real-IP`、连接对端地址的顺序取值。
/// 配置了可信代理后，只有对端是可信代理时才读取转发头，并从 `X-Forwarded-For`
/// 右侧跳过可信代理取第一个地址。
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted: Arc<Vec<IpAddr>>,
}

impl ClientIpResolver {
    pub fn new(trusted: Vec<IpAddr>) -> Self {
        Self {
            trusted: Arc::new(trusted),
        }
    }

    fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted.contains(ip)
    }

    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let peer_ip = peer.map(|addr| addr.ip());
        if self.trusted.is_empty() {
            return first_forwarded(headers)
                .or_else(|| real_ip(headers))
                .or_else(|| peer_ip.map(|ip| ip.to_string()))
                .unwrap_or_else(|| "unknown".to_string());
        }

        match peer_ip {
            Some(ip) if self.is_trusted(&ip) => self
                .nearest_untrusted_forwarded(headers)
                .or_else(|| real_ip(headers))
                .unwrap_or_else(|| ip.to_string()),
            Some(ip) => ip.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// 从请求中解析客户端IP
    pub fn from_request<B>(&self, request: &Request<B>) -> String {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        self.resolve(request.headers(), peer)
    }

    fn nearest_untrusted_forwarded(&self, headers: &HeaderMap) -> Option<String> {
        let chain = headers.get("x-forwarded-for")?.to_str().ok()?;
        chain
            .rsplit(',')
            .map(str::trim)
            .filter_map(|entry| entry.parse::<IpAddr>().ok())
            .find(|ip| !self.is_trusted(ip))
            .map(|ip| ip.to_string())
    }
}

fn first_forwarded(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn real_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
