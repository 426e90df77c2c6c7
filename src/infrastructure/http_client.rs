// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use reqwest::{header, Client};

use crate::config::settings::ServiceSettings;

/// 构建访问内部服务的 HTTP 客户端
///
/// 连接超时包含 TLS 握手；总超时由各调用方按请求设置。
pub fn build_http_client(settings: &ServiceSettings) -> reqwest::Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_static(concat!("gatewayrs/", env!("CARGO_PKG_VERSION"))),
    );
    Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(settings.pool_idle_timeout_secs))
        .redirect(reqwest::redirect::Policy::none())
        .build()
}
