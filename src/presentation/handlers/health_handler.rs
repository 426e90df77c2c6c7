// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::presentation::state::AppState;

/// 健康检查
///
/// Redis 不可用时报告 degraded，但始终返回 200。
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let redis = match state.cache.store().ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!(error = %e, "Health check could not reach cache");
            "unreachable"
        }
    };
    Json(json!({
        "status": if redis == "ok" { "ok" } else { "degraded" },
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "redis": redis,
        "cloudFeatures": state.settings.features.cloud_enabled,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Prometheus 指标
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

pub async fn robots() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        "User-agent: *\nDisallow: /\n",
    )
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
