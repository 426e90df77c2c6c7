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
    extract::{RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::application::use_cases::admin_overview::build_overview;
use crate::domain::services::user_service::UpstreamError;
use crate::infrastructure::proxy::backend_router::BackendService;
use crate::presentation::errors::GatewayError;
use crate::presentation::state::AppState;

/// 汇总三个服务的管理统计
pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    Json(build_overview(state.admin.fetch_all_stats().await))
}

/// 用户列表（透传用户服务）
pub async fn users(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, GatewayError> {
    passthrough(&state, "users", query.as_deref()).await
}

/// 网站列表（透传用户服务）
pub async fn websites(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, GatewayError> {
    passthrough(&state, "websites", query.as_deref()).await
}

async fn passthrough(
    state: &AppState,
    resource: &str,
    query: Option<&str>,
) -> Result<Json<Value>, GatewayError> {
    state
        .admin
        .fetch(BackendService::User, resource, query)
        .await
        .map(Json)
        .map_err(|e| match e {
            UpstreamError::NotConfigured(service) => {
                GatewayError::BackendNotConfigured(service.to_string())
            }
            other => GatewayError::UpstreamUnavailable(other.to_string()),
        })
}
