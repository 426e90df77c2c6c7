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
    extract::{Request, State},
    http::header,
    response::Response,
};

use crate::application::use_cases::cache_invalidation::{plan_invalidation, CacheInvalidation};
use crate::domain::models::admission::AdmissionContext;
use crate::domain::services::route_classifier::{classify, is_canonical_path};
use crate::infrastructure::proxy::backend_router::resolve_backend;
use crate::presentation::errors::GatewayError;
use crate::presentation::state::AppState;

/// 代理处理器（路由兜底）
///
/// 转发到路径对应的后端；写操作成功后清理相关缓存。
pub async fn proxy_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    if !is_canonical_path(&path) {
        return Err(GatewayError::BadRequest(
            "path must be in canonical form".to_string(),
        ));
    }
    let service =
        resolve_backend(&path).ok_or_else(|| GatewayError::NotFound(path.clone()))?;

    let context = req
        .extensions()
        .get::<AdmissionContext>()
        .cloned()
        .unwrap_or_else(|| {
            AdmissionContext::new(classify(&path), state.client_ip.from_request(&req))
        });
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = state.proxy.forward(service, req, &context).await?;

    if response.status().is_success() {
        let user_id = context.user.as_ref().map(|u| u.id.as_str());
        let actions = plan_invalidation(&method, &path, user_id);
        if !actions.is_empty() {
            CacheInvalidation::new(state.cache.clone())
                .apply(&actions, authorization.as_deref())
                .await;
        }
    }
    Ok(response)
}
