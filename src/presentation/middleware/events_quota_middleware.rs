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
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::domain::models::admission::AdmissionContext;
use crate::domain::models::quota::Plan;
use crate::domain::services::route_classifier::events_cost;
use crate::presentation::errors::GatewayError;
use crate::presentation::state::AppState;

/// 每月事件配额中间件
///
/// 只检查事件上报路径；没有可归属用户的请求直接放行，缓存故障时放行。
pub async fn events_quota_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !state.settings.features.cloud_enabled || req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let Some(cost) = events_cost(req.uri().path(), state.settings.quota.batch_event_estimate)
    else {
        return Ok(next.run(req).await);
    };

    let owner = req.extensions().get::<AdmissionContext>().and_then(|ctx| {
        ctx.quota_user_id()
            .map(|id| (id.to_string(), Plan::parse_or_free(ctx.quota_plan())))
    });
    let Some((user_id, plan)) = owner else {
        debug!("No user attached to event request, skipping quota");
        return Ok(next.run(req).await);
    };

    match state.quota.check_and_increment(&user_id, plan, cost).await {
        Ok(decision) if !decision.allowed => {
            warn!(user_id = %user_id, plan = %plan, current = decision.current, limit = decision.limit, "Events quota exceeded");
            Err(GatewayError::QuotaExceeded(decision))
        }
        Ok(_) => Ok(next.run(req).await),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Quota check failed, allowing request");
            Ok(next.run(req).await)
        }
    }
}
