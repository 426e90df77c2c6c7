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
use metrics::counter;
use tracing::warn;

use crate::domain::models::admission::AdmissionContext;
use crate::domain::models::route::RateLimitClass;
use crate::domain::services::rate_limiting_service::RateLimitDecision;
use crate::domain::services::route_classifier::{classify, is_rate_limit_exempt, rate_limit_class};
use crate::presentation::errors::{set_rate_limit_headers, GatewayError};
use crate::presentation::state::AppState;

/// 限流标识：public 按域名、站点ID、IP；protected 按用户ID、IP；其余按IP
pub fn rate_limit_identifier(class: RateLimitClass, context: &AdmissionContext) -> String {
    let by_class = match class {
        RateLimitClass::Public => context.website.as_ref().and_then(|w| {
            Some(w.domain.as_str())
                .filter(|d| !d.is_empty())
                .or(Some(w.website_id.as_str()).filter(|id| !id.is_empty()))
        }),
        RateLimitClass::Protected => context.user.as_ref().map(|u| u.id.as_str()),
        RateLimitClass::Unprotected | RateLimitClass::Auth => None,
    };
    by_class.unwrap_or(&context.client_ip).to_string()
}

/// 固定窗口限流中间件
///
/// 计数失败时放行；无论是否放行都写入 `X-RateLimit-*` 头。
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let path = req.uri().path();
    if !state.settings.rate_limiting.enabled
        || req.method() == Method::OPTIONS
        || is_rate_limit_exempt(path)
    {
        return Ok(next.run(req).await);
    }

    let context = req
        .extensions()
        .get::<AdmissionContext>()
        .cloned()
        .unwrap_or_else(|| {
            AdmissionContext::new(classify(path), state.client_ip.from_request(&req))
        });
    let class = rate_limit_class(path, context.route_class);
    let identifier = rate_limit_identifier(class, &context);

    let decision = match state
        .rate_limiter
        .check_rate_limit(class, &identifier)
        .await
    {
        Ok(decision) => decision,
        Err(e) => {
            warn!(class = %class, error = %e, "Rate limit check failed, allowing request");
            RateLimitDecision::fail_open(state.rate_limiter.limit_for(class))
        }
    };

    if !decision.allowed {
        counter!("gateway_rate_limit_rejections_total", "class" => class.as_str()).increment(1);
        warn!(class = %class, identifier = %identifier, current = decision.current, "Rate limit exceeded");
        return Err(GatewayError::RateLimited(decision));
    }

    let mut response = next.run(req).await;
    set_rate_limit_headers(response.headers_mut(), &decision);
    Ok(response)
}
