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
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::domain::models::admission::AdmissionContext;
use crate::domain::models::route::RouteClass;
use crate::domain::services::route_classifier::{classify, is_canonical_path, is_origin_bound};
use crate::presentation::errors::GatewayError;
use crate::presentation::extractors::site_identity::extract_identity;
use crate::presentation::extractors::website_id::target_website_id;
use crate::presentation::state::AppState;

/// 校验中间件
///
/// 按路由分类选择校验策略，并把准入上下文写入请求扩展：
/// - unprotected：直接放行
/// - public：解析站点身份并校验网站（来源绑定路径额外校验 `Origin`）
/// - protected：校验 JWT，请求指向网站时校验归属
///
/// 非规范路径一律拒绝；CORS 预检请求不参与校验。
pub async fn validation_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_string();
    if !is_canonical_path(&path) {
        warn!(path = %path, "Rejected non-canonical path");
        return Err(GatewayError::BadRequest(
            "path must be in canonical form".to_string(),
        ));
    }

    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let route_class = classify(&path);
    let mut context = AdmissionContext::new(route_class, state.client_ip.from_request(&req));
    debug!(path = %path, class = %route_class, "Classified request");

    let mut req = match route_class {
        RouteClass::Unprotected => req,
        RouteClass::Public => {
            let (req, identity) = extract_identity(req).await?;
            let origin = req
                .headers()
                .get(header::ORIGIN)
                .and_then(|v| v.to_str().ok());
            let result = if is_origin_bound(&path) {
                state
                    .validation
                    .validate_website_for_origin(&identity, origin)
                    .await
            } else {
                state.validation.validate_website(&identity).await
            };
            let record = result.map_err(|failure| {
                warn!(
                    path = %path,
                    reason = failure.reason(),
                    source = %identity.source,
                    error = %failure,
                    "Website validation failed"
                );
                failure
            })?;
            context.website = Some(record);
            req
        }
        RouteClass::Protected => {
            let authorization = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            let user = state.validation.validate_token(authorization).await?;

            if let Some(website_id) = target_website_id(req.uri(), req.headers()) {
                let ownership = state
                    .validation
                    .verify_ownership(&website_id, &user)
                    .await
                    .map_err(|failure| {
                        warn!(user_id = %user.id, website_id = %website_id, error = %failure, "Ownership check failed");
                        failure
                    })?;
                context.ownership = Some(ownership);
            }
            context.user = Some(user);
            req
        }
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
