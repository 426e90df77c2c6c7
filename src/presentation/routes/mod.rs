// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::presentation::handlers::{admin_handler, health_handler, proxy_handler};
use crate::presentation::middleware::{
    admin_auth_middleware::{admin_auth_middleware, ADMIN_CODE_HEADER},
    events_quota_middleware::events_quota_middleware,
    rate_limit_middleware::rate_limit_middleware,
    validation_middleware::validation_middleware,
};
use crate::presentation::state::AppState;

/// 创建网关路由
///
/// 请求依次经过：校验 -> 限流 -> 事件配额 -> 处理器；
/// 未匹配的路径全部交给代理处理器。
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/stats", get(admin_handler::stats))
        .route("/users", get(admin_handler::users))
        .route("/websites", get(admin_handler::websites))
        .layer(from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(admin_cors(&state.settings.cors_origins()));

    let local_routes = Router::new()
        .route("/", get(health_handler::health))
        .route("/health", get(health_handler::health))
        .route("/metrics", get(health_handler::metrics))
        .route("/robots.txt", get(health_handler::robots))
        .route("/favicon.ico", get(health_handler::favicon));

    // 后添加的层先执行
    Router::new()
        .merge(local_routes)
        .nest("/api/v1/admin", admin_routes)
        .fallback(proxy_handler::proxy_handler)
        .layer(from_fn_with_state(state.clone(), events_quota_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), validation_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 管理接口的CORS层
///
/// `*` 表示任意来源（不携带凭据），否则只允许配置中的来源。
pub fn admin_cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_CODE_HEADER),
        ]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}
