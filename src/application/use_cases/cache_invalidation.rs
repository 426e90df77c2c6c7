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

use axum::http::Method;
use tracing::{info, warn};

use crate::domain::services::route_classifier::prefix_matches;
use crate::domain::services::validation_service::bearer_token;
use crate::infrastructure::cache::gateway_cache::GatewayCache;
use crate::utils::validators::looks_like_site_id;

const WEBSITES_PREFIX: &str = "/api/v1/user/websites/";

/// 修改后需要让调用者令牌失效的账户路径
const TOKEN_PATHS: &[&str] = &[
    "/api/v1/user/profile",
    "/api/v1/user/password",
    "/api/v1/user/account",
    "/api/v1/user/auth/logout",
];

/// 删除账户的路径
const ACCOUNT_DELETION_PATHS: &[&str] = &["/api/v1/user/account", "/api/v1/privacy/delete-account"];

/// 写操作成功后的缓存失效动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationAction {
    /// 清除网站的归属与全部校验结果
    Website(String),
    /// 清除调用者令牌的校验结果
    CallerToken,
    /// 清除某个用户的全部缓存
    User(String),
}

/// 是否为写操作
pub fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// 计算一次成功写操作需要执行的失效动作
pub fn plan_invalidation(
    method: &Method,
    path: &str,
    user_id: Option<&str>,
) -> Vec<InvalidationAction> {
    if !is_mutating(method) {
        return Vec::new();
    }

    let mut actions = Vec::new();
    if let Some(rest) = path.strip_prefix(WEBSITES_PREFIX) {
        let id = rest.split('/').next().unwrap_or_default();
        if looks_like_site_id(id) {
            actions.push(InvalidationAction::Website(id.to_string()));
        }
    }
    if TOKEN_PATHS.iter().any(|p| prefix_matches(path, p)) {
        actions.push(InvalidationAction::CallerToken);
    }
    if *method == Method::DELETE || path.ends_with("delete-account") {
        if let Some(user_id) = user_id {
            if ACCOUNT_DELETION_PATHS.iter().any(|p| prefix_matches(path, p)) {
                actions.push(InvalidationAction::User(user_id.to_string()));
            }
        }
    }
    actions
}

/// 写操作后的缓存失效
///
/// 失败只记录日志，不影响已经返回的后端响应。
pub struct CacheInvalidation {
    cache: GatewayCache,
}

impl CacheInvalidation {
    pub fn new(cache: GatewayCache) -> Self {
        Self { cache }
    }

    pub async fn apply(&self, actions: &[InvalidationAction], authorization: Option<&str>) {
        for action in actions {
            let result = match action {
                InvalidationAction::Website(id) => self.cache.clear_website_cache(id).await,
                InvalidationAction::CallerToken => match authorization.map(bearer_token) {
                    Some(Ok(token)) => self.cache.clear_token_cache(token).await,
                    _ => Ok(0),
                },
                InvalidationAction::User(user_id) => self.cache.clear_user_cache(user_id).await,
            };
            match result {
                Ok(removed) => info!(action = ?action, removed, "Cache invalidated after write"),
                Err(e) => warn!(action = ?action, error = %e, "Cache invalidation failed"),
            }
        }
    }
}
