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
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::presentation::errors::GatewayError;
use crate::presentation::state::AppState;

pub const ADMIN_CODE_HEADER: &str = "x-admin-code";

/// 常量时间比较管理口令
pub fn admin_code_matches(provided: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

/// 管理接口认证中间件
///
/// 接受 `X-Admin-Code` 管理口令，或角色为 admin 的用户 JWT。
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let provided_code = req
        .headers()
        .get(ADMIN_CODE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let (Some(provided), Some(expected)) =
        (provided_code, state.settings.security.admin_code.as_deref())
    {
        if admin_code_matches(provided, expected) {
            return Ok(next.run(req).await);
        }
        warn!("Invalid admin code presented");
    }

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if authorization.is_none() && provided_code.is_some() {
        return Err(GatewayError::AdminDenied);
    }
    let user = state.validation.validate_token(authorization).await?;
    if !user.is_admin() {
        warn!(user_id = %user.id, "Non-admin user attempted admin access");
        return Err(GatewayError::AdminDenied);
    }
    Ok(next.run(req).await)
}
