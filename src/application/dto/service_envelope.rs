// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::user::UserIdentity;

/// 内部服务统一响应信封
#[derive(Debug, Deserialize, Serialize)]
pub struct ServiceEnvelope<T> {
    /// 请求是否成功
    pub success: bool,
    /// 成功时的数据
    pub data: Option<T>,
    /// 失败说明
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> ServiceEnvelope<T> {
    /// 取出数据，失败时返回上游给出的说明
    pub fn into_data(self) -> Result<T, String> {
        if !self.success {
            return Err(self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request was not successful".to_string()));
        }
        self.data
            .ok_or_else(|| "response carried no data".to_string())
    }
}

/// 网站校验请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateWebsiteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<&'a str>,
}

/// 令牌校验返回的数据：直接是用户，或包在 `user` 字段里
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenValidationData {
    Nested { user: UserIdentity },
    Flat(UserIdentity),
}

impl From<TokenValidationData> for UserIdentity {
    fn from(data: TokenValidationData) -> Self {
        match data {
            TokenValidationData::Nested { user } => user,
            TokenValidationData::Flat(user) => user,
        }
    }
}
