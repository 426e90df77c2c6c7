// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 网站校验结果
///
/// 只有上游校验成功后才会被缓存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    #[serde(alias = "website_id", alias = "id")]
    pub website_id: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "is_verified")]
    pub is_verified: bool,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
    #[serde(default, alias = "origin_validated", skip_serializing_if = "Option::is_none")]
    pub origin_validated: Option<bool>,
    #[serde(default, alias = "allowed_origins", skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    /// 网站所属用户
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 所属用户的套餐
    #[serde(default, alias = "user_plan", skip_serializing_if = "Option::is_none")]
    pub user_plan: Option<String>,
}

/// 网站归属信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteOwnership {
    #[serde(alias = "website_id", alias = "id")]
    pub website_id: String,
    #[serde(alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default = "default_true", alias = "is_active")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
