// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::route::RouteClass;
use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};

/// 网关注入给后端的身份头
///
/// 客户端自带的同名头在转发前一律剔除。
pub const INJECTED_HEADERS: &[&str] = &[
    "x-user-id",
    "x-user-email",
    "x-user-name",
    "x-user-plan",
    "x-user-status",
    "x-website-id",
    "x-site-id",
    "x-website-user-id",
    "x-website-domain",
    "x-website-active",
    "x-api-key",
];

/// 准入上下文
///
/// 校验中间件写入请求扩展，后续的限流、配额与代理阶段读取。
#[derive(Debug, Clone)]
pub struct AdmissionContext {
    pub route_class: RouteClass,
    pub client_ip: String,
    /// 已认证用户（protected）
    pub user: Option<UserIdentity>,
    /// 网站校验结果（public）
    pub website: Option<ValidationRecord>,
    /// 网站归属（protected 且请求指向某个网站）
    pub ownership: Option<WebsiteOwnership>,
}

impl AdmissionContext {
    pub fn new(route_class: RouteClass, client_ip: impl Into<String>) -> Self {
        Self {
            route_class,
            client_ip: client_ip.into(),
            user: None,
            website: None,
            ownership: None,
        }
    }

    /// 计算配额时使用的用户ID：已认证用户优先，其次是网站所有者
    pub fn quota_user_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .or_else(|| self.website.as_ref().and_then(|w| w.user_id.as_deref()))
            .filter(|id| !id.is_empty())
    }

    /// 计算配额时使用的套餐名
    pub fn quota_plan(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.plan.as_str())
            .or_else(|| self.website.as_ref().and_then(|w| w.user_plan.as_deref()))
    }

    /// 需要注入的头（小写名称, 值）
    pub fn injected_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(user) = &self.user {
            headers.push(("x-user-id", user.id.clone()));
            headers.push(("x-user-email", user.email.clone()));
            headers.push(("x-user-name", user.name.clone()));
            headers.push(("x-user-plan", user.plan.clone()));
            headers.push(("x-user-status", user.status.clone()));
        }

        let website_id = self
            .website
            .as_ref()
            .map(|w| w.website_id.clone())
            .or_else(|| self.ownership.as_ref().map(|o| o.website_id.clone()));
        if let Some(id) = website_id {
            headers.push(("x-website-id", id.clone()));
            headers.push(("x-site-id", id));
        }
        if let Some(website) = &self.website {
            if let Some(owner) = &website.user_id {
                headers.push(("x-website-user-id", owner.clone()));
            }
            if !website.domain.is_empty() {
                headers.push(("x-website-domain", website.domain.clone()));
            }
            headers.push(("x-website-active", website.is_active.to_string()));
        } else if let Some(ownership) = &self.ownership {
            headers.push(("x-website-user-id", ownership.user_id.clone()));
            if let Some(domain) = &ownership.domain {
                headers.push(("x-website-domain", domain.clone()));
            }
            headers.push(("x-website-active", ownership.is_active.to_string()));
        }
        headers
    }
}
