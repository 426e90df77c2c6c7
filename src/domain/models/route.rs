// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 路由分类
///
/// 每个请求按路径重新计算，不做持久化。决定请求走哪一条校验流水线。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// 无需校验（健康检查、登录注册、Webhook、管理接口）
    Unprotected,
    /// 公开的埋点/上报接口，需要网站校验
    Public,
    /// 控制台接口，需要JWT认证
    Protected,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RouteClass::Unprotected => write!(f, "unprotected"),
            RouteClass::Public => write!(f, "public"),
            RouteClass::Protected => write!(f, "protected"),
        }
    }
}

/// 限流分类
///
/// 与路由分类基本一一对应，额外区分登录注册等认证接口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitClass {
    Public,
    Protected,
    Unprotected,
    Auth,
}

impl RateLimitClass {
    /// Redis键中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitClass::Public => "public",
            RateLimitClass::Protected => "protected",
            RateLimitClass::Unprotected => "unprotected",
            RateLimitClass::Auth => "auth",
        }
    }
}

impl fmt::Display for RateLimitClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RouteClass> for RateLimitClass {
    fn from(class: RouteClass) -> Self {
        match class {
            RouteClass::Unprotected => RateLimitClass::Unprotected,
            RouteClass::Public => RateLimitClass::Public,
            RouteClass::Protected => RateLimitClass::Protected,
        }
    }
}
