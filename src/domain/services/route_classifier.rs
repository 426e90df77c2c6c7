// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 路由分类
//!
//! 每个分类只有一张有序前缀表，校验中间件与限流中间件共用同一份表。
//! unprotected 表总是先于 public 表匹配，因此 `/api/v1/admin/` 或 webhook 路径下
//! 看似公开的路径永远不会被误判为 public。
//!
//! 前缀语义：以 `/` 结尾的前缀要求其后还有内容；否则要求路径在前缀处结束或紧跟 `/`。
//! `*` 匹配恰好一个路径段。

use once_cell::sync::Lazy;
use url::Url;

use crate::domain::models::route::{RateLimitClass, RouteClass};

/// 无需校验的前缀
pub const UNPROTECTED_PREFIXES: &[&str] = &[
    "/health",
    "/metrics",
    "/favicon.ico",
    "/robots.txt",
    "/api/v1/user/auth/register",
    "/api/v1/user/auth/login",
    "/api/v1/user/auth/google",
    "/api/v1/user/auth/github",
    "/api/v1/*/webhooks/",
    "/api/v1/admin",
    "/api/v1/support/contact",
];

/// 公开上报接口前缀
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/api/v1/analytics/event",
    "/api/v1/analytics/track",
    "/api/v1/workflows/site/",
    "/api/v1/workflows/active",
    "/api/v1/workflows/execution/action",
    "/api/v1/funnels/track",
    "/api/v1/funnels/active",
];

/// 使用认证限流上限的前缀
pub const AUTH_PREFIXES: &[&str] = &[
    "/api/v1/user/auth/register",
    "/api/v1/user/auth/login",
    "/api/v1/user/auth/google",
    "/api/v1/user/auth/github",
];

/// 需要来源绑定校验的 public 前缀
pub const ORIGIN_BOUND_PREFIXES: &[&str] = &[
    "/api/v1/workflows/site/",
    "/api/v1/workflows/active",
    "/api/v1/workflows/execution/action",
];

/// 批量事件上报前缀
pub const BATCH_EVENT_PREFIXES: &[&str] = &["/api/v1/analytics/event/batch"];

/// 单条事件上报前缀
pub const SINGLE_EVENT_PREFIXES: &[&str] = &["/api/v1/analytics/event", "/api/v1/analytics/track"];

/// 不参与限流的探活/抓取路径
pub const RATE_LIMIT_EXEMPT_PREFIXES: &[&str] = &["/health", "/metrics"];

static DEFAULT_CLASSIFIER: Lazy<RouteClassifier> = Lazy::new(RouteClassifier::default);

/// 判断路径是否匹配前缀模式
pub fn prefix_matches(path: &str, pattern: &str) -> bool {
    let mut rest = path;
    for (i, part) in pattern.split('*').enumerate() {
        if i > 0 {
            // The wildcard consumes exactly one non-empty segment.
            let end = rest.find('/').unwrap_or(rest.len());
            if end == 0 {
                return false;
            }
            rest = &rest[end..];
        }
        match rest.strip_prefix(part) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    pattern.ends_with('/') || rest.is_empty() || rest.starts_with('/')
}

fn matches_any(path: &str, table: &[&str]) -> bool {
    table.iter().any(|pattern| prefix_matches(path, pattern))
}

/// 路由分类器
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    unprotected: Vec<String>,
    public: Vec<String>,
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new(UNPROTECTED_PREFIXES, PUBLIC_PREFIXES)
    }
}

impl RouteClassifier {
    /// 使用自定义前缀表创建分类器
    pub fn new(unprotected: &[&str], public: &[&str]) -> Self {
        Self {
            unprotected: unprotected.iter().map(|s| s.to_string()).collect(),
            public: public.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 对路径分类
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == "/" {
            return RouteClass::Unprotected;
        }
        if self.unprotected.iter().any(|p| prefix_matches(path, p)) {
            return RouteClass::Unprotected;
        }
        if self.public.iter().any(|p| prefix_matches(path, p)) {
            return RouteClass::Public;
        }
        RouteClass::Protected
    }
}

/// 使用默认前缀表对路径分类
pub fn classify(path: &str) -> RouteClass {
    DEFAULT_CLASSIFIER.classify(path)
}

/// 请求使用的限流分类
pub fn rate_limit_class(path: &str, route_class: RouteClass) -> RateLimitClass {
    if route_class == RouteClass::Unprotected && matches_any(path, AUTH_PREFIXES) {
        return RateLimitClass::Auth;
    }
    route_class.into()
}

/// 是否需要来源绑定校验
pub fn is_origin_bound(path: &str) -> bool {
    matches_any(path, ORIGIN_BOUND_PREFIXES)
}

/// 事件上报请求计入配额的事件数
///
/// 批量上报按固定估算值计算，避免在热路径上再次解析请求体。
pub fn events_cost(path: &str, batch_estimate: u64) -> Option<u64> {
    if matches_any(path, BATCH_EVENT_PREFIXES) {
        return Some(batch_estimate);
    }
    SINGLE_EVENT_PREFIXES
        .iter()
        .any(|p| path == *p || path.strip_prefix(p) == Some("/"))
        .then_some(1)
}

/// 是否跳过限流
pub fn is_rate_limit_exempt(path: &str) -> bool {
    path == "/" || matches_any(path, RATE_LIMIT_EXEMPT_PREFIXES)
}

/// 按转发时使用的 URL 解析规则规范化路径
///
/// 解析器会解码 `%2e` 形式的点段、把 `\` 视为分隔符并消解 `.` / `..`。
pub fn normalized_path(path: &str) -> Option<String> {
    Url::parse(&format!("http://gateway.invalid{}", path))
        .ok()
        .map(|url| url.path().to_string())
}

/// 路径是否已是规范形式
///
/// 分类、配额计费和后端选择都基于原始路径，必须与上游实际收到的路径一致。
/// 含点段（包括百分号编码形式）、反斜杠或编码分隔符的路径都不是规范形式。
pub fn is_canonical_path(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    if lowered.contains("%2f") || lowered.contains("%5c") {
        return false;
    }
    normalized_path(path).is_some_and(|normalized| normalized == path)
}
