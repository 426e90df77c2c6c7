// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

use crate::config::settings::ServiceSettings;

/// 后端服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendService {
    User,
    Analytics,
    Workflow,
}

impl BackendService {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendService::User => "user",
            BackendService::Analytics => "analytics",
            BackendService::Workflow => "workflow",
        }
    }

    /// 服务内部管理接口的路径前缀
    pub fn admin_prefix(&self) -> &'static str {
        match self {
            BackendService::User => "/api/v1/user/internal/admin",
            BackendService::Analytics => "/api/v1/analytics/internal/admin",
            BackendService::Workflow => "/api/v1/workflows/internal/admin",
        }
    }

    pub const ALL: [BackendService; 3] = [
        BackendService::User,
        BackendService::Analytics,
        BackendService::Workflow,
    ];
}

impl fmt::Display for BackendService {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BACKEND_PREFIXES: &[(&str, BackendService)] = &[
    ("/api/v1/user/", BackendService::User),
    ("/api/v1/billing/", BackendService::User),
    ("/api/v1/support/", BackendService::User),
    ("/api/v1/analytics/", BackendService::Analytics),
    ("/api/v1/funnels/", BackendService::Analytics),
    ("/api/v1/workflows/", BackendService::Workflow),
];

const PRIVACY_PREFIX: &str = "/api/v1/privacy/";

/// 账户级隐私操作由用户服务处理，其余隐私请求归分析服务
const ACCOUNT_PRIVACY_OPS: &[&str] = &["account", "consent", "delete-account", "export-account"];

/// 按路径选择后端服务
pub fn resolve_backend(path: &str) -> Option<BackendService> {
    if let Some(rest) = path.strip_prefix(PRIVACY_PREFIX) {
        let op = rest.split('/').next().unwrap_or_default();
        return Some(if ACCOUNT_PRIVACY_OPS.contains(&op) {
            BackendService::User
        } else {
            BackendService::Analytics
        });
    }
    BACKEND_PREFIXES
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, service)| *service)
}

/// 后端服务地址表
#[derive(Debug, Clone, Default)]
pub struct BackendTable {
    user: Option<String>,
    analytics: Option<String>,
    workflow: Option<String>,
}

impl BackendTable {
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        Self {
            user: normalize_base(settings.user_url.as_deref()),
            analytics: normalize_base(settings.analytics_url.as_deref()),
            workflow: normalize_base(settings.workflow_url.as_deref()),
        }
    }

    /// 服务的基础地址（未配置时为 None）
    pub fn base_url(&self, service: BackendService) -> Option<&str> {
        match service {
            BackendService::User => self.user.as_deref(),
            BackendService::Analytics => self.analytics.as_deref(),
            BackendService::Workflow => self.workflow.as_deref(),
        }
    }
}

fn normalize_base(raw: Option<&str>) -> Option<String> {
    raw.map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
}
