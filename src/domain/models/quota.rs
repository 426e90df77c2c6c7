// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::settings::QuotaSettings;

/// 订阅套餐
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Standard,
    Pro,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Standard => write!(f, "standard"),
            Plan::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Plan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "standard" => Ok(Plan::Standard),
            "pro" => Ok(Plan::Pro),
            _ => Err(()),
        }
    }
}

impl Plan {
    /// 解析套餐名称，无法识别时回退到 free
    pub fn parse_or_free(raw: Option<&str>) -> Self {
        raw.and_then(|p| p.parse().ok()).unwrap_or_default()
    }
}

/// 各套餐的每月事件上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub free: u64,
    pub standard: u64,
    pub pro: u64,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: 1_000,
            standard: 100_000,
            pro: 500_000,
        }
    }
}

impl From<&QuotaSettings> for PlanLimits {
    fn from(settings: &QuotaSettings) -> Self {
        Self {
            free: settings.free_limit,
            standard: settings.standard_limit,
            pro: settings.pro_limit,
        }
    }
}

impl PlanLimits {
    /// 获取套餐的每月上限
    pub fn limit_for(&self, plan: Plan) -> u64 {
        match plan {
            Plan::Free => self.free,
            Plan::Standard => self.standard,
            Plan::Pro => self.pro,
        }
    }
}

/// 配额检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// 检查后的当月用量（被拒绝时为检查前的用量）
    pub current: u64,
    pub limit: u64,
    pub plan: Plan,
}

/// 计数器使用的月份标识 (YYYY-MM)
pub fn month_year(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

/// 上一个自然月的月份标识，跨月时同步上月剩余计数
pub fn previous_month_year(now: DateTime<Utc>) -> String {
    let (year, month) = match now.month() {
        1 => (now.year() - 1, 12),
        m => (now.year(), m - 1),
    };
    format!("{:04}-{:02}", year, month)
}

/// 单个用户的待同步事件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSyncEntry {
    pub user_id: String,
    pub count: u64,
}

/// 发往用户服务的事件同步批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSyncBatch {
    pub month_year: String,
    pub users: Vec<EventSyncEntry>,
}
