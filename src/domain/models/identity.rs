// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use std::fmt;

/// 身份信息来源
///
/// 按优先级从高到低排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Query,
    Header,
    Body,
    PathSegment,
    Origin,
    Referer,
    #[default]
    None,
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            IdentitySource::Query => "query",
            IdentitySource::Header => "header",
            IdentitySource::Body => "body",
            IdentitySource::PathSegment => "path_segment",
            IdentitySource::Origin => "origin",
            IdentitySource::Referer => "referer",
            IdentitySource::None => "none",
        };
        f.write_str(name)
    }
}

/// 请求租户身份
///
/// 每个 public 请求构造一次，`source` 仅用于诊断
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestIdentity {
    /// 站点ID
    pub site_id: Option<String>,
    /// 域名
    pub domain: Option<String>,
    /// 提供站点ID（或在没有站点ID时提供域名）的来源
    pub source: IdentitySource,
}

impl RequestIdentity {
    /// 站点ID与域名是否都已获得
    pub fn is_complete(&self) -> bool {
        self.site_id.is_some() && self.domain.is_some()
    }

    /// 站点ID与域名是否都缺失
    pub fn is_empty(&self) -> bool {
        self.site_id.is_none() && self.domain.is_none()
    }

    /// 用来自 `source` 的值补全缺失字段
    ///
    /// 已有的字段不会被覆盖。
    pub fn fill(&mut self, site_id: Option<String>, domain: Option<String>, source: IdentitySource) {
        let site_id = site_id.filter(|v| !v.trim().is_empty());
        let domain = domain.filter(|v| !v.trim().is_empty());

        if self.site_id.is_none() {
            if let Some(id) = site_id {
                self.site_id = Some(id);
                self.source = source;
            }
        }
        if self.domain.is_none() {
            if let Some(d) = domain {
                self.domain = Some(d);
                if self.site_id.is_none() {
                    self.source = source;
                }
            }
        }
    }
}
