// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::{HeaderMap, Uri};

const QUERY_KEYS: &[&str] = &["websiteId", "website_id", "siteId"];
const PATH_MARKERS: &[&str] = &["websites", "website", "site"];

/// protected 请求指向的网站ID
///
/// 依次查找查询参数、`X-Website-ID` 头以及 `websites`/`website`/`site` 之后的路径段。
pub fn target_website_id(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let from_query = uri.query().and_then(|q| {
        serde_urlencoded::from_str::<Vec<(String, String)>>(q)
            .ok()?
            .into_iter()
            .find(|(k, v)| QUERY_KEYS.contains(&k.as_str()) && !v.trim().is_empty())
            .map(|(_, v)| v)
    });
    if from_query.is_some() {
        return from_query;
    }

    if let Some(value) = headers
        .get("x-website-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(value.to_string());
    }

    let segments: Vec<&str> = uri.path().split('/').filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .find(|pair| PATH_MARKERS.contains(&pair[0]))
        .map(|pair| pair[1].to_string())
}
