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

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::domain::models::identity::{IdentitySource, RequestIdentity};
use crate::presentation::errors::GatewayError;
use crate::utils::validators::looks_like_site_id;

/// 为解析身份而读取的请求体上限（1 MiB）
pub const MAX_IDENTITY_BODY_BYTES: usize = 1024 * 1024;

const QUERY_SITE_ID_KEYS: &[&str] = &["siteId", "website_id", "websiteId"];
const BODY_SITE_ID_KEYS: &[&str] = &["siteId", "websiteId", "website_id"];

/// 路径中不可能是站点ID的词
const NON_ID_SEGMENTS: &[&str] = &[
    "events",
    "event",
    "analytics",
    "dashboard",
    "batch",
    "track",
    "active",
    "site",
    "funnels",
    "workflows",
    "execution",
    "action",
    "api",
    "v1",
];

/// 按优先级从请求中解析站点ID与域名
///
/// 请求体只读取一次，并原样放回返回的请求中。两者都找不到不是错误。
pub async fn extract_identity(
    request: Request,
) -> Result<(Request, RequestIdentity), GatewayError> {
    let (parts, body) = request.into_parts();
    let mut identity = RequestIdentity::default();

    let query = parse_query(parts.uri.query());
    identity.fill(
        first_of(&query, QUERY_SITE_ID_KEYS),
        query.get("domain").cloned(),
        IdentitySource::Query,
    );

    identity.fill(
        header_str(&parts.headers, "x-site-id"),
        header_str(&parts.headers, "x-domain"),
        IdentitySource::Header,
    );

    let declared_len = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_IDENTITY_BODY_BYTES) {
        return Err(GatewayError::PayloadTooLarge);
    }
    let bytes = axum::body::to_bytes(body, MAX_IDENTITY_BODY_BYTES)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge)?;
    if !identity.is_complete() && !bytes.is_empty() {
        if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&bytes) {
            let site_id = BODY_SITE_ID_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(json_scalar));
            let domain = map.get("domain").and_then(json_scalar);
            identity.fill(site_id, domain, IdentitySource::Body);
        }
    }

    identity.fill(path_site_id(parts.uri.path()), None, IdentitySource::PathSegment);
    identity.fill(
        None,
        header_str(&parts.headers, "origin").and_then(|o| hostname(&o)),
        IdentitySource::Origin,
    );
    identity.fill(
        None,
        header_str(&parts.headers, "referer").and_then(|r| hostname(&r)),
        IdentitySource::Referer,
    );

    Ok((Request::from_parts(parts, Body::from(bytes)), identity))
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| {
            let mut map = HashMap::new();
            for (k, v) in pairs {
                map.entry(k).or_insert(v);
            }
            map
        })
        .unwrap_or_default()
}

fn first_of(map: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k).filter(|v| !v.trim().is_empty()))
        .cloned()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 路径末段（或倒数第二段）中的站点ID
pub fn path_site_id(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .iter()
        .rev()
        .take(2)
        .find(|s| !NON_ID_SEGMENTS.contains(*s) && looks_like_site_id(s))
        .map(|s| s.to_string())
}

fn hostname(raw: &str) -> Option<String> {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
