// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Redis 键命名空间
//!
//! 可能泄露秘密（令牌）或可被定向投毒（来源绑定校验）的键一律使用单向哈希派生，
//! 并带有 `_hash:` 后缀以便审计。

use sha2::{Digest, Sha256};

use crate::domain::models::route::RateLimitClass;

pub const VALIDATION_PREFIX: &str = "validation:";
pub const ORIGIN_VALIDATION_PREFIX: &str = "validation_origin_hash:";
pub const SITE_ID_PREFIX: &str = "siteId:";
pub const DOMAIN_PREFIX: &str = "domain:";
pub const TOKEN_PREFIX: &str = "token_hash:";
pub const WEBSITE_PREFIX: &str = "website:";

/// 计算SHA-256十六进制摘要
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

// Parts are joined with '\n'; sanitized inputs never contain control characters.
fn hash_parts(parts: &[&str]) -> String {
    sha256_hex(&parts.join("\n"))
}

/// 网站校验结果的缓存键
///
/// 同时具备站点ID和域名时使用二者的哈希，否则按单一字段命名空间存放
pub fn validation_key(website_id: Option<&str>, domain: Option<&str>) -> Option<String> {
    match (website_id, domain) {
        (Some(id), Some(domain)) => Some(format!(
            "{}{}",
            VALIDATION_PREFIX,
            hash_parts(&[id, domain])
        )),
        (Some(id), None) => Some(format!("{}{}", SITE_ID_PREFIX, id)),
        (None, Some(domain)) => Some(format!("{}{}", DOMAIN_PREFIX, domain)),
        (None, None) => None,
    }
}

/// 来源绑定校验结果的缓存键
pub fn origin_validation_key(website_id: Option<&str>, domain: Option<&str>, origin: &str) -> String {
    format!(
        "{}{}",
        ORIGIN_VALIDATION_PREFIX,
        hash_parts(&[website_id.unwrap_or_default(), domain.unwrap_or_default(), origin])
    )
}

/// 令牌校验结果的缓存键，原始令牌不会出现在键中
pub fn token_key(token: &str) -> String {
    format!("{}{}", TOKEN_PREFIX, sha256_hex(token))
}

/// 网站归属信息的缓存键
pub fn website_key(website_id: &str) -> String {
    format!("{}{}", WEBSITE_PREFIX, website_id)
}

/// 固定窗口限流计数键
pub fn rate_key(class: RateLimitClass, identifier: &str) -> String {
    format!("rate:{}:{}", class.as_str(), identifier)
}

/// 网站校验冷却计数键
pub fn validation_cooldown_key(website_id: &str) -> String {
    format!("rate_limit:validation:{}", website_id)
}

/// 当月待同步事件计数键
pub fn events_key(user_id: &str, month_year: &str) -> String {
    format!("events:user:{}:{}", user_id, month_year)
}

/// 当月已同步事件计数键
pub fn events_settled_key(user_id: &str, month_year: &str) -> String {
    format!("events:synced:{}:{}", user_id, month_year)
}

/// 用户最近一次上报事件的时间戳键
pub fn events_activity_key(user_id: &str) -> String {
    format!("events:last_activity:{}", user_id)
}

/// 某月所有待同步事件计数键的匹配模式
pub fn events_pattern(month_year: &str) -> String {
    format!("events:user:*:{}", month_year)
}

/// 从待同步事件计数键中取出用户ID
pub fn user_id_from_events_key<'a>(key: &'a str, month_year: &str) -> Option<&'a str> {
    key.strip_prefix("events:user:")?
        .strip_suffix(month_year)?
        .strip_suffix(':')
        .filter(|id| !id.is_empty())
}

/// 键所在的命名空间（用于指标标签）
pub fn namespace_of(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}
