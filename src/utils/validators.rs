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

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// 输入字段的最大长度
pub const MAX_INPUT_LEN: usize = 255;

/// 会被剔除的危险字符
const STRIPPED_CHARS: &[char] = &['<', '>', '\'', '"', '&', '|', '$', ';', '`', '\\'];

static SITE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("site id regex is valid"));

// Labels of 1-63 chars, optional trailing port.
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)*(?::[0-9]{1,5})?$",
    )
    .expect("domain regex is valid")
});

/// 格式校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// 站点ID格式无效
    #[error("invalid site id format")]
    InvalidSiteId,
    /// 域名格式无效
    #[error("invalid domain format")]
    InvalidDomain,
}

/// 清理外部输入
///
/// 去除控制字符（含空字节）与危险字符，并截断到 [`MAX_INPUT_LEN`] 个字符。
pub fn sanitize_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control() && !STRIPPED_CHARS.contains(c))
        .take(MAX_INPUT_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}

/// 规范化域名：小写、去掉协议、路径和末尾的点
pub fn normalize_domain(raw: &str) -> String {
    let lowered = sanitize_input(raw).to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    host.trim_end_matches('.').to_string()
}

/// 校验并返回清理后的站点ID
pub fn validate_site_id(raw: &str) -> Result<String, FormatError> {
    let cleaned = sanitize_input(raw);
    if cleaned.is_empty() || !SITE_ID_RE.is_match(&cleaned) {
        return Err(FormatError::InvalidSiteId);
    }
    Ok(cleaned)
}

/// 校验并返回规范化后的域名
pub fn validate_domain(raw: &str) -> Result<String, FormatError> {
    let normalized = normalize_domain(raw);
    if normalized.is_empty() || !DOMAIN_RE.is_match(&normalized) {
        return Err(FormatError::InvalidDomain);
    }
    Ok(normalized)
}

/// 判断字符串是否可以作为站点ID（用于路径段识别）
pub fn looks_like_site_id(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.len() <= MAX_INPUT_LEN && SITE_ID_RE.is_match(candidate)
}
