// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};
use crate::infrastructure::cache::cache_keys::{self, namespace_of};
use crate::infrastructure::cache::cache_store::{CacheError, CacheStore};
use crate::utils::validators::{normalize_domain, sanitize_input, validate_domain};

/// 网关缓存
///
/// 在 [`CacheStore`] 之上提供 JSON 序列化、命中率指标和按实体失效的辅助方法。
/// 缓存只用于提升可用性，未命中永远不代表拒绝。
#[derive(Clone)]
pub struct GatewayCache {
    store: Arc<dyn CacheStore>,
}

impl GatewayCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// 底层键值存储
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// 读取并反序列化缓存值
    ///
    /// 无法解析的条目按未命中处理并被删除。
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let namespace = namespace_of(key).to_string();
        match self.store.get(key).await? {
            Some(raw) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    counter!("gateway_cache_hits_total", "namespace" => namespace).increment(1);
                    Ok(Some(value))
                }
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Discarding unreadable cache entry");
                    if let Err(e) = self.store.delete(&[key.to_string()]).await {
                        warn!(namespace = %namespace, error = %e, "Failed to delete unreadable cache entry");
                    }
                    counter!("gateway_cache_misses_total", "namespace" => namespace).increment(1);
                    Ok(None)
                }
            },
            None => {
                counter!("gateway_cache_misses_total", "namespace" => namespace).increment(1);
                Ok(None)
            }
        }
    }

    /// 序列化并写入缓存
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw, ttl).await
    }

    /// 尽力写入：失败只记录警告和指标，不影响请求
    pub async fn set_json_best_effort<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.set_json(key, value, ttl).await {
            let namespace = namespace_of(key).to_string();
            warn!(namespace = %namespace, error = %e, "Cache write failed, continuing without cache");
            counter!("gateway_cache_write_failures_total", "namespace" => namespace).increment(1);
        }
    }

    /// 清除某个用户的缓存：其令牌校验结果及其名下网站的归属信息
    pub async fn clear_user_cache(&self, user_id: &str) -> Result<u64, CacheError> {
        let tokens = self
            .delete_matching::<UserIdentity, _>(&format!("{}*", cache_keys::TOKEN_PREFIX), |u| {
                u.id == user_id
            })
            .await?;
        let websites = self
            .delete_matching::<WebsiteOwnership, _>(
                &format!("{}*", cache_keys::WEBSITE_PREFIX),
                |w| w.user_id == user_id,
            )
            .await?;
        debug!(user_id, removed = tokens + websites, "Cleared user cache");
        Ok(tokens + websites)
    }

    /// 清除某个网站的所有缓存（归属信息与全部校验结果）
    ///
    /// 归属缓存中记录了域名时，同时按 (网站, 域名) 清除校验结果。
    pub async fn clear_website_cache(&self, website_id: &str) -> Result<u64, CacheError> {
        let owned_domain = self
            .get_json::<WebsiteOwnership>(&cache_keys::website_key(website_id))
            .await
            .ok()
            .flatten()
            .and_then(|ownership| ownership.domain);
        let mut removed = match owned_domain {
            Some(domain) => self.clear_validation_cache(website_id, &domain).await?,
            None => 0,
        };
        removed += self
            .store
            .delete(&[
                cache_keys::website_key(website_id),
                format!("{}{}", cache_keys::SITE_ID_PREFIX, website_id),
            ])
            .await?;
        for prefix in [
            cache_keys::VALIDATION_PREFIX,
            cache_keys::ORIGIN_VALIDATION_PREFIX,
            cache_keys::DOMAIN_PREFIX,
        ] {
            removed += self
                .delete_matching::<ValidationRecord, _>(&format!("{}*", prefix), |r| {
                    r.website_id == website_id
                })
                .await?;
        }
        debug!(website_id, removed, "Cleared website cache");
        Ok(removed)
    }

    /// 清除某个 (网站, 域名) 组合的校验结果，包括所有来源绑定的变体
    ///
    /// 参数按写入时的规则规范化后再生成键。
    pub async fn clear_validation_cache(
        &self,
        website_id: &str,
        domain: &str,
    ) -> Result<u64, CacheError> {
        let website_id = sanitize_input(website_id);
        let website_id = website_id.as_str();
        let domain = validate_domain(domain).unwrap_or_else(|_| normalize_domain(domain));
        let domain = domain.as_str();
        let keys: Vec<String> = [
            cache_keys::validation_key(Some(website_id), Some(domain)),
            cache_keys::validation_key(Some(website_id), None),
            cache_keys::validation_key(None, Some(domain)),
        ]
        .into_iter()
        .flatten()
        .collect();
        let mut removed = self.store.delete(&keys).await?;
        removed += self
            .delete_matching::<ValidationRecord, _>(
                &format!("{}*", cache_keys::ORIGIN_VALIDATION_PREFIX),
                |r| r.website_id == website_id && r.domain.eq_ignore_ascii_case(domain),
            )
            .await?;
        Ok(removed)
    }

    /// 清除全部网站校验结果
    pub async fn clear_all_validation_cache(&self) -> Result<u64, CacheError> {
        let mut keys = Vec::new();
        for prefix in [
            cache_keys::VALIDATION_PREFIX,
            cache_keys::ORIGIN_VALIDATION_PREFIX,
            cache_keys::SITE_ID_PREFIX,
            cache_keys::DOMAIN_PREFIX,
        ] {
            keys.extend(self.store.scan(&format!("{}*", prefix)).await?);
        }
        let removed = self.store.delete(&keys).await?;
        warn!(removed, "Cleared all validation cache entries");
        Ok(removed)
    }

    /// 清除某个令牌的校验结果
    pub async fn clear_token_cache(&self, token: &str) -> Result<u64, CacheError> {
        self.store.delete(&[cache_keys::token_key(token)]).await
    }

    async fn delete_matching<T, F>(&self, pattern: &str, predicate: F) -> Result<u64, CacheError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let mut doomed = Vec::new();
        for key in self.store.scan(pattern).await? {
            if let Some(raw) = self.store.get(&key).await? {
                if serde_json::from_str::<T>(&raw).is_ok_and(|v| predicate(&v)) {
                    doomed.push(key);
                }
            }
        }
        self.store.delete(&doomed).await
    }
}
