// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::settings::CacheSettings;
use crate::domain::models::identity::RequestIdentity;
use crate::domain::models::user::UserIdentity;
use crate::domain::models::website::{ValidationRecord, WebsiteOwnership};
use crate::domain::services::user_service::UserServiceClient;
use crate::domain::services::validation_service::{
    bearer_token, AuthFailure, OwnershipFailure, ValidationFailure, ValidationService,
};
use crate::infrastructure::cache::cache_keys;
use crate::infrastructure::cache::gateway_cache::GatewayCache;
use crate::infrastructure::services::single_flight::SingleFlight;
use crate::utils::validators::{sanitize_input, validate_domain, validate_site_id};

/// 校验服务实现
///
/// 先查缓存，未命中时经单飞锁和校验冷却后调用用户服务。
/// 只缓存成功结果，缓存故障按未命中处理。
pub struct ValidationServiceImpl {
    cache: GatewayCache,
    user_service: Arc<dyn UserServiceClient>,
    settings: CacheSettings,
    flights: SingleFlight,
}

impl ValidationServiceImpl {
    pub fn new(
        cache: GatewayCache,
        user_service: Arc<dyn UserServiceClient>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            cache,
            user_service,
            settings,
            flights: SingleFlight::new(),
        }
    }

    /// 清理并校验请求身份
    fn sanitize_identity(
        identity: &RequestIdentity,
    ) -> Result<(Option<String>, Option<String>), ValidationFailure> {
        if identity.is_empty() {
            return Err(ValidationFailure::IdentityRequired);
        }
        let site_id = identity
            .site_id
            .as_deref()
            .map(validate_site_id)
            .transpose()?;
        let domain = identity
            .domain
            .as_deref()
            .map(validate_domain)
            .transpose()?;
        Ok((site_id, domain))
    }

    async fn read_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get_json::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(namespace = cache_keys::namespace_of(key), error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// 每个网站在冷却窗口内只允许有限次数的上游校验
    async fn enforce_cooldown(&self, subject: &str) -> Result<(), ValidationFailure> {
        let key = cache_keys::validation_cooldown_key(subject);
        let window = Duration::from_secs(self.settings.validation_cooldown_secs);
        match self.cache.store().incr_window(&key, 1, window).await {
            Ok(count) if count > i64::from(self.settings.validation_burst) => {
                Err(ValidationFailure::CooldownActive(subject.to_string()))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Validation cooldown unavailable, continuing");
                Ok(())
            }
        }
    }

    async fn validate_cold(
        &self,
        key: &str,
        ttl: Duration,
        site_id: Option<&str>,
        domain: Option<&str>,
        origin: Option<&str>,
    ) -> Result<ValidationRecord, ValidationFailure> {
        if let Some(record) = self.read_cache::<ValidationRecord>(key).await {
            return Ok(record);
        }

        let _flight = self.flights.acquire(key).await;
        // Another task may have filled the entry while we waited.
        if let Some(record) = self.read_cache::<ValidationRecord>(key).await {
            return Ok(record);
        }

        let subject = site_id.or(domain).unwrap_or_default();
        self.enforce_cooldown(subject).await?;

        let mut record = self
            .user_service
            .validate_website(site_id, domain, origin)
            .await?;
        if !record.is_active {
            return Err(ValidationFailure::Rejected("website is inactive".to_string()));
        }
        if origin.is_some() {
            match record.origin_validated {
                Some(false) => {
                    return Err(ValidationFailure::Rejected("origin not allowed".to_string()))
                }
                None => record.origin_validated = Some(true),
                Some(true) => {}
            }
        }

        self.cache.set_json_best_effort(key, &record, ttl).await;
        debug!(website_id = %record.website_id, "Website validated by user service");
        Ok(record)
    }
}

#[async_trait]
impl ValidationService for ValidationServiceImpl {
    async fn validate_website(
        &self,
        identity: &RequestIdentity,
    ) -> Result<ValidationRecord, ValidationFailure> {
        let (site_id, domain) = Self::sanitize_identity(identity)?;
        let key = cache_keys::validation_key(site_id.as_deref(), domain.as_deref())
            .ok_or(ValidationFailure::IdentityRequired)?;
        let ttl = Duration::from_secs(self.settings.validation_ttl_secs);
        self.validate_cold(&key, ttl, site_id.as_deref(), domain.as_deref(), None)
            .await
    }

    async fn validate_website_for_origin(
        &self,
        identity: &RequestIdentity,
        origin: Option<&str>,
    ) -> Result<ValidationRecord, ValidationFailure> {
        let origin = origin
            .map(sanitize_input)
            .filter(|o| !o.is_empty())
            .ok_or(ValidationFailure::OriginRequired)?;
        let (site_id, domain) = Self::sanitize_identity(identity)?;
        let key =
            cache_keys::origin_validation_key(site_id.as_deref(), domain.as_deref(), &origin);
        let ttl = Duration::from_secs(self.settings.origin_validation_ttl_secs);
        self.validate_cold(
            &key,
            ttl,
            site_id.as_deref(),
            domain.as_deref(),
            Some(origin.as_str()),
        )
        .await
    }

    async fn validate_token(
        &self,
        authorization: Option<&str>,
    ) -> Result<UserIdentity, AuthFailure> {
        let header = authorization
            .filter(|h| !h.trim().is_empty())
            .ok_or(AuthFailure::MissingHeader)?;
        let token = bearer_token(header)?;
        let key = cache_keys::token_key(token);

        if let Some(user) = self.read_cache::<UserIdentity>(&key).await {
            return Ok(user);
        }
        let _flight = self.flights.acquire(&key).await;
        if let Some(user) = self.read_cache::<UserIdentity>(&key).await {
            return Ok(user);
        }

        let user = self.user_service.validate_token(token).await?;
        self.cache
            .set_json_best_effort(&key, &user, Duration::from_secs(self.settings.token_ttl_secs))
            .await;
        debug!(user_id = %user.id, "Token validated by user service");
        Ok(user)
    }

    async fn verify_ownership(
        &self,
        website_id: &str,
        user: &UserIdentity,
    ) -> Result<WebsiteOwnership, OwnershipFailure> {
        let website_id =
            validate_site_id(website_id).map_err(|_| OwnershipFailure::InvalidWebsiteId)?;
        let key = cache_keys::website_key(&website_id);

        let ownership = match self.read_cache::<WebsiteOwnership>(&key).await {
            Some(ownership) => ownership,
            None => {
                let ownership = self
                    .user_service
                    .website_ownership(&website_id)
                    .await
                    .map_err(OwnershipFailure::Lookup)?;
                self.cache
                    .set_json_best_effort(
                        &key,
                        &ownership,
                        Duration::from_secs(self.settings.ownership_ttl_secs),
                    )
                    .await;
                ownership
            }
        };

        if ownership.user_id != user.id {
            return Err(OwnershipFailure::NotOwner { website_id });
        }
        Ok(ownership)
    }
}
