// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::settings::Settings;
use crate::domain::models::quota::PlanLimits;
use crate::domain::services::quota_service::EventsQuotaService;
use crate::domain::services::rate_limiting_service::RateLimitingService;
use crate::domain::services::user_service::UserServiceClient;
use crate::domain::services::validation_service::ValidationService;
use crate::infrastructure::cache::cache_store::CacheStore;
use crate::infrastructure::cache::gateway_cache::GatewayCache;
use crate::infrastructure::http_client::build_http_client;
use crate::infrastructure::proxy::backend_proxy::BackendProxy;
use crate::infrastructure::services::admin_client::AdminClient;
use crate::infrastructure::services::quota_service_impl::EventsQuotaServiceImpl;
use crate::infrastructure::services::rate_limiting_service_impl::RateLimitingServiceImpl;
use crate::infrastructure::services::user_service_client::HttpUserServiceClient;
use crate::infrastructure::services::validation_service_impl::ValidationServiceImpl;
use crate::presentation::extractors::client_ip::ClientIpResolver;

/// 应用共享状态
///
/// 启动时构建一次，所有客户端在此注入，请求处理期间只读。
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub cache: GatewayCache,
    pub user_service: Arc<dyn UserServiceClient>,
    pub validation: Arc<dyn ValidationService>,
    pub rate_limiter: Arc<dyn RateLimitingService>,
    pub quota: Arc<dyn EventsQuotaService>,
    pub proxy: BackendProxy,
    pub admin: AdminClient,
    pub client_ip: ClientIpResolver,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// 按配置组装全部服务
    pub fn build(
        settings: Arc<Settings>,
        store: Arc<dyn CacheStore>,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&settings.services)?;
        let cache = GatewayCache::new(store.clone());
        let user_service: Arc<dyn UserServiceClient> =
            Arc::new(HttpUserServiceClient::new(client.clone(), &settings.services));
        let validation = Arc::new(ValidationServiceImpl::new(
            cache.clone(),
            user_service.clone(),
            settings.cache.clone(),
        ));
        let rate_limiter = Arc::new(RateLimitingServiceImpl::new(
            store.clone(),
            settings.rate_limiting.clone(),
        ));
        let quota = Arc::new(EventsQuotaServiceImpl::new(
            store,
            PlanLimits::from(&settings.quota),
        ));

        Ok(Self {
            proxy: BackendProxy::new(client.clone(), &settings.services),
            admin: AdminClient::new(client, &settings.services),
            client_ip: ClientIpResolver::new(settings.trusted_proxies()),
            settings,
            cache,
            user_service,
            validation,
            rate_limiter,
            quota,
            metrics,
        })
    }
}
