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

use std::net::IpAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// 兼容的扁平环境变量与配置键的映射
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("REDIS_URL", "redis.url"),
    ("GLOBAL_API_KEY", "services.api_key"),
    ("USER_SERVICE_URL", "services.user_url"),
    ("ANALYTICS_SERVICE_URL", "services.analytics_url"),
    ("WORKFLOW_SERVICE_URL", "services.workflow_url"),
    ("CORS_ORIGIN", "security.cors_origin"),
    ("ADMIN_CODE", "security.admin_code"),
    ("API_GATEWAY_PORT", "server.port"),
    ("CLOUD_FEATURES_ENABLED", "features.cloud_enabled"),
    ("TRUSTED_PROXIES", "server.trusted_proxies"),
];

/// 网关配置
///
/// 启动时加载一次，通过 `Arc` 在各组件间共享
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 后端服务配置
    pub services: ServiceSettings,
    /// 缓存TTL配置
    pub cache: CacheSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 事件配额配置
    pub quota: QuotaSettings,
    /// 安全配置
    pub security: SecuritySettings,
    /// 功能开关
    pub features: FeatureSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// 可信反向代理IP（逗号分隔）。为空时信任所有转发头
    pub trusted_proxies: String,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
    /// 缓存后端 (redis, memory)
    pub backend: String,
}

/// 后端服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    /// 用户服务地址
    pub user_url: Option<String>,
    /// 分析服务地址
    pub analytics_url: Option<String>,
    /// 工作流服务地址
    pub workflow_url: Option<String>,
    /// 服务间调用的API密钥
    pub api_key: Option<String>,
    /// 网站/令牌校验调用超时（秒）
    pub validation_timeout_secs: u64,
    /// 管理接口聚合调用超时（秒）
    pub admin_timeout_secs: u64,
    /// 代理请求总超时（秒）
    pub proxy_timeout_secs: u64,
    /// 建立连接（含TLS握手）超时（秒）
    pub connect_timeout_secs: u64,
    /// 空闲连接保留时间（秒）
    pub pool_idle_timeout_secs: u64,
}

/// 缓存TTL配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 网站校验结果TTL（秒）
    pub validation_ttl_secs: u64,
    /// 来源绑定校验结果TTL（秒）
    pub origin_validation_ttl_secs: u64,
    /// 令牌校验结果TTL（秒）
    pub token_ttl_secs: u64,
    /// 网站归属信息TTL（秒）
    pub ownership_ttl_secs: u64,
    /// 校验冷却窗口（秒）
    pub validation_cooldown_secs: u64,
    /// 冷却窗口内允许的上游校验次数
    pub validation_burst: u32,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 固定窗口长度（秒）
    pub window_secs: u64,
    /// public 类每窗口上限
    pub public_limit: u32,
    /// protected 类每窗口上限
    pub protected_limit: u32,
    /// unprotected 类每窗口上限
    pub unprotected_limit: u32,
    /// 认证接口每窗口上限
    pub auth_limit: u32,
}

/// 事件配额配置
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    /// free 套餐每月事件数
    pub free_limit: u64,
    /// standard 套餐每月事件数
    pub standard_limit: u64,
    /// pro 套餐每月事件数
    pub pro_limit: u64,
    /// 同步任务间隔（秒）
    pub sync_interval_secs: u64,
    /// 每批同步的用户数
    pub sync_batch_size: usize,
    /// 批量上报接口的估算事件数
    pub batch_event_estimate: u64,
}

/// 安全配置
#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    /// 逗号分隔的CORS允许来源
    pub cors_origin: String,
    /// 管理接口访问码
    pub admin_code: Option<String>,
}

/// 功能开关
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSettings {
    /// 是否启用云端功能（事件配额与计费同步）
    pub cloud_enabled: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 加载顺序：内置默认值 -> 配置文件 -> `GATEWAY__*` 环境变量 -> 兼容的扁平环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let mut builder = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("GATEWAY").separator("__"));

        for (var, key) in LEGACY_ENV_KEYS {
            let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// 仅包含内置默认值的配置（测试使用）
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.trusted_proxies", "")?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.backend", "redis")?
            .set_default("services.validation_timeout_secs", 5)?
            .set_default("services.admin_timeout_secs", 10)?
            .set_default("services.proxy_timeout_secs", 30)?
            .set_default("services.connect_timeout_secs", 10)?
            .set_default("services.pool_idle_timeout_secs", 90)?
            .set_default("cache.validation_ttl_secs", 30 * 60)?
            .set_default("cache.origin_validation_ttl_secs", 5 * 60)?
            .set_default("cache.token_ttl_secs", 15 * 60)?
            .set_default("cache.ownership_ttl_secs", 10 * 60)?
            .set_default("cache.validation_cooldown_secs", 12)?
            .set_default("cache.validation_burst", 5)?
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.window_secs", 3600)?
            .set_default("rate_limiting.public_limit", 1000)?
            .set_default("rate_limiting.protected_limit", 5000)?
            .set_default("rate_limiting.unprotected_limit", 100)?
            .set_default("rate_limiting.auth_limit", 100)?
            .set_default("quota.free_limit", 1000)?
            .set_default("quota.standard_limit", 100_000)?
            .set_default("quota.pro_limit", 500_000)?
            .set_default("quota.sync_interval_secs", 600)?
            .set_default("quota.sync_batch_size", 100)?
            .set_default("quota.batch_event_estimate", 10)?
            .set_default("security.cors_origin", "")?
            .set_default("features.cloud_enabled", false)
    }

    /// 解析后的CORS来源列表
    pub fn cors_origins(&self) -> Vec<String> {
        parse_cors_origins(&self.security.cors_origin)
    }

    /// 解析后的可信代理列表
    pub fn trusted_proxies(&self) -> Vec<IpAddr> {
        parse_ip_list(&self.server.trusted_proxies)
    }
}

impl ServiceSettings {
    /// 网站/令牌校验调用超时
    pub fn validation_timeout(&self) -> Duration {
        Duration::from_secs(self.validation_timeout_secs)
    }

    /// 管理接口聚合调用超时
    pub fn admin_timeout(&self) -> Duration {
        Duration::from_secs(self.admin_timeout_secs)
    }
}

/// 解析逗号分隔的来源列表，去掉空白与末尾斜杠
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

/// 解析逗号分隔的IP列表，忽略无法解析的项
pub fn parse_ip_list(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .filter_map(|ip| ip.trim().parse().ok())
        .collect()
}
