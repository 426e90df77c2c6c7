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

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use gatewayrs::config::settings::Settings;
use gatewayrs::infrastructure::cache::cache_store::CacheStore;
use gatewayrs::infrastructure::cache::memory_store::MemoryCacheStore;
use gatewayrs::infrastructure::cache::redis_client::RedisClient;
use gatewayrs::infrastructure::metrics::init_metrics;
use gatewayrs::presentation::routes::build_router;
use gatewayrs::presentation::state::AppState;
use gatewayrs::utils::telemetry;
use gatewayrs::workers::QuotaSyncWorker;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging and metrics
    telemetry::init_telemetry();
    info!("Starting gatewayrs v{}", env!("CARGO_PKG_VERSION"));
    let metrics = init_metrics();

    // 2. Load configuration
    let settings = Arc::new(Settings::new().context("failed to load configuration")?);
    info!("Configuration loaded");

    // 3. Cache backend
    let store: Arc<dyn CacheStore> = if settings.redis.backend.eq_ignore_ascii_case("memory") {
        warn!("Using in-process memory cache, counters are not shared between instances");
        Arc::new(MemoryCacheStore::new())
    } else {
        Arc::new(
            RedisClient::connect(&settings.redis.url)
                .await
                .context("failed to connect to Redis")?,
        )
    };

    // 4. Shared state
    let state = AppState::build(settings.clone(), store.clone(), metrics)
        .context("failed to build HTTP client")?;

    // 5. Background workers
    let sync_worker = if settings.features.cloud_enabled {
        let worker = QuotaSyncWorker::new(
            state.quota.clone(),
            state.user_service.clone(),
            &settings.quota,
        );
        Some(worker.start())
    } else {
        info!("Cloud features disabled, events quota sync not started");
        None
    };

    // 6. Start HTTP server
    let app = build_router(state);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(handle) = sync_worker {
        handle.abort();
    }
    if let Err(e) = store.close().await {
        warn!("Cache store did not close cleanly: {}", e);
    }
    info!("gatewayrs stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
