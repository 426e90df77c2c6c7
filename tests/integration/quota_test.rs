// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use gatewayrs::domain::models::quota::{month_year, Plan};
use gatewayrs::domain::services::quota_service::EventsQuotaService;
use gatewayrs::infrastructure::cache::cache_keys;
use gatewayrs::infrastructure::cache::cache_store::CacheStore;
use gatewayrs::workers::QuotaSyncWorker;
use serde_json::json;
use wiremock::matchers::{body_json as request_body, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{
    body_json, envelope, event_request, settings_for, website_record, TestGateway, API_KEY,
};

async fn mount_event_backend(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(website_record("abc123", "example.com"))),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analytics/event"))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

/// 达到月度上限后返回429并提示升级
#[tokio::test]
async fn events_over_monthly_limit_are_rejected() {
    let server = MockServer::start().await;
    mount_event_backend(&server).await;

    let mut settings = settings_for(&server);
    settings.features.cloud_enabled = true;
    settings.quota.free_limit = 2;
    let gateway = TestGateway::new(settings);

    for _ in 0..2 {
        let response = gateway.send(event_request("abc123", "example.com")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = gateway.send(event_request("abc123", "example.com")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["current"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["plan"], "free");
    assert_eq!(body["upgrade_required"], true);

    let month = month_year(Utc::now());
    assert_eq!(
        gateway.state.quota.current_usage("u1", &month).await.unwrap(),
        2
    );
}

/// 关闭云端功能时不计配额
#[tokio::test]
async fn quota_is_skipped_without_cloud_features() {
    let server = MockServer::start().await;
    mount_event_backend(&server).await;

    let mut settings = settings_for(&server);
    settings.quota.free_limit = 1;
    let gateway = TestGateway::new(settings);

    for _ in 0..3 {
        let response = gateway.send(event_request("abc123", "example.com")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    let month = month_year(Utc::now());
    assert_eq!(
        gateway.store.get(&cache_keys::events_key("u1", &month)).await.unwrap(),
        None
    );
}

/// 用户服务确认后清除待同步计数
#[tokio::test]
async fn sync_confirmed_by_user_service_clears_pending() {
    let server = MockServer::start().await;
    let month = month_year(Utc::now());
    Mock::given(method("POST"))
        .and(path("/api/v1/user/internal/events/sync"))
        .and(header("x-api-key", API_KEY))
        .and(request_body(json!({
            "monthYear": month,
            "users": [{ "userId": "u1", "count": 4 }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let gateway = TestGateway::new(settings.clone());
    gateway
        .state
        .quota
        .check_and_increment("u1", Plan::Free, 4)
        .await
        .unwrap();

    let worker = QuotaSyncWorker::new(
        gateway.state.quota.clone(),
        gateway.state.user_service.clone(),
        &settings.quota,
    );
    let report = worker.run_once().await.unwrap();

    assert_eq!(report.events_synced, 4);
    assert_eq!(
        gateway.store.get(&cache_keys::events_key("u1", &month)).await.unwrap(),
        None
    );
    assert_eq!(gateway.state.quota.current_usage("u1", &month).await.unwrap(), 4);
}

/// 非200响应不结算，计数保留到下一轮
#[tokio::test]
async fn sync_without_plain_200_keeps_pending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/internal/events/sync"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings_for(&server);
    let gateway = TestGateway::new(settings.clone());
    gateway
        .state
        .quota
        .check_and_increment("u1", Plan::Free, 4)
        .await
        .unwrap();

    let worker = QuotaSyncWorker::new(
        Arc::clone(&gateway.state.quota),
        Arc::clone(&gateway.state.user_service),
        &settings.quota,
    );
    let report = worker.run_once().await.unwrap();

    assert_eq!(report.batches_failed, 1);
    let month = month_year(Utc::now());
    assert_eq!(
        gateway.store.get(&cache_keys::events_key("u1", &month)).await.unwrap(),
        Some("4".to_string())
    );
}
