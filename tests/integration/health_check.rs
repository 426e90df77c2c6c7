// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use wiremock::MockServer;

use super::helpers::{body_json, settings_for, TestGateway};

/// 健康检查端点
///
/// 内存存储始终可达，状态为 ok
#[tokio::test]
async fn health_check_works() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    for uri in ["/", "/health"] {
        let response = gateway
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["redis"], "ok");
        assert_eq!(body["service"], "gatewayrs");
    }
}

#[tokio::test]
async fn robots_disallows_everything() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    let response = gateway
        .send(Request::builder().uri("/robots.txt").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Disallow: /"));
}

#[tokio::test]
async fn favicon_is_empty() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    let response = gateway
        .send(Request::builder().uri("/favicon.ico").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// 没有后端前缀的路径返回404
#[tokio::test]
async fn unknown_path_is_not_found() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/partners/webhooks/incoming")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
