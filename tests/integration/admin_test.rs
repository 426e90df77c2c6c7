// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{body_json, envelope, settings_for, user_record, TestGateway, TOKEN};

const ADMIN_CODE: &str = "open-sesame";

fn admin_gateway(server: &MockServer) -> TestGateway {
    let mut settings = settings_for(server);
    settings.security.admin_code = Some(ADMIN_CODE.to_string());
    settings.security.cors_origin = "https://admin.example.com/".to_string();
    TestGateway::new(settings)
}

fn admin_get(uri: &str, code: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(code) = code {
        builder = builder.header("x-admin-code", code);
    }
    builder.body(Body::empty()).unwrap()
}

/// 管理统计汇总三个服务，失败的服务为 null
#[tokio::test]
async fn stats_fan_out_reports_failed_service_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"users": 12}))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/analytics/internal/admin/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/internal/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflows": 3})))
        .mount(&server)
        .await;

    let gateway = admin_gateway(&server);
    let response = gateway
        .send(admin_get("/api/v1/admin/stats", Some(ADMIN_CODE)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["services"]["user"]["users"], 12);
    assert!(body["services"]["analytics"].is_null());
    assert_eq!(body["services"]["workflow"]["workflows"], 3);
    assert_eq!(body["available"], 2);
    assert_eq!(body["total"], 3);
}

/// 用户列表透传查询参数
#[tokio::test]
async fn users_listing_passes_query_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!({"items": [], "page": 2}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = admin_gateway(&server);
    let response = gateway
        .send(admin_get("/api/v1/admin/users?page=2", Some(ADMIN_CODE)))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["page"], 2);
}

/// 错误的管理口令被拒绝
#[tokio::test]
async fn wrong_admin_code_is_forbidden() {
    let server = MockServer::start().await;
    let gateway = admin_gateway(&server);

    let response = gateway
        .send(admin_get("/api/v1/admin/stats", Some("guess")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = gateway.send(admin_get("/api/v1/admin/stats", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// 管理员角色的JWT可以访问，普通用户不行
#[tokio::test]
async fn admin_role_token_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/auth/validate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(user_record("root", Some("admin")))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/admin/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({"items": []}))))
        .mount(&server)
        .await;

    let gateway = admin_gateway(&server);
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/admin/websites")
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_admin_token_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(user_record("u1", None))))
        .mount(&server)
        .await;

    let gateway = admin_gateway(&server);
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/admin/users")
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 预检请求由CORS层直接应答，不需要管理口令
#[tokio::test]
async fn preflight_is_answered_by_cors_layer() {
    let server = MockServer::start().await;
    let gateway = admin_gateway(&server);

    let response = gateway
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/admin/stats")
                .header("origin", "https://admin.example.com")
                .header("access-control-request-method", "GET")
                .header("access-control-request-headers", "x-admin-code")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://admin.example.com"
    );
}
