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

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gatewayrs::infrastructure::cache::cache_keys;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{
    body_json, envelope, event_request, settings_for, user_record, website_record, TestGateway,
    API_KEY, TOKEN,
};

/// 受保护路径缺少令牌时返回401
#[tokio::test]
async fn protected_path_without_token_returns_401() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/workflows/42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/workflows/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "authorization header required");
}

/// 有效令牌的请求被转发，并注入用户头
#[tokio::test]
async fn protected_path_with_token_is_proxied_with_user_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/auth/validate"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "user": user_record("u1", None)
        }))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/42"))
        .and(header("x-user-id", "u1"))
        .and(header("x-user-plan", "pro"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    for _ in 0..2 {
        let response = gateway
            .send(
                Request::builder()
                    .uri("/api/v1/workflows/42")
                    .header("authorization", format!("Bearer {}", TOKEN))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], 42);
    }
}

/// 非JWT结构的令牌不会发往用户服务
#[tokio::test]
async fn malformed_token_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/user/auth/validate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/user/profile")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// 公开事件被转发，附带站点头，校验结果按30分钟缓存
#[tokio::test]
async fn public_event_is_validated_once_and_proxied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .and(header("x-api-key", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(website_record("abc123", "example.com"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analytics/event"))
        .and(header("x-site-id", "abc123"))
        .and(header("x-website-id", "abc123"))
        .and(header("x-website-domain", "example.com"))
        .and(header("x-website-user-id", "u1"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    for _ in 0..2 {
        let response = gateway.send(event_request("abc123", "example.com")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.headers().contains_key("x-ratelimit-limit"));
    }

    let key = cache_keys::validation_key(Some("abc123"), Some("example.com")).unwrap();
    let ttl = gateway.store.ttl(&key).expect("validation result cached");
    assert!(ttl > Duration::from_secs(1790) && ttl <= Duration::from_secs(1800));
}

/// 校验失败不缓存，每次都会询问用户服务
#[tokio::test]
async fn failed_validation_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "message": "website not found"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    for _ in 0..2 {
        let response = gateway.send(event_request("missing1", "example.com")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let key = cache_keys::validation_key(Some("missing1"), Some("example.com")).unwrap();
    assert!(gateway.store.ttl(&key).is_none());
}

/// 缺少站点身份时返回403
#[tokio::test]
async fn public_event_without_identity_is_forbidden() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    let response = gateway
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/v1/analytics/event")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"name":"pageview"}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 来源绑定路径缺少 Origin 时拒绝，且不调用用户服务
#[tokio::test]
async fn origin_bound_path_requires_origin() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/user/websites/validate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/workflows/active?siteId=abc123")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 不同来源的校验结果互不复用
#[tokio::test]
async fn origin_bound_results_are_cached_per_origin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .and(header("origin", "https://good.example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(website_record("abc123", "good.example.com"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .and(header("origin", "https://evil.example.net"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "message": "origin not allowed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let request = |origin: &str| {
        Request::builder()
            .uri("/api/v1/workflows/active?siteId=abc123")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let good = gateway.send(request("https://good.example.com")).await;
    assert_eq!(good.status(), StatusCode::OK);
    let evil = gateway.send(request("https://evil.example.net")).await;
    assert_eq!(evil.status(), StatusCode::FORBIDDEN);
    let good_again = gateway.send(request("https://good.example.com")).await;
    assert_eq!(good_again.status(), StatusCode::OK);
}

/// 指向他人网站的请求返回403
#[tokio::test]
async fn ownership_mismatch_is_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(user_record("u1", None))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/websites/site42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "websiteId": "site42",
            "userId": "someone-else"
        }))))
        .mount(&server)
        .await;
    Mock::given(path("/api/v1/analytics/websites/site42/stats"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/analytics/websites/site42/stats")
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// 未配置的后端返回503
#[tokio::test]
async fn unconfigured_backend_returns_503() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(website_record("abc123", "example.com"))),
        )
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.services.analytics_url = None;
    let gateway = TestGateway::new(settings);

    let response = gateway.send(event_request("abc123", "example.com")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// 含 `..` 段的路径直接拒绝
#[tokio::test]
async fn dot_segments_are_rejected() {
    let server = MockServer::start().await;
    let gateway = TestGateway::new(settings_for(&server));

    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/analytics/event/../../user/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// 编码后的点段不能把免校验路径改写到内部接口
#[tokio::test]
async fn encoded_dot_segments_cannot_reach_internal_routes() {
    let server = MockServer::start().await;
    Mock::given(path("/api/v1/user/internal/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ALL USERS"))
        .expect(0)
        .mount(&server)
        .await;
    let gateway = TestGateway::new(settings_for(&server));

    for (verb, uri) in [
        ("GET", "/api/v1/user/webhooks/%2e%2e/internal/admin/users"),
        ("GET", "/api/v1/user/webhooks/%2E%2E/internal/admin/users"),
        ("GET", "/api/v1/user/webhooks/.%2e/internal/admin/users"),
        ("OPTIONS", "/api/v1/user/webhooks/%2e%2e/internal/admin/users"),
    ] {
        let response = gateway
            .send(
                Request::builder()
                    .method(verb)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", verb, uri);
    }
}

/// 编码后的点段不能让批量上报绕过配额
#[tokio::test]
async fn encoded_dot_segments_cannot_skip_event_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/websites/validate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(website_record("abc123", "example.com"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analytics/event/batch"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.features.cloud_enabled = true;
    settings.quota.free_limit = 1;
    let gateway = TestGateway::new(settings);

    for _ in 0..3 {
        let response = gateway
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/analytics/event/%2e/batch")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({ "siteId": "abc123", "domain": "example.com" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
