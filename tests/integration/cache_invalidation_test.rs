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
use gatewayrs::domain::models::website::ValidationRecord;
use gatewayrs::infrastructure::cache::cache_keys;
use gatewayrs::infrastructure::cache::cache_store::CacheStore;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::{envelope, settings_for, user_record, website_record, TestGateway, TOKEN};

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/auth/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(user_record("u1", None))))
        .mount(server)
        .await;
}

fn authorized(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(json!({"name": "Renamed"}).to_string()))
        .unwrap()
}

/// 网站更新成功后清除其校验与归属缓存
#[tokio::test]
async fn website_update_clears_cached_validation() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/websites/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "websiteId": "abc123",
            "userId": "u1",
            "domain": "example.com"
        }))))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/websites/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let record: ValidationRecord =
        serde_json::from_value(website_record("abc123", "example.com")).unwrap();
    let validation_key = cache_keys::validation_key(Some("abc123"), Some("example.com")).unwrap();
    gateway
        .state
        .cache
        .set_json(&validation_key, &record, Duration::from_secs(1800))
        .await
        .unwrap();

    let response = gateway
        .send(authorized("PUT", "/api/v1/user/websites/abc123"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(gateway.store.get(&validation_key).await.unwrap(), None);
    assert_eq!(
        gateway.store.get(&cache_keys::website_key("abc123")).await.unwrap(),
        None
    );
}

/// 被后端拒绝的写操作不清缓存
#[tokio::test]
async fn failed_write_keeps_cache() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/internal/websites/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "websiteId": "abc123",
            "userId": "u1"
        }))))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/user/websites/abc123"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let record: ValidationRecord =
        serde_json::from_value(website_record("abc123", "example.com")).unwrap();
    let validation_key = cache_keys::validation_key(Some("abc123"), Some("example.com")).unwrap();
    gateway
        .state
        .cache
        .set_json(&validation_key, &record, Duration::from_secs(1800))
        .await
        .unwrap();

    let response = gateway
        .send(authorized("PUT", "/api/v1/user/websites/abc123"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(gateway.store.get(&validation_key).await.unwrap().is_some());
}

/// 登出后调用方令牌的缓存被清除
#[tokio::test]
async fn logout_clears_caller_token() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(authorized("POST", "/api/v1/user/auth/logout"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        gateway.store.get(&cache_keys::token_key(TOKEN)).await.unwrap(),
        None
    );
}

/// 只读请求不会清缓存
#[tokio::test]
async fn reads_keep_token_cache() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .mount(&server)
        .await;

    let gateway = TestGateway::new(settings_for(&server));
    let response = gateway
        .send(
            Request::builder()
                .uri("/api/v1/user/profile")
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(gateway
        .store
        .get(&cache_keys::token_key(TOKEN))
        .await
        .unwrap()
        .is_some());
}
