// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use gatewayrs::domain::models::route::{RateLimitClass, RouteClass};
use gatewayrs::domain::services::route_classifier::{
    classify, events_cost, is_origin_bound, rate_limit_class, RouteClassifier,
};
use gatewayrs::infrastructure::proxy::backend_router::{resolve_backend, BackendService};

#[test]
fn every_public_path_has_a_backend() {
    for path in [
        "/api/v1/analytics/event",
        "/api/v1/analytics/event/batch",
        "/api/v1/analytics/track",
        "/api/v1/workflows/site/abc123",
        "/api/v1/workflows/active",
        "/api/v1/workflows/execution/action",
        "/api/v1/funnels/track",
        "/api/v1/funnels/active",
    ] {
        assert_eq!(classify(path), RouteClass::Public, "{}", path);
        assert!(resolve_backend(path).is_some(), "{}", path);
    }
}

#[test]
fn look_alike_paths_stay_protected() {
    for path in [
        "/api/v1/analytics/events",
        "/api/v1/analytics/eventsource",
        "/api/v1/workflows/site",
        "/api/v1/funnels/tracking",
        "/api/v1/user/auth/loginx",
    ] {
        assert_eq!(classify(path), RouteClass::Protected, "{}", path);
    }
}

#[test]
fn auth_endpoints_use_auth_ceiling() {
    let path = "/api/v1/user/auth/login";
    assert_eq!(rate_limit_class(path, classify(path)), RateLimitClass::Auth);
    let path = "/api/v1/user/auth/logout";
    assert_eq!(rate_limit_class(path, classify(path)), RateLimitClass::Protected);
}

#[test]
fn event_costs() {
    assert_eq!(events_cost("/api/v1/analytics/event", 10), Some(1));
    assert_eq!(events_cost("/api/v1/analytics/track", 10), Some(1));
    assert_eq!(events_cost("/api/v1/analytics/event/batch", 10), Some(10));
    assert_eq!(events_cost("/api/v1/analytics/events/stats", 10), None);
    assert_eq!(events_cost("/api/v1/funnels/track", 10), None);
}

#[test]
fn origin_binding_only_for_workflow_reads() {
    assert!(is_origin_bound("/api/v1/workflows/site/abc123"));
    assert!(is_origin_bound("/api/v1/workflows/active"));
    assert!(!is_origin_bound("/api/v1/analytics/event"));
}

#[test]
fn custom_tables_are_respected() {
    let classifier = RouteClassifier::new(&["/status"], &["/ingest/"]);
    assert_eq!(classifier.classify("/status"), RouteClass::Unprotected);
    assert_eq!(classifier.classify("/ingest/abc"), RouteClass::Public);
    assert_eq!(classifier.classify("/ingest"), RouteClass::Protected);
    assert_eq!(resolve_backend("/api/v1/privacy/export-account"), Some(BackendService::User));
}
