// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::infrastructure::proxy::backend_router::BackendService;

/// 汇总各服务的统计，失败的服务为 null
pub fn build_overview(results: Vec<(BackendService, Option<Value>)>) -> Value {
    let mut services = Map::new();
    let mut available = 0;
    for (service, value) in results {
        if value.is_some() {
            available += 1;
        }
        services.insert(service.as_str().to_string(), value.unwrap_or(Value::Null));
    }
    json!({
        "services": services,
        "available": available,
        "total": BackendService::ALL.len(),
        "generatedAt": Utc::now().to_rfc3339(),
    })
}
