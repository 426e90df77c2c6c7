// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 请求准入中间件
///
/// 执行顺序：校验 -> 限流 -> 事件配额，任何一步都可以提前返回
pub mod admin_auth_middleware;
pub mod events_quota_middleware;
pub mod rate_limit_middleware;
pub mod validation_middleware;
