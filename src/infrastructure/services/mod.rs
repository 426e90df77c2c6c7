// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施服务模块
///
/// 提供领域服务接口的实现：用户服务客户端、校验、限流与配额，
/// 以及管理接口客户端和单飞锁
pub mod admin_client;
pub mod quota_service_impl;
pub mod rate_limiting_service_impl;
pub mod single_flight;
pub mod user_service_client;
pub mod validation_service_impl;
