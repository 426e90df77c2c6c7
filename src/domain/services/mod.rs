// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 路由分类（route_classifier）：按有序前缀表对请求路径分类
/// - 校验服务（validation_service）：网站校验、JWT认证与网站归属校验
/// - 限流服务（rate_limiting_service）：固定窗口限流
/// - 配额服务（quota_service）：每月事件配额与同步结算
/// - 用户服务（user_service）：用户服务内部接口的抽象
///
/// 除路由分类外均为接口定义，具体实现位于基础设施层。
pub mod quota_service;
pub mod rate_limiting_service;
pub mod route_classifier;
pub mod user_service;
pub mod validation_service;
