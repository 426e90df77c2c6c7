// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 反向代理模块
///
/// - 后端路由（backend_router）：路径到后端服务的映射
/// - 后端代理（backend_proxy）：请求转发与身份头注入
pub mod backend_proxy;
pub mod backend_router;
