// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含网关准入的核心规则，包括：
/// - 领域模型（models）：路由分类、请求身份、网站、用户与配额
/// - 服务（services）：路由分类以及校验、限流、配额等服务接口
pub mod models;
pub mod services;
