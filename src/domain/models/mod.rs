// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了网关准入层的核心数据结构，包括：
/// - 准入上下文（admission）：各阶段共享的身份信息与注入头
/// - 路由分类（route）：unprotected / public / protected 以及限流分类
/// - 请求身份（identity）：从请求中解析出的站点ID与域名
/// - 网站（website）：网站校验结果与归属信息
/// - 用户（user）：JWT校验后的用户身份
/// - 配额（quota）：套餐、每月上限与配额检查结果
pub mod admission;
pub mod identity;
pub mod quota;
pub mod route;
pub mod user;
pub mod website;
