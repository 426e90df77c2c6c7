// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 服务响应信封与跨服务用例（缓存失效、管理统计汇总）
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含路由分类、身份与配额模型以及服务接口
pub mod domain;

/// 基础设施模块
///
/// 缓存存储、上游服务客户端、反向代理与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由、处理器和中间件
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 事件计数同步等后台任务
pub mod workers;
