// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理网关的配置设置，包括Redis、后端服务、缓存、限流与配额等配置
pub mod settings;
