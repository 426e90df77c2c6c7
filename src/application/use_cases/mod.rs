// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// - 缓存失效（cache_invalidation）：代理写操作成功后的缓存清理
/// - 管理概览（admin_overview）：汇总各服务的管理统计
pub mod admin_overview;
pub mod cache_invalidation;
