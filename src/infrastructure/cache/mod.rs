// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供键值存储接口及其 Redis / 内存实现、键命名空间和网关缓存
pub mod cache_keys;
pub mod cache_store;
pub mod gateway_cache;
pub mod memory_store;
pub mod redis_client;
