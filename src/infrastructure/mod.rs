// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含与外部系统交互的技术实现：
/// - 缓存（cache）：Redis 与内存两种键值存储，以及网关缓存的命名空间与失效逻辑
/// - HTTP客户端（http_client）：访问内部服务的共享客户端
/// - 指标（metrics）：Prometheus 记录器
/// - 代理（proxy）：后端路由与请求转发
/// - 服务实现（services）：领域服务接口的具体实现
///
/// 基础设施层依赖领域层的抽象接口，领域层不感知具体技术。
pub mod cache;
pub mod http_client;
pub mod metrics;
pub mod proxy;
pub mod services;
