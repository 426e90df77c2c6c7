// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 后台工作器
///
/// 目前只有事件计数同步，随服务启动并在关闭时终止
pub mod quota_sync_worker;

pub use quota_sync_worker::QuotaSyncWorker;
