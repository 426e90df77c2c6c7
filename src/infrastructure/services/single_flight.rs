// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// 按键合并并发的冷缓存请求
///
/// 同一个键同时只有一个任务持有锁去请求上游，其余任务等待后重新读取缓存。
/// 锁表只存在于进程内，最后一个持有者释放时删除对应条目。
#[derive(Clone, Debug, Default)]
pub struct SingleFlight {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// 持有期间独占某个键
pub struct FlightGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    _guard: OwnedMutexGuard<()>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某个键的锁
    pub async fn acquire(&self, key: &str) -> FlightGuard {
        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        FlightGuard {
            key: key.to_string(),
            locks: self.locks.clone(),
            _guard: guard,
        }
    }

    /// 当前存在的锁条目数
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        // Table entry plus our own guard: nobody else is waiting.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) <= 2);
    }
}
