//! 内存存储的过期条目清理任务。
//!
//! Redis 自带过期，不需要此任务。

use std::time::Duration;
use tracing::debug;

use crate::config::MEMORY_PRUNE_INTERVAL_SECS;
use crate::kv::MemoryStore;

/// 启动后台任务，定期回收内存存储中已过期的锁记录。
pub fn spawn_memory_pruner(store: MemoryStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(MEMORY_PRUNE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let pruned = store.prune_expired().await;
            if pruned > 0 {
                debug!(pruned, "pruned expired entries");
            }
        }
    });
}
