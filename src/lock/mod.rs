//! 基于键值存储的资源锁管理器。
//!
//! `lock`、`unlock`、`unlink`、`check_lock`、`clear_all` 是直接的存储操作；
//! 互斥由 [`ResourceLockManager::acquire`] 与 [`ResourceLockManager::release`] 在其上实现。
//!
//! [`AcquireMode::CheckThenSet`] 下两个并发请求可能同时看到键不存在并都成功，锁仅为建议性；
//! [`AcquireMode::SetIfAbsent`] 用一次条件写入消除该窗口。

mod bulk;
mod key;

pub use self::bulk::{BulkLockOrchestrator, BulkOutcome};
pub use self::key::{LockKey, namespace_prefix};

use clap::ValueEnum;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{DEFAULT_LOCK_TTL_SECS, LOCKED_STATUS};
use crate::kv::{KeyValueStore, StoreResult};

/// [`ResourceLockManager::acquire`] 判断键是否空闲的方式。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AcquireMode {
    /// 先读后写，两次存储往返。
    #[default]
    CheckThenSet,
    /// 一次 `SET NX` 条件写入。
    SetIfAbsent,
}

/// 删除锁记录所用的存储调用。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deletion {
    Blocking,
    Deferred,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    Locked,
    Conflict { status: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    NotFound,
}

#[derive(Clone, Copy, Debug)]
pub struct LockSettings {
    pub ttl: Duration,
    pub acquire_mode: AcquireMode,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_LOCK_TTL_SECS),
            acquire_mode: AcquireMode::default(),
        }
    }
}

pub struct ResourceLockManager {
    store: Arc<dyn KeyValueStore>,
    settings: LockSettings,
}

impl ResourceLockManager {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: LockSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// 写入 LOCKED 并刷新过期时间，不检查是否已被锁定。
    pub async fn lock(&self, key: &LockKey) -> StoreResult<()> {
        self.store
            .set(&key.storage_key(), LOCKED_STATUS, self.settings.ttl)
            .await
    }

    /// 阻塞式删除；键不存在时同样成功。
    pub async fn unlock(&self, key: &LockKey) -> StoreResult<()> {
        self.store.delete(&key.storage_key()).await?;
        Ok(())
    }

    /// 非阻塞删除（UNLINK），对调用方而言与 unlock 等价。
    pub async fn unlink(&self, key: &LockKey) -> StoreResult<()> {
        self.store.unlink(&key.storage_key()).await?;
        Ok(())
    }

    pub async fn check_lock(&self, key: &LockKey) -> StoreResult<Option<String>> {
        self.store.get(&key.storage_key()).await
    }

    /// 逐个删除锁命名空间下的全部记录，返回删除数量。
    ///
    /// 与并发的加锁、解锁之间不保证原子性。
    pub async fn clear_all(&self) -> StoreResult<usize> {
        let keys = self.store.scan_prefix(&namespace_prefix()).await?;
        let mut cleared = 0;
        for raw in keys {
            if !self.store.delete(&raw).await? {
                continue;
            }
            cleared += 1;
            match LockKey::parse(&raw) {
                Some(key) => debug!(
                    resource_key = key.resource(),
                    sub_key = key.sub_key(),
                    "lock cleared"
                ),
                None => debug!(key = raw, "unrecognized record cleared"),
            }
        }
        debug!(cleared, "cleared lock namespace");
        Ok(cleared)
    }

    /// 获取锁：已存在则返回冲突，不覆盖现有记录。
    pub async fn acquire(&self, key: &LockKey) -> StoreResult<AcquireOutcome> {
        match self.settings.acquire_mode {
            AcquireMode::CheckThenSet => {
                if let Some(status) = self.check_lock(key).await? {
                    return Ok(AcquireOutcome::Conflict { status });
                }
                self.lock(key).await?;
            }
            AcquireMode::SetIfAbsent => {
                let written = self
                    .store
                    .set_if_absent(&key.storage_key(), LOCKED_STATUS, self.settings.ttl)
                    .await?;
                if !written {
                    // 持有者可能已释放，仍按 LOCKED 报告
                    let status = self
                        .check_lock(key)
                        .await?
                        .unwrap_or_else(|| LOCKED_STATUS.to_string());
                    return Ok(AcquireOutcome::Conflict { status });
                }
            }
        }
        debug!(key = %key, "lock acquired");
        Ok(AcquireOutcome::Locked)
    }

    /// 释放锁：未锁定时返回 NotFound。
    pub async fn release(
        &self,
        key: &LockKey,
        deletion: Deletion,
    ) -> StoreResult<ReleaseOutcome> {
        if !self.store.exists(&key.storage_key()).await? {
            return Ok(ReleaseOutcome::NotFound);
        }
        match deletion {
            Deletion::Blocking => self.unlock(key).await?,
            Deletion::Deferred => self.unlink(key).await?,
        }
        debug!(key = %key, ?deletion, "lock released");
        Ok(ReleaseOutcome::Released)
    }
}
