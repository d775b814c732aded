//! 进程内键值存储：带过期时间，读取时惰性判定过期。

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{KeyValueStore, StoreError, StoreResult};

/// 进程内存储，每个条目独立过期。
///
/// 过期条目对所有操作不可见；[`MemoryStore::prune_expired`] 只负责回收内存。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: BTreeMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// 计算过期时刻，溢出时返回错误。
fn expiry_deadline(now: Instant, ttl: Duration) -> StoreResult<Instant> {
    now.checked_add(ttl).ok_or(StoreError::ExpiryOutOfRange(ttl))
}

impl StoreState {
    fn live(&self, key: &str, now: Instant) -> Option<&Entry> {
        self.entries.get(key).filter(|entry| entry.is_live(now))
    }

    fn remove_live(&mut self, key: &str, now: Instant) -> bool {
        match self.entries.remove(key) {
            Some(entry) => entry.is_live(now),
            None => false,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清理已过期条目，返回清理数量。
    pub async fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.inner.lock().await;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_live(now));
        before - state.entries.len()
    }

    #[cfg(test)]
    pub(crate) async fn raw_len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.inner.lock().await;
        Ok(state
            .live(key, Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let expires_at = expiry_deadline(Instant::now(), ttl)?;
        let mut state = self.inner.lock().await;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let expires_at = expiry_deadline(now, ttl)?;
        let mut state = self.inner.lock().await;
        if state.live(key, now).is_some() {
            return Ok(false);
        }
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut state = self.inner.lock().await;
        Ok(state.remove_live(key, Instant::now()))
    }

    async fn unlink(&self, key: &str) -> StoreResult<bool> {
        self.delete(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let state = self.inner.lock().await;
        Ok(state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let state = self.inner.lock().await;
        Ok(state.live(key, Instant::now()).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
