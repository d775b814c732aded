//! 键值存储抽象：锁管理器只依赖这里的原语。

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::{RedisSettings, RedisStore};

use async_trait::async_trait;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("store connection: {0}")]
    Connection(String),
    #[error("expiry out of range: {0:?}")]
    ExpiryOutOfRange(Duration),
}

/// 锁管理器使用的异步键值操作。每次调用只尝试一次，不做重试。
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// 写入并覆盖原有值与过期时间。
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// 仅在键不存在时写入，返回是否写入成功。
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// 阻塞删除，返回键是否存在。
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// 非阻塞删除，内存由存储稍后回收。
    async fn unlink(&self, key: &str) -> StoreResult<bool>;

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    async fn ping(&self) -> StoreResult<()>;
}
