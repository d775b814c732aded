//! Redis 后端：过期依赖 Redis 原生 EX。

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::time::Duration;
use tracing::info;

use super::{KeyValueStore, StoreError, StoreResult};

const SCAN_BATCH: usize = 500;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`RedisStore`] 连接参数。
#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// 建立连接管理器，超时返回 Connection 错误。
    pub async fn connect(settings: &RedisSettings) -> StoreResult<Self> {
        let mut info = (settings.host.as_str(), settings.port).into_connection_info()?;
        info.redis.db = settings.db;
        info.redis.password = settings.password.clone().filter(|value| !value.is_empty());
        let client = redis::Client::open(info)?;
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                StoreError::Connection(format!(
                    "timed out connecting to {}:{}",
                    settings.host, settings.port
                ))
            })??;
        info!(
            host = %settings.host,
            port = settings.port,
            db = settings.db,
            "connected to redis"
        );
        Ok(Self { conn })
    }
}

fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// 转义 SCAN MATCH 的通配字符，使前缀按字面匹配。
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        // 键已存在时 SET NX 返回 nil
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(expiry_secs(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn unlink(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.unlink(key).await?;
        Ok(removed > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN 可能重复返回同一个键
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_glob_quotes_pattern_characters() {
        assert_eq!(escape_glob("RLOCK:"), "RLOCK:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
        assert_eq!(escape_glob("x\\:y"), "x\\\\:y");
    }

    #[test]
    fn expiry_never_rounds_to_zero() {
        assert_eq!(expiry_secs(Duration::from_millis(200)), 1);
        assert_eq!(expiry_secs(Duration::from_secs(86_400)), 86_400);
    }

    /// 需要可用的 Redis：`REDIS_HOST=127.0.0.1 cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn live_redis_round_trip() {
        let Ok(host) = std::env::var("REDIS_HOST") else {
            return;
        };
        let port = std::env::var("REDIS_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(6379);
        let store = RedisStore::connect(&RedisSettings {
            host,
            port,
            db: 0,
            password: std::env::var("REDIS_PASSWORD").ok(),
        })
        .await
        .unwrap();
        let ttl = Duration::from_secs(30);
        let prefix = format!("RLOCKTEST{}:", std::process::id());

        store.ping().await.unwrap();

        let key = format!("{prefix}nx");
        assert!(store.set_if_absent(&key, "LOCKED", ttl).await.unwrap());
        assert!(!store.set_if_absent(&key, "LOCKED", ttl).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("LOCKED"));
        assert!(store.exists(&key).await.unwrap());

        let mut expected = vec![key.clone()];
        for index in 0..1200 {
            let key = format!("{prefix}{index:04}");
            store.set(&key, "LOCKED", ttl).await.unwrap();
            expected.push(key);
        }
        expected.sort();
        assert_eq!(store.scan_prefix(&prefix).await.unwrap(), expected);

        for key in &expected {
            assert!(store.unlink(key).await.unwrap());
        }
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.scan_prefix(&prefix).await.unwrap().is_empty());
    }
}
