//! CLI arguments and server configuration defaults.

use clap::{Parser, ValueEnum};
use shadow_rs::formatcp;
use std::time::Duration;

use crate::build;
use crate::kv::RedisSettings;
use crate::lock::{AcquireMode, LockSettings};

const VERSION_INFO: &str = formatcp!(
    r#"{}\ncommit_hash: {}\nbuild_time: {}\nbuild_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

pub const LOCK_NAMESPACE: &str = "RLOCK";
pub const DEFAULT_SUB_KEY: &str = "default";
pub const LOCKED_STATUS: &str = "LOCKED";
pub const DEFAULT_LOCK_TTL_SECS: u64 = 24 * 60 * 60;
pub const MAX_LOCK_TTL_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_PORT: u16 = 5063;
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const MEMORY_PRUNE_INTERVAL_SECS: u64 = 300;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;
pub const DEFAULT_LOG_FILTER: &str = "info,redis=warn";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Redis,
    /// In-process store; locks are not shared between instances.
    Memory,
}

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "dataops-lock", version = VERSION_INFO, about = "Dataops resource lock service")]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        env = "DATAOPS_HOST",
        default_value = "127.0.0.1",
        help = "Bind address"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "DATAOPS_PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "DATAOPS_STORE",
        value_enum,
        default_value_t = StoreBackend::Redis,
        help = "Key/value store backing the locks"
    )]
    pub store: StoreBackend,
    #[arg(
        long,
        env = "REDIS_HOST",
        default_value = "127.0.0.1",
        help = "Redis host"
    )]
    pub redis_host: String,
    #[arg(
        long,
        env = "REDIS_PORT",
        default_value_t = DEFAULT_REDIS_PORT,
        help = "Redis port"
    )]
    pub redis_port: u16,
    #[arg(long, env = "REDIS_DB", default_value_t = 0, help = "Redis database index")]
    pub redis_db: i64,
    #[arg(
        long,
        env = "REDIS_PASSWORD",
        hide_env_values = true,
        help = "Redis password"
    )]
    pub redis_password: Option<String>,
    #[arg(
        long,
        env = "DATAOPS_LOCK_TTL_SECS",
        default_value_t = DEFAULT_LOCK_TTL_SECS,
        value_parser = clap::value_parser!(u64).range(1..=MAX_LOCK_TTL_SECS),
        help = "Lifetime of a lock record in seconds"
    )]
    pub lock_ttl_secs: u64,
    #[arg(
        long,
        env = "DATAOPS_ACQUIRE_MODE",
        value_enum,
        default_value_t = AcquireMode::CheckThenSet,
        help = "check-then-set keeps the advisory read+write; set-if-absent acquires atomically"
    )]
    pub acquire_mode: AcquireMode,
    #[arg(long, env = "DATAOPS_CORS_ORIGINS", help = "Comma separated CORS origins")]
    pub cors_origins: Option<String>,
    #[arg(
        long,
        env = "DATAOPS_LOG",
        default_value = DEFAULT_LOG_FILTER,
        help = "Log filter directives used when RUST_LOG is unset"
    )]
    pub log_filter: String,
}

impl Args {
    pub fn lock_settings(&self) -> LockSettings {
        LockSettings {
            ttl: Duration::from_secs(self.lock_ttl_secs),
            acquire_mode: self.acquire_mode,
        }
    }

    pub fn redis_settings(&self) -> RedisSettings {
        RedisSettings {
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
            password: self.redis_password.clone(),
        }
    }
}
