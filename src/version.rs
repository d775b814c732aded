//! 版本与运行参数：构建信息加上当前生效的锁配置。

use axum::extract::Extension;
use axum::response::Json as JsonResponse;
use serde::Serialize;
use std::sync::Arc;

use crate::config::LOCK_NAMESPACE;
use crate::lock::{AcquireMode, ResourceLockManager};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    version: &'static str,
    commit_hash: &'static str,
    build_time: &'static str,
    build_env: String,
    lock: LockProfile,
}

/// 当前生效的锁配置。
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockProfile {
    namespace: &'static str,
    ttl_secs: u64,
    acquire_mode: AcquireMode,
}

/// 返回版本信息与锁配置。
pub async fn get_version_info(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
) -> JsonResponse<VersionInfo> {
    let settings = locks.settings();
    JsonResponse(VersionInfo {
        version: crate::build::PKG_VERSION,
        commit_hash: crate::build::SHORT_COMMIT,
        build_time: crate::build::BUILD_TIME,
        build_env: format!(
            "{},{}",
            crate::build::RUST_VERSION,
            crate::build::RUST_CHANNEL
        ),
        lock: LockProfile {
            namespace: LOCK_NAMESPACE,
            ttl_secs: settings.ttl.as_secs(),
            acquire_mode: settings.acquire_mode,
        },
    })
}
