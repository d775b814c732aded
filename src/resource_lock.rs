//! 资源锁 HTTP 处理器：单键、批量与清理。

use axum::extract::{Extension, Json, Query};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LOCKED_STATUS;
use crate::error::ApiError;
use crate::lock::{
    AcquireOutcome, BulkLockOrchestrator, BulkOutcome, Deletion, LockKey, ReleaseOutcome,
    ResourceLockManager,
};
use crate::response::ApiResponse;

/// 调用方声明的操作类型，仅记录日志；已有的锁无论类型都会阻止新锁。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockOperation {
    Read,
    Write,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LockRequest {
    resource_key: String,
    operation: LockOperation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkLockRequest {
    resource_keys: Vec<String>,
    operation: LockOperation,
}

#[derive(Debug, Serialize)]
pub struct LockStatus {
    key: String,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearedLocks {
    key: &'static str,
    status: &'static str,
    cleared: usize,
}

type LockResponse = Result<ApiResponse<LockStatus>, ApiError>;
type BulkResponse = Result<ApiResponse<Vec<(String, bool)>>, ApiError>;

fn require_key(resource_key: &str) -> Result<(), ApiError> {
    if resource_key.is_empty() {
        return Err(ApiError::BadRequest("resource_key is required".into()));
    }
    Ok(())
}

/// 加锁：已锁定返回 409。
pub async fn acquire_lock(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
    Json(LockRequest {
        resource_key,
        operation,
    }): Json<LockRequest>,
) -> LockResponse {
    require_key(&resource_key)?;
    let key = LockKey::new(resource_key.as_str());
    match locks.acquire(&key).await? {
        AcquireOutcome::Locked => {
            info!(resource_key, ?operation, "resource locked");
            Ok(ApiResponse::ok(LockStatus {
                key: resource_key,
                status: Some(LOCKED_STATUS.to_string()),
            }))
        }
        AcquireOutcome::Conflict { status } => {
            info!(resource_key, ?operation, status, "resource already locked");
            let message = format!("resource {resource_key} is already locked");
            Ok(ApiResponse::with_status(
                StatusCode::CONFLICT,
                LockStatus {
                    key: resource_key,
                    status: Some(status),
                },
            )
            .error_msg(message))
        }
    }
}

/// 解锁：未锁定返回 400。
pub async fn release_lock(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
    Json(LockRequest {
        resource_key,
        operation,
    }): Json<LockRequest>,
) -> LockResponse {
    require_key(&resource_key)?;
    let key = LockKey::new(resource_key.as_str());
    let status = match locks.release(&key, Deletion::Blocking).await? {
        ReleaseOutcome::Released => {
            info!(resource_key, ?operation, "resource unlocked");
            StatusCode::OK
        }
        ReleaseOutcome::NotFound => {
            info!(resource_key, ?operation, "no lock to release");
            StatusCode::BAD_REQUEST
        }
    };
    let response = ApiResponse::with_status(
        status,
        LockStatus {
            key: resource_key,
            status: None,
        },
    );
    Ok(if status == StatusCode::OK {
        response
    } else {
        response.error_msg("resource lock not found")
    })
}

/// 查询锁状态；未锁定时 status 为 null。
pub async fn lock_status(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
    Query(LockRequest { resource_key, .. }): Query<LockRequest>,
) -> LockResponse {
    require_key(&resource_key)?;
    let status = locks
        .check_lock(&LockKey::new(resource_key.as_str()))
        .await?;
    Ok(ApiResponse::ok(LockStatus {
        key: resource_key,
        status,
    }))
}

fn bulk_response(
    outcome: BulkOutcome,
    failure: StatusCode,
    message: &str,
) -> ApiResponse<Vec<(String, bool)>> {
    if outcome.all_succeeded() {
        ApiResponse::ok(outcome.into_results())
    } else {
        ApiResponse::with_status(failure, outcome.into_results()).error_msg(message)
    }
}

fn require_keys(resource_keys: &[String]) -> Result<(), ApiError> {
    resource_keys.iter().try_for_each(|key| require_key(key))
}

/// 批量加锁：遇到冲突即停止，返回 409 与逐键结果。
pub async fn bulk_acquire(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
    Json(BulkLockRequest {
        resource_keys,
        operation,
    }): Json<BulkLockRequest>,
) -> BulkResponse {
    require_keys(&resource_keys)?;
    let outcome = BulkLockOrchestrator::new(&locks)
        .lock_all(&resource_keys)
        .await?;
    if outcome.all_succeeded() {
        info!(count = resource_keys.len(), ?operation, "bulk lock succeeded");
    } else {
        warn!(
            count = resource_keys.len(),
            ?operation,
            "bulk lock hit an existing lock"
        );
    }
    Ok(bulk_response(
        outcome,
        StatusCode::CONFLICT,
        "some resources are already locked",
    ))
}

/// 批量解锁：逐键尝试，任一失败返回 400。
pub async fn bulk_release(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
    Json(BulkLockRequest {
        resource_keys,
        operation,
    }): Json<BulkLockRequest>,
) -> BulkResponse {
    require_keys(&resource_keys)?;
    let outcome = BulkLockOrchestrator::new(&locks)
        .unlock_all(&resource_keys)
        .await?;
    if outcome.all_succeeded() {
        info!(count = resource_keys.len(), ?operation, "bulk unlock succeeded");
    } else {
        warn!(
            count = resource_keys.len(),
            ?operation,
            "bulk unlock found unlocked resources"
        );
    }
    Ok(bulk_response(
        outcome,
        StatusCode::BAD_REQUEST,
        "some resources were not locked",
    ))
}

/// 清空全部锁，仅用于维护与测试环境。
pub async fn clear_locks(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
) -> Result<ApiResponse<ClearedLocks>, ApiError> {
    let cleared = locks.clear_all().await?;
    warn!(cleared, "all resource locks cleared");
    Ok(ApiResponse::ok(ClearedLocks {
        key: "all",
        status: "UNLOCKED",
        cleared,
    }))
}
