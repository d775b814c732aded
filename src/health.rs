//! 健康检查：探测键值存储可达性。

use axum::extract::Extension;
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::lock::ResourceLockManager;

/// 存储可达返回 204，否则 503。
pub async fn health_check(
    Extension(locks): Extension<Arc<ResourceLockManager>>,
) -> Result<StatusCode, ApiError> {
    locks.store().ping().await.map_err(|err| {
        warn!(error = %err, "store health check failed");
        ApiError::ServiceUnavailable(format!("store unavailable: {err}"))
    })?;
    Ok(StatusCode::NO_CONTENT)
}
