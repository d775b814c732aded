//! 路由表：锁接口挂在 /v2，其余在 /v1。

use axum::extract::Extension;
use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use std::sync::Arc;

use crate::lock::ResourceLockManager;
use crate::{health, http, resource_lock, version};

pub fn build_router(locks: Arc<ResourceLockManager>) -> Router {
    let lock_routes = post(resource_lock::acquire_lock)
        .delete(resource_lock::release_lock)
        .get(resource_lock::lock_status);
    let bulk_routes = post(resource_lock::bulk_acquire).delete(resource_lock::bulk_release);

    Router::new()
        .route("/v2/resource/lock", lock_routes.clone())
        .route("/v2/resource/lock/", lock_routes)
        .route("/v2/resource/lock/bulk", bulk_routes.clone())
        .route("/v2/resource/lock/bulk/", bulk_routes)
        .route("/v2/resource/lock/all", delete(resource_lock::clear_locks))
        .route("/v1/health", get(health::health_check))
        .route("/v1/version", get(version::get_version_info))
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(Extension(locks))
}
