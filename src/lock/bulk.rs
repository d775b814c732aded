//! 批量加锁 / 解锁编排。
//!
//! 加锁遇到第一个冲突即停止，已加的锁保留；解锁逐个尝试全部键。

use tracing::debug;

use super::{AcquireOutcome, Deletion, LockKey, ReleaseOutcome, ResourceLockManager};
use crate::kv::StoreResult;

/// 按请求顺序记录每个键的结果。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    results: Vec<(String, bool)>,
}

impl BulkOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }

    pub fn into_results(self) -> Vec<(String, bool)> {
        self.results
    }
}

pub struct BulkLockOrchestrator<'a> {
    manager: &'a ResourceLockManager,
}

impl<'a> BulkLockOrchestrator<'a> {
    pub fn new(manager: &'a ResourceLockManager) -> Self {
        Self { manager }
    }

    /// 依次加锁，遇到已锁定的键即停止。
    ///
    /// 冲突键及其后的键记为 `false`，后续键不会访问存储；冲突前已加的锁保持锁定。
    pub async fn lock_all(&self, resource_keys: &[String]) -> StoreResult<BulkOutcome> {
        let mut results = Vec::with_capacity(resource_keys.len());
        let mut remaining = resource_keys.iter();

        for resource in remaining.by_ref() {
            let outcome = self.manager.acquire(&LockKey::new(resource.as_str())).await?;
            let locked = outcome == AcquireOutcome::Locked;
            results.push((resource.clone(), locked));
            if !locked {
                debug!(resource_key = %resource, "bulk lock stopped at conflict");
                break;
            }
        }
        results.extend(remaining.map(|resource| (resource.clone(), false)));

        Ok(BulkOutcome { results })
    }

    /// 依次释放全部键，前面失败不影响后续；未锁定的键记为 `false`。
    pub async fn unlock_all(&self, resource_keys: &[String]) -> StoreResult<BulkOutcome> {
        let mut results = Vec::with_capacity(resource_keys.len());
        for resource in resource_keys {
            let outcome = self
                .manager
                .release(&LockKey::new(resource.as_str()), Deletion::Deferred)
                .await?;
            results.push((resource.clone(), outcome == ReleaseOutcome::Released));
        }
        Ok(BulkOutcome { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::AcquireMode;
    use crate::lock::tests::memory_manager;

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn lock_all_locks_every_free_key() {
        let manager = memory_manager(AcquireMode::CheckThenSet);
        let orchestrator = BulkLockOrchestrator::new(&manager);

        let outcome = orchestrator.lock_all(&keys(&["a", "b"])).await.unwrap();

        assert!(outcome.all_succeeded());
        assert_eq!(
            outcome.into_results(),
            vec![("a".to_string(), true), ("b".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn lock_all_stops_at_first_conflict_without_rollback() {
        let manager = memory_manager(AcquireMode::CheckThenSet);
        manager.lock(&LockKey::new("k2")).await.unwrap();
        let orchestrator = BulkLockOrchestrator::new(&manager);

        let outcome = orchestrator
            .lock_all(&keys(&["k1", "k2", "k3"]))
            .await
            .unwrap();

        assert!(!outcome.all_succeeded());
        assert_eq!(
            outcome.into_results(),
            vec![
                ("k1".to_string(), true),
                ("k2".to_string(), false),
                ("k3".to_string(), false),
            ]
        );
        assert!(manager.check_lock(&LockKey::new("k1")).await.unwrap().is_some());
        assert_eq!(manager.check_lock(&LockKey::new("k3")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn lock_all_treats_duplicates_as_conflicts() {
        let manager = memory_manager(AcquireMode::SetIfAbsent);
        let orchestrator = BulkLockOrchestrator::new(&manager);

        let outcome = orchestrator
            .lock_all(&keys(&["a", "a", "b"]))
            .await
            .unwrap();

        assert_eq!(
            outcome.into_results(),
            vec![
                ("a".to_string(), true),
                ("a".to_string(), false),
                ("b".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn unlock_all_continues_past_missing_locks() {
        let manager = memory_manager(AcquireMode::CheckThenSet);
        manager.lock(&LockKey::new("k2")).await.unwrap();
        manager.lock(&LockKey::new("k3")).await.unwrap();
        let orchestrator = BulkLockOrchestrator::new(&manager);

        let outcome = orchestrator
            .unlock_all(&keys(&["k1", "k2", "k3"]))
            .await
            .unwrap();

        assert!(!outcome.all_succeeded());
        assert_eq!(
            outcome.into_results(),
            vec![
                ("k1".to_string(), false),
                ("k2".to_string(), true),
                ("k3".to_string(), true),
            ]
        );
        assert_eq!(manager.check_lock(&LockKey::new("k3")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_input_succeeds() {
        let manager = memory_manager(AcquireMode::CheckThenSet);
        let orchestrator = BulkLockOrchestrator::new(&manager);

        assert!(orchestrator.lock_all(&[]).await.unwrap().all_succeeded());
        assert!(orchestrator.unlock_all(&[]).await.unwrap().all_succeeded());
    }
}
