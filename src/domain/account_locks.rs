use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-account async locks. Pairs of accounts are always locked in ascending ID order, hence
/// concurrent transfers in opposite directions cannot deadlock.
#[derive(Debug, Clone, Default)]
pub struct AccountLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl AccountLocks {
    /// Lock both given accounts; locking the same ID twice only locks it once.
    pub async fn lock_pair(&self, id_a: Uuid, id_b: Uuid) -> AccountPairGuard {
        let (first, second) = if id_a <= id_b {
            (id_a, id_b)
        } else {
            (id_b, id_a)
        };

        let first = self.lock(first).await;
        let second = if second != first.id {
            Some(self.lock(second).await)
        } else {
            None
        };

        AccountPairGuard {
            _first: first,
            _second: second,
        }
    }

    async fn lock(&self, id: Uuid) -> AccountGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };

        // Created before waiting, so that the entry is also pruned if waiting gets cancelled.
        let mut account_guard = AccountGuard {
            id,
            guard: None,
            locks: self.locks.clone(),
        };
        account_guard.guard = Some(lock.lock_owned().await);

        account_guard
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[derive(Debug)]
pub struct AccountPairGuard {
    _first: AccountGuard,
    _second: Option<AccountGuard>,
}

#[derive(Debug)]
struct AccountGuard {
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Prune the entry unless some other task holds or awaits this lock.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::AccountLocks;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_lock_pair_excludes_overlapping_pairs() {
        let locks = AccountLocks::default();
        let id_1 = Uuid::now_v7();
        let id_2 = Uuid::now_v7();
        let id_3 = Uuid::now_v7();

        let guard = locks.lock_pair(id_1, id_2).await;

        // Overlapping pair in opposite order must wait.
        let blocked = timeout(Duration::from_millis(50), locks.lock_pair(id_3, id_1)).await;
        assert!(blocked.is_err());

        // Disjoint account can be locked.
        let other = timeout(Duration::from_millis(50), locks.lock_pair(id_3, id_3)).await;
        assert!(other.is_ok());
        drop(other);

        drop(guard);
        let unblocked = timeout(Duration::from_millis(50), locks.lock_pair(id_3, id_1)).await;
        assert!(unblocked.is_ok());
    }

    #[tokio::test]
    async fn test_locks_are_pruned() {
        let locks = AccountLocks::default();

        let guard = locks.lock_pair(Uuid::now_v7(), Uuid::now_v7()).await;
        assert_eq!(locks.len(), 2);

        drop(guard);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_opposite_directions_do_not_deadlock() {
        let locks = AccountLocks::default();
        let id_1 = Uuid::now_v7();
        let id_2 = Uuid::now_v7();

        let tasks = (0..100).map(|n| {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = if n % 2 == 0 {
                    locks.lock_pair(id_1, id_2).await
                } else {
                    locks.lock_pair(id_2, id_1).await
                };
                tokio::task::yield_now().await;
            })
        });
        let all = futures::future::join_all(tasks);

        let results = timeout(Duration::from_secs(5), all).await;
        assert!(results.is_ok_and(|results| results.iter().all(Result::is_ok)));
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_is_pruned() {
        let locks = AccountLocks::default();
        let id = Uuid::now_v7();

        let guard = locks.lock_pair(id, id).await;

        let mut waiter = Box::pin(locks.lock_pair(id, id));
        assert!(futures::poll!(&mut waiter).is_pending());

        // Released while the waiter still references the lock, then the waiter gets cancelled.
        drop(guard);
        assert_eq!(locks.len(), 1);
        drop(waiter);
        assert_eq!(locks.len(), 0);
    }
}
