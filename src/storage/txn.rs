use crate::common::constants::INVALID_XID;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Instant;

/// Monotonic transaction identifier. `0` is never a valid XID; a tuple
/// header carrying `xmin == 0` is treated as never visible.
pub type TxnId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    Active,
    Committed,
    Aborted,
}

/// A transaction handle as returned by [`TransactionManager::begin`].
#[derive(Clone, Debug)]
pub struct Transaction {
    pub xid: TxnId,
    pub state: TxnState,
    pub start_time: Instant,
}

#[derive(Debug, Default)]
struct TxnInner {
    next_xid: TxnId,
    active: BTreeSet<TxnId>,
}

/// Allocates XIDs from a monotonically increasing counter and tracks the
/// active set. There is no two-phase locking; isolation is provided purely
/// by tuple-header visibility.
#[derive(Debug)]
pub struct TransactionManager {
    inner: Mutex<TxnInner>,
}

impl TransactionManager {
    pub fn new() -> TransactionManager {
        TransactionManager {
            inner: Mutex::new(TxnInner {
                next_xid: INVALID_XID + 1,
                active: BTreeSet::new(),
            }),
        }
    }

    /// Allocates a fresh XID and marks it active.
    pub fn begin(&self) -> Transaction {
        let mut inner = self.inner.lock().unwrap();
        let xid = inner.next_xid;
        inner.next_xid += 1;
        inner.active.insert(xid);
        Transaction {
            xid,
            state: TxnState::Active,
            start_time: Instant::now(),
        }
    }

    pub fn commit(&self, txn: &mut Transaction) {
        let mut inner = self.inner.lock().unwrap();
        inner.active.remove(&txn.xid);
        txn.state = TxnState::Committed;
    }

    pub fn abort(&self, txn: &mut Transaction) {
        let mut inner = self.inner.lock().unwrap();
        inner.active.remove(&txn.xid);
        txn.state = TxnState::Aborted;
    }

    /// The minimum active XID, or `next_xid` when nothing is active. Vacuum
    /// uses this as the reclaim horizon.
    pub fn oldest_active(&self) -> TxnId {
        let inner = self.inner.lock().unwrap();
        inner.active.iter().next().copied().unwrap_or(inner.next_xid)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xids_are_monotonic_and_nonzero() {
        let manager = TransactionManager::new();
        let first = manager.begin();
        let second = manager.begin();

        assert_eq!(first.xid, 1);
        assert_eq!(second.xid, 2);
        assert_ne!(first.xid, INVALID_XID);
    }

    #[test]
    fn test_oldest_active_tracks_minimum() {
        let manager = TransactionManager::new();
        let mut a = manager.begin();
        let b = manager.begin();
        let _keep = b;

        assert_eq!(manager.oldest_active(), a.xid);
        manager.commit(&mut a);
        assert_eq!(manager.oldest_active(), 2);
    }

    #[test]
    fn test_oldest_active_with_empty_set_is_next_xid() {
        let manager = TransactionManager::new();
        assert_eq!(manager.oldest_active(), 1);

        let mut txn = manager.begin();
        manager.abort(&mut txn);
        assert_eq!(txn.state, TxnState::Aborted);
        assert_eq!(manager.oldest_active(), 2);
    }

    #[test]
    fn test_concurrent_begin_allocates_unique_xids() {
        let manager = TransactionManager::new();
        let xids = std::sync::Mutex::new(Vec::new());

        crossbeam::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|_| {
                    for _ in 0..100 {
                        let txn = manager.begin();
                        xids.lock().unwrap().push(txn.xid);
                    }
                });
            }
        })
        .unwrap();

        let mut xids = xids.into_inner().unwrap();
        xids.sort_unstable();
        xids.dedup();
        assert_eq!(xids.len(), 800);
    }
}
