use crate::common::constants::INVALID_PID;
use crate::storage::disk::disk_manager::PageId;
use serde::{Deserialize, Serialize};

/// Stable locator for a tuple: the page holding it and the index of its
/// slot in that page's slot directory. Survives in-page compaction, which
/// moves payload bytes but never slot indices.
#[derive(Clone, Copy, Debug, Hash, Serialize, Deserialize)]
pub struct TupleId {
    page_id: PageId,
    slot: u16,
}

pub const INVALID_TID: TupleId = TupleId {
    page_id: INVALID_PID,
    slot: 0,
};

impl TupleId {
    pub fn new(page_id: PageId, slot: u16) -> TupleId {
        TupleId { page_id, slot }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn slot(&self) -> u16 {
        self.slot
    }
}

impl std::fmt::Display for TupleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.page_id, self.slot)
    }
}

impl PartialEq for TupleId {
    fn eq(&self, other: &Self) -> bool {
        self.page_id == other.page_id && self.slot == other.slot
    }
}

impl Eq for TupleId {}

impl Ord for TupleId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.page_id
            .cmp(&other.page_id)
            .then(self.slot.cmp(&other.slot))
    }
}

impl PartialOrd for TupleId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tuple_id_tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let tid = TupleId::new(3, 7);
        assert_eq!(3, tid.page_id());
        assert_eq!(7, tid.slot());
        assert_eq!("3:7", tid.to_string());
    }

    #[test]
    fn test_ordering() {
        let a = TupleId::new(1, 5);
        let b = TupleId::new(2, 0);
        let c = TupleId::new(2, 1);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a, TupleId::new(1, 5));
        assert_ne!(a, c);
    }
}
