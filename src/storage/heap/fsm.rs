use crate::storage::disk::disk_manager::PageId;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory page-id → free-bytes map used for insert placement. Updated on
/// every insert, update, delete, and compact; rebuilt on startup by
/// scanning page headers.
#[derive(Debug, Default)]
pub struct FreeSpaceMap {
    entries: RwLock<HashMap<PageId, u16>>,
}

impl FreeSpaceMap {
    pub fn new() -> FreeSpaceMap {
        FreeSpaceMap {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the lowest page id with at least `needed` free bytes, or
    /// `None` if no tracked page qualifies.
    pub fn find_page_with_space(&self, needed: usize) -> Option<PageId> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .filter(|(_, &free)| free as usize >= needed)
            .map(|(&page_id, _)| page_id)
            .min()
    }

    pub fn update(&self, page_id: PageId, free_bytes: u16) {
        self.entries.write().unwrap().insert(page_id, free_bytes);
    }

    pub fn get(&self, page_id: PageId) -> Option<u16> {
        self.entries.read().unwrap().get(&page_id).copied()
    }

    pub fn page_count(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
