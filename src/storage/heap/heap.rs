use crate::common::{Error, Result};
use crate::storage::disk::disk_manager::{DiskManager, PageId};
use crate::storage::heap::FreeSpaceMap;
use crate::storage::page::{SlottedPage, TupleId, SLOT_ENTRY_SIZE};
use std::path::Path;
use std::sync::RwLock;

/// A heap file: the sequence of slotted pages backing one table, plus the
/// free-space map steering insert placement. Pages are read on demand and
/// written through; the table-level lock above this type provides statement
/// isolation, so the interior disk lock only serializes raw file access.
#[derive(Debug)]
pub struct HeapFile {
    disk: RwLock<DiskManager>,
    fsm: FreeSpaceMap,
}

impl HeapFile {
    /// Opens (or creates) the heap file at `path` and rebuilds the
    /// free-space map from the page headers.
    pub fn open(path: &Path) -> Result<HeapFile> {
        let disk = DiskManager::open(path)?;
        let heap = HeapFile {
            disk: RwLock::new(disk),
            fsm: FreeSpaceMap::new(),
        };
        heap.rebuild_fsm()?;
        Ok(heap)
    }

    fn rebuild_fsm(&self) -> Result<()> {
        self.fsm.clear();
        let mut disk = self.disk.write()?;
        for page_id in 0..disk.page_count() {
            let page = disk.read_page(page_id)?;
            self.fsm.update(page_id, page.free_bytes() as u16);
        }
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        self.disk.read().unwrap().page_count()
    }

    pub fn free_space_map(&self) -> &FreeSpaceMap {
        &self.fsm
    }

    /// Extends the file by one page and registers it with the FSM.
    pub fn allocate_page(&self) -> Result<PageId> {
        let mut disk = self.disk.write()?;
        let page_id = disk.allocate_page()?;
        self.fsm.update(page_id, SlottedPage::new(page_id).free_bytes() as u16);
        Ok(page_id)
    }

    pub fn read_page(&self, page_id: PageId) -> Result<SlottedPage> {
        self.disk.write()?.read_page(page_id)
    }

    /// Writes the page back and refreshes its FSM entry.
    pub fn write_page(&self, page: &SlottedPage) -> Result<()> {
        self.disk.write()?.write_page(page)?;
        self.fsm.update(page.page_id(), page.free_bytes() as u16);
        Ok(())
    }

    pub fn sync(&self) -> Result<()> {
        self.disk.write()?.sync()
    }

    /// Places serialized tuple bytes on a page with room (allocating a new
    /// page when none qualifies) and returns the resulting tuple id.
    pub fn insert_tuple(&self, bytes: &[u8]) -> Result<TupleId> {
        let needed = bytes.len() + SLOT_ENTRY_SIZE;
        let page_id = match self.fsm.find_page_with_space(needed) {
            Some(page_id) => page_id,
            None => self.allocate_page()?,
        };

        let mut page = self.read_page(page_id)?;
        let slot = page.insert_tuple(bytes).ok_or_else(|| {
            Error::IO(format!(
                "Tuple of {} bytes does not fit on page {page_id}",
                bytes.len()
            ))
        })?;
        self.write_page(&page)?;
        Ok(TupleId::new(page_id, slot))
    }

    /// Reads the tuple bytes at `tid`.
    pub fn get_tuple(&self, tid: &TupleId) -> Result<Vec<u8>> {
        let page = self.read_page(tid.page_id())?;
        Ok(page.get_tuple(tid.slot())?.to_vec())
    }

    /// Reads the tuple bytes at `tid` into a caller-provided buffer (the
    /// scan path feeds pooled buffers through here).
    pub fn get_tuple_into(&self, tid: &TupleId, buffer: &mut Vec<u8>) -> Result<()> {
        let page = self.read_page(tid.page_id())?;
        buffer.clear();
        buffer.extend_from_slice(page.get_tuple(tid.slot())?);
        Ok(())
    }
}
