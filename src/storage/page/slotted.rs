use crate::common::constants::{DELETED_SLOT_MSG, INVALID_SLOT_MSG};
use crate::common::{Error, Result};
use crate::config::config::PAGE_DB_PAGE_SIZE_BYTES;
use crate::storage::disk::disk_manager::PageId;

/// Page header: page_id (4) + slot_count (2) + free_space_offset (2) +
/// page_type (2) + 6 reserved bytes.
pub const PAGE_HEADER_SIZE: usize = 16;

/// Slot entry: offset (2) + length (2) + flags (2) + 2 reserved bytes.
pub const SLOT_ENTRY_SIZE: usize = 8;

pub const PAGE_TYPE_HEAP: u16 = 0;

/// An entry in the slot directory. A deleted slot has `length == 0` and is
/// excluded from scans but keeps its index, so tuple ids stay stable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub offset: u16,
    pub length: u16,
    pub flags: u16,
}

impl Slot {
    pub fn is_deleted(&self) -> bool {
        self.length == 0
    }
}

/// A fixed-size slotted page. The slot directory grows forward from the
/// header while payloads grow backward from the page end; the free space
/// between them is tracked by `free_space_offset` (the lowest payload byte).
///
/// Layout invariant after every mutation: `slot_directory_end <=
/// free_space_offset <= page_end`, and live payload ranges never overlap.
#[derive(Clone, Debug)]
pub struct SlottedPage {
    pub(crate) page_id: PageId,
    pub(crate) page_type: u16,
    pub(crate) free_space_offset: u16,
    pub(crate) slots: Vec<Slot>,
    pub(crate) data: Vec<u8>,
    pub is_dirty: bool,
}

impl SlottedPage {
    pub fn new(page_id: PageId) -> SlottedPage {
        SlottedPage {
            page_id,
            page_type: PAGE_TYPE_HEAP,
            free_space_offset: PAGE_DB_PAGE_SIZE_BYTES as u16,
            slots: Vec::new(),
            data: vec![0; PAGE_DB_PAGE_SIZE_BYTES],
            is_dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Total number of slots, deleted ones included.
    pub fn slot_count(&self) -> u16 {
        self.slots.len() as u16
    }

    /// Number of non-deleted slots.
    pub fn live_slot_count(&self) -> u16 {
        self.slots.iter().filter(|s| !s.is_deleted()).count() as u16
    }

    pub fn slot(&self, slot_id: u16) -> Option<&Slot> {
        self.slots.get(slot_id as usize)
    }

    /// Exact free bytes between the slot directory and the payload region.
    pub fn free_bytes(&self) -> usize {
        let directory_end = PAGE_HEADER_SIZE + self.slots.len() * SLOT_ENTRY_SIZE;
        self.free_space_offset as usize - directory_end
    }

    /// Whether a payload of `len` bytes fits, slot entry included.
    pub fn has_space_for(&self, len: usize) -> bool {
        self.free_bytes() >= len + SLOT_ENTRY_SIZE
    }

    /// Places the payload at `free_space_offset - len`, appends a slot for
    /// it, and returns the slot index. Returns `None` when the page cannot
    /// hold the payload plus its slot entry.
    pub fn insert_tuple(&mut self, bytes: &[u8]) -> Option<u16> {
        if !self.has_space_for(bytes.len()) {
            return None;
        }
        let offset = self.free_space_offset as usize - bytes.len();
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);

        let slot_id = self.slots.len() as u16;
        self.slots.push(Slot {
            offset: offset as u16,
            length: bytes.len() as u16,
            flags: 0,
        });
        self.free_space_offset = offset as u16;
        self.is_dirty = true;
        Some(slot_id)
    }

    /// Returns the payload bytes for a live slot.
    pub fn get_tuple(&self, slot_id: u16) -> Result<&[u8]> {
        let slot = self
            .slots
            .get(slot_id as usize)
            .ok_or_else(|| Error::InvalidInput(format!("{INVALID_SLOT_MSG} {slot_id}")))?;
        if slot.is_deleted() {
            return Err(Error::InvalidInput(format!("{DELETED_SLOT_MSG} {slot_id}")));
        }
        let start = slot.offset as usize;
        Ok(&self.data[start..start + slot.length as usize])
    }

    /// Overwrites a live slot's payload with bytes of the same length. Used
    /// solely for tuple-header rewrites; size-changing updates are modeled
    /// as delete + insert.
    pub fn update_tuple_in_place(&mut self, slot_id: u16, bytes: &[u8]) -> Result<()> {
        let slot = self
            .slots
            .get(slot_id as usize)
            .ok_or_else(|| Error::InvalidInput(format!("{INVALID_SLOT_MSG} {slot_id}")))?;
        if slot.is_deleted() {
            return Err(Error::InvalidInput(format!("{DELETED_SLOT_MSG} {slot_id}")));
        }
        if slot.length as usize != bytes.len() {
            return Err(Error::InvalidInput(format!(
                "In-place update requires equal length: slot holds {} bytes, got {}",
                slot.length,
                bytes.len()
            )));
        }
        let start = slot.offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        self.is_dirty = true;
        Ok(())
    }

    /// Marks the slot deleted. Payload bytes linger until `compact`.
    pub fn delete_tuple(&mut self, slot_id: u16) -> Result<()> {
        let slot = self
            .slots
            .get_mut(slot_id as usize)
            .ok_or_else(|| Error::InvalidInput(format!("{INVALID_SLOT_MSG} {slot_id}")))?;
        slot.offset = 0;
        slot.length = 0;
        self.is_dirty = true;
        Ok(())
    }

    /// Rewrites the payload region, dropping byte ranges whose slots are
    /// deleted. Slot indices are preserved and live slots keep their
    /// relative payload order; only offsets move. Returns the number of
    /// bytes reclaimed.
    pub fn compact(&mut self) -> usize {
        let old_free_space_offset = self.free_space_offset as usize;

        // Live slots in descending payload order, i.e. insertion order as
        // seen from the page end.
        let mut live: Vec<usize> = (0..self.slots.len())
            .filter(|&i| !self.slots[i].is_deleted())
            .collect();
        live.sort_by(|&a, &b| self.slots[b].offset.cmp(&self.slots[a].offset));

        let mut packed = vec![0u8; PAGE_DB_PAGE_SIZE_BYTES];
        let mut cursor = PAGE_DB_PAGE_SIZE_BYTES;
        for slot_id in live {
            let slot = self.slots[slot_id];
            let start = slot.offset as usize;
            let len = slot.length as usize;
            cursor -= len;
            packed[cursor..cursor + len].copy_from_slice(&self.data[start..start + len]);
            self.slots[slot_id].offset = cursor as u16;
        }
        packed[..cursor].copy_from_slice(&self.data[..cursor]);

        self.data = packed;
        self.free_space_offset = cursor as u16;
        self.is_dirty = true;
        cursor - old_free_space_offset
    }

    /// Serializes the page into its on-disk block: little-endian header,
    /// slot directory, then the payload region.
    pub fn serialize(&self) -> Vec<u8> {
        let mut block = self.data.clone();

        block[0..4].copy_from_slice(&self.page_id.to_le_bytes());
        block[4..6].copy_from_slice(&(self.slots.len() as u16).to_le_bytes());
        block[6..8].copy_from_slice(&self.free_space_offset.to_le_bytes());
        block[8..10].copy_from_slice(&self.page_type.to_le_bytes());
        block[10..PAGE_HEADER_SIZE].fill(0);

        let mut cursor = PAGE_HEADER_SIZE;
        for slot in &self.slots {
            block[cursor..cursor + 2].copy_from_slice(&slot.offset.to_le_bytes());
            block[cursor + 2..cursor + 4].copy_from_slice(&slot.length.to_le_bytes());
            block[cursor + 4..cursor + 6].copy_from_slice(&slot.flags.to_le_bytes());
            block[cursor + 6..cursor + 8].fill(0);
            cursor += SLOT_ENTRY_SIZE;
        }
        block
    }

    /// Parses a page from its on-disk block.
    pub fn deserialize(buffer: &[u8]) -> Result<SlottedPage> {
        if buffer.len() != PAGE_DB_PAGE_SIZE_BYTES {
            return Err(Error::Codec(format!(
                "Page block must be {PAGE_DB_PAGE_SIZE_BYTES} bytes, got {}",
                buffer.len()
            )));
        }
        let page_id = u32::from_le_bytes(buffer[0..4].try_into().unwrap());
        let slot_count = u16::from_le_bytes(buffer[4..6].try_into().unwrap());
        let free_space_offset = u16::from_le_bytes(buffer[6..8].try_into().unwrap());
        let page_type = u16::from_le_bytes(buffer[8..10].try_into().unwrap());

        let directory_end = PAGE_HEADER_SIZE + slot_count as usize * SLOT_ENTRY_SIZE;
        if directory_end > free_space_offset as usize
            || free_space_offset as usize > PAGE_DB_PAGE_SIZE_BYTES
        {
            return Err(Error::Codec(format!(
                "Corrupt page header for page {page_id}"
            )));
        }

        let mut slots = Vec::with_capacity(slot_count as usize);
        let mut cursor = PAGE_HEADER_SIZE;
        for _ in 0..slot_count {
            let offset = u16::from_le_bytes(buffer[cursor..cursor + 2].try_into().unwrap());
            let length = u16::from_le_bytes(buffer[cursor + 2..cursor + 4].try_into().unwrap());
            let flags = u16::from_le_bytes(buffer[cursor + 4..cursor + 6].try_into().unwrap());
            if length != 0 && offset as usize + length as usize > PAGE_DB_PAGE_SIZE_BYTES {
                return Err(Error::Codec(format!(
                    "Slot overruns page end in page {page_id}"
                )));
            }
            slots.push(Slot {
                offset,
                length,
                flags,
            });
            cursor += SLOT_ENTRY_SIZE;
        }

        Ok(SlottedPage {
            page_id,
            page_type,
            free_space_offset,
            slots,
            data: buffer.to_vec(),
            is_dirty: false,
        })
    }
}
