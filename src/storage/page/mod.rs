mod slotted;
mod tuple_id;

#[cfg(test)]
mod tests;

pub use slotted::{SlottedPage, Slot, PAGE_HEADER_SIZE, PAGE_TYPE_HEAP, SLOT_ENTRY_SIZE};
pub use tuple_id::{TupleId, INVALID_TID};
