// DiskManager / HeapFile
pub const INVALID_PID: u32 = u32::MAX;
pub const PAGE_READ_ERR_MSG: &str = "Unable to read page {page_id} from disk.";
pub const PAGE_WRITE_ERR_MSG: &str = "Unable to write page {page_id} to disk.";

// TransactionManager
pub const INVALID_XID: u32 = 0;

// SlottedPage
pub const INVALID_SLOT_MSG: &str = "Invalid slot id.";
pub const DELETED_SLOT_MSG: &str = "Slot corresponding to the given tuple id is deleted.";

// TupleId
pub const INVALID_TID_MSG: &str = "Invalid tuple id.";

// PagedEngine
pub const NO_DATABASE_SELECTED_MSG: &str = "No database selected. Run USE <database> first.";
