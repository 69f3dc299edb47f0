use crate::storage::disk::disk_manager::DiskManager;
use crate::storage::page::SlottedPage;
use tempfile::NamedTempFile;

fn new_disk_manager() -> (NamedTempFile, DiskManager) {
    let temp_file = NamedTempFile::new().expect("Unable to create temp file");
    let dm = DiskManager::open(temp_file.path()).expect("Unable to open disk manager");
    (temp_file, dm)
}

#[test]
fn test_allocate_pages_densely() {
    let (_file, mut dm) = new_disk_manager();
    assert_eq!(dm.page_count(), 0);

    assert_eq!(dm.allocate_page().unwrap(), 0);
    assert_eq!(dm.allocate_page().unwrap(), 1);
    assert_eq!(dm.allocate_page().unwrap(), 2);
    assert_eq!(dm.page_count(), 3);
}

#[test]
fn test_write_and_read_page() {
    let (_file, mut dm) = new_disk_manager();
    let page_id = dm.allocate_page().unwrap();

    let mut page = dm.read_page(page_id).unwrap();
    let slot = page.insert_tuple(b"Hello, DiskManager!").unwrap();
    dm.write_page(&page).unwrap();

    let read_back = dm.read_page(page_id).unwrap();
    assert_eq!(read_back.get_tuple(slot).unwrap(), b"Hello, DiskManager!");
}

#[test]
fn test_persistent_across_instances() {
    let temp_file = NamedTempFile::new().expect("Unable to create temp file");
    let page_id;
    {
        let mut dm = DiskManager::open(temp_file.path()).unwrap();
        page_id = dm.allocate_page().unwrap();
        let mut page = dm.read_page(page_id).unwrap();
        page.insert_tuple(b"Persistent Data").unwrap();
        dm.write_page(&page).unwrap();
        dm.sync().unwrap();
    }

    let mut dm = DiskManager::open(temp_file.path()).unwrap();
    assert_eq!(dm.page_count(), 1);
    let page = dm.read_page(page_id).unwrap();
    assert_eq!(page.get_tuple(0).unwrap(), b"Persistent Data");
}

#[test]
fn test_open_rejects_misaligned_file() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), b"not a page").unwrap();
    assert!(DiskManager::open(temp_file.path()).is_err());
}

#[test]
fn test_read_past_end_fails() {
    let (_file, mut dm) = new_disk_manager();
    assert!(dm.read_page(9).is_err());
}

#[test]
fn test_page_zero_has_standard_structure() {
    let (_file, mut dm) = new_disk_manager();
    dm.allocate_page().unwrap();

    let page = dm.read_page(0).unwrap();
    assert_eq!(page.page_id(), 0);
    assert_eq!(page.slot_count(), 0);
    let fresh = SlottedPage::new(0);
    assert_eq!(page.free_bytes(), fresh.free_bytes());
}
