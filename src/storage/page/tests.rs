use super::*;
use crate::config::config::PAGE_DB_PAGE_SIZE_BYTES;

fn page_with_tuples(payloads: &[&[u8]]) -> SlottedPage {
    let mut page = SlottedPage::new(0);
    for payload in payloads {
        page.insert_tuple(payload).expect("tuple should fit");
    }
    page
}

#[test]
fn test_insert_and_get() {
    let mut page = SlottedPage::new(7);
    let slot = page.insert_tuple(b"hello").unwrap();

    assert_eq!(slot, 0);
    assert_eq!(page.get_tuple(slot).unwrap(), b"hello");
    assert_eq!(page.slot_count(), 1);
    assert_eq!(page.live_slot_count(), 1);
}

#[test]
fn test_payloads_grow_from_page_end() {
    let page = page_with_tuples(&[b"first", b"second"]);

    let first = page.slot(0).unwrap();
    let second = page.slot(1).unwrap();
    assert_eq!(first.offset as usize, PAGE_DB_PAGE_SIZE_BYTES - 5);
    assert_eq!(second.offset as usize, PAGE_DB_PAGE_SIZE_BYTES - 5 - 6);
    assert!(second.offset < first.offset);
}

#[test]
fn test_free_byte_accounting_is_exact() {
    let mut page = SlottedPage::new(0);
    let before = page.free_bytes();
    assert_eq!(before, PAGE_DB_PAGE_SIZE_BYTES - PAGE_HEADER_SIZE);

    page.insert_tuple(b"0123456789").unwrap();
    assert_eq!(page.free_bytes(), before - 10 - SLOT_ENTRY_SIZE);
}

#[test]
fn test_insert_rejects_when_full() {
    let mut page = SlottedPage::new(0);
    let big = vec![0xAB; PAGE_DB_PAGE_SIZE_BYTES / 2];
    assert!(page.insert_tuple(&big).is_some());

    // A payload larger than the remaining free space must be refused, and
    // the page must be left untouched.
    let slots_before = page.slot_count();
    let free_before = page.free_bytes();
    assert!(page.insert_tuple(&big).is_none());
    assert_eq!(page.slot_count(), slots_before);
    assert_eq!(page.free_bytes(), free_before);
}

#[test]
fn test_get_deleted_slot_fails() {
    let mut page = page_with_tuples(&[b"doomed"]);
    page.delete_tuple(0).unwrap();

    assert!(page.get_tuple(0).is_err());
    assert_eq!(page.slot_count(), 1);
    assert_eq!(page.live_slot_count(), 0);
}

#[test]
fn test_get_out_of_range_slot_fails() {
    let page = page_with_tuples(&[b"only"]);
    assert!(page.get_tuple(5).is_err());
}

#[test]
fn test_update_in_place_requires_equal_length() {
    let mut page = page_with_tuples(&[b"abcdef"]);

    page.update_tuple_in_place(0, b"ABCDEF").unwrap();
    assert_eq!(page.get_tuple(0).unwrap(), b"ABCDEF");

    assert!(page.update_tuple_in_place(0, b"too long for slot").is_err());
    assert_eq!(page.get_tuple(0).unwrap(), b"ABCDEF");
}

#[test]
fn test_compact_preserves_slot_indices_and_order() {
    let mut page = page_with_tuples(&[b"aaaa", b"bbbb", b"cccc", b"dddd"]);
    page.delete_tuple(1).unwrap();
    page.delete_tuple(2).unwrap();

    let reclaimed = page.compact();
    assert_eq!(reclaimed, 8);

    // Slot count unchanged, live slot set unchanged.
    assert_eq!(page.slot_count(), 4);
    assert_eq!(page.get_tuple(0).unwrap(), b"aaaa");
    assert_eq!(page.get_tuple(3).unwrap(), b"dddd");
    assert!(page.get_tuple(1).is_err());
    assert!(page.get_tuple(2).is_err());

    // Live payloads stay in their original relative order from the end.
    let first = page.slot(0).unwrap();
    let last = page.slot(3).unwrap();
    assert!(last.offset < first.offset);
    assert_eq!(page.free_space_offset, last.offset);
}

#[test]
fn test_compact_reclaims_free_space() {
    let mut page = page_with_tuples(&[b"xxxxxxxxxx", b"yyyyyyyyyy"]);
    let free_before = page.free_bytes();

    page.delete_tuple(0).unwrap();
    page.compact();
    assert_eq!(page.free_bytes(), free_before + 10);
}

#[test]
fn test_live_payloads_never_overlap_after_compact() {
    let mut page = page_with_tuples(&[b"one", b"twotwo", b"threethree", b"four"]);
    page.delete_tuple(0).unwrap();
    page.delete_tuple(2).unwrap();
    page.compact();

    let mut ranges: Vec<(usize, usize)> = (0..page.slot_count())
        .filter_map(|i| page.slot(i))
        .filter(|s| !s.is_deleted())
        .map(|s| (s.offset as usize, s.offset as usize + s.length as usize))
        .collect();
    ranges.sort();
    for window in ranges.windows(2) {
        assert!(window[0].1 <= window[1].0, "payload ranges overlap");
    }
}

#[test]
fn test_serialize_layout_is_bit_exact() {
    let mut page = SlottedPage::new(42);
    page.insert_tuple(b"payload!").unwrap();
    let block = page.serialize();

    assert_eq!(block.len(), PAGE_DB_PAGE_SIZE_BYTES);
    assert_eq!(u32::from_le_bytes(block[0..4].try_into().unwrap()), 42);
    assert_eq!(u16::from_le_bytes(block[4..6].try_into().unwrap()), 1);
    let fso = u16::from_le_bytes(block[6..8].try_into().unwrap());
    assert_eq!(fso as usize, PAGE_DB_PAGE_SIZE_BYTES - 8);
    assert_eq!(
        u16::from_le_bytes(block[8..10].try_into().unwrap()),
        PAGE_TYPE_HEAP
    );

    // Slot entry at offset 16: { offset, length, flags, reserved }.
    assert_eq!(u16::from_le_bytes(block[16..18].try_into().unwrap()), fso);
    assert_eq!(u16::from_le_bytes(block[18..20].try_into().unwrap()), 8);
}

#[test]
fn test_serialize_round_trip() {
    let mut page = page_with_tuples(&[b"alpha", b"beta", b"gamma"]);
    page.delete_tuple(1).unwrap();

    let restored = SlottedPage::deserialize(&page.serialize()).unwrap();
    assert_eq!(restored.page_id(), page.page_id());
    assert_eq!(restored.slot_count(), 3);
    assert_eq!(restored.live_slot_count(), 2);
    assert_eq!(restored.get_tuple(0).unwrap(), b"alpha");
    assert!(restored.get_tuple(1).is_err());
    assert_eq!(restored.get_tuple(2).unwrap(), b"gamma");
    assert_eq!(restored.free_bytes(), page.free_bytes());
}

#[test]
fn test_deserialize_rejects_corrupt_header() {
    let mut block = SlottedPage::new(0).serialize();
    // free_space_offset below the slot directory end.
    block[6..8].copy_from_slice(&8u16.to_le_bytes());
    assert!(SlottedPage::deserialize(&block).is_err());

    assert!(SlottedPage::deserialize(&[0u8; 100]).is_err());
}
