use crate::common::Result;
use crate::storage::engine::PagedTable;
use crate::storage::page::TupleId;
use crate::storage::tuple::{Tuple, TupleHeader};
use crate::storage::txn::TxnId;
use crate::types::Field;
use std::collections::HashSet;
use std::sync::Mutex;

/// Counters reported by a vacuum pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VacuumStats {
    pub pages_scanned: u32,
    pub pages_compacted: u32,
    pub tuples_removed: u64,
}

impl VacuumStats {
    pub fn merge(&mut self, other: VacuumStats) {
        self.pages_scanned += other.pages_scanned;
        self.pages_compacted += other.pages_compacted;
        self.tuples_removed += other.tuples_removed;
    }
}

/// Reclaims dead tuple space. A tuple is dead iff its `xmax` is set and
/// below the oldest active XID; a tuple deleted exactly at the horizon is
/// kept. Passes are serialized by a vacuum-wide mutex; the caller holds the
/// table's exclusive lock for the page rewrites.
#[derive(Debug)]
pub struct VacuumManager {
    pass_lock: Mutex<()>,
    auto_threshold: usize,
}

impl VacuumManager {
    pub fn new(auto_threshold: usize) -> VacuumManager {
        VacuumManager {
            pass_lock: Mutex::new(()),
            auto_threshold,
        }
    }

    /// Whether a table's accumulated dead-tuple count warrants an automatic
    /// pass.
    pub fn should_auto_vacuum(&self, dead_tuples: usize) -> bool {
        dead_tuples >= self.auto_threshold
    }

    /// Walks every page of the table, drops dead tuples, compacts pages
    /// that lost any, and scrubs the reaped tuple ids from `tuple_ids` and
    /// every index.
    pub fn vacuum_table(&self, table: &mut PagedTable, oldest_active: TxnId) -> Result<VacuumStats> {
        let _pass = self.pass_lock.lock()?;
        let mut stats = VacuumStats::default();
        let mut reaped: Vec<TupleId> = Vec::new();
        // (column, key, tid) triples to scrub from the indexes afterward.
        let mut reaped_keys: Vec<(String, Field, TupleId)> = Vec::new();

        for page_id in 0..table.heap().page_count() {
            let mut page = table.heap().read_page(page_id)?;
            stats.pages_scanned += 1;

            let mut dead_slots = Vec::new();
            for slot_id in 0..page.slot_count() {
                let Ok(bytes) = page.get_tuple(slot_id) else {
                    continue; // already-deleted slot
                };
                let header = match TupleHeader::decode(bytes) {
                    Ok(header) => header,
                    Err(err) => {
                        log::warn!("vacuum skipping unreadable tuple {page_id}:{slot_id}: {err}");
                        continue;
                    }
                };
                if !header.is_dead(oldest_active) {
                    continue;
                }

                let tid = TupleId::new(page_id, slot_id);
                if let Ok(tuple) = Tuple::deserialize(bytes) {
                    for column in table.schema().columns().iter().filter(|c| {
                        table.index(c.get_name()).is_some()
                    }) {
                        let key = match tuple.row.get(column.get_name()) {
                            Some(value) => value.clone(),
                            None => column.default().cloned().unwrap_or(Field::Null),
                        };
                        reaped_keys.push((column.get_name().to_string(), key, tid));
                    }
                }
                dead_slots.push(slot_id);
                reaped.push(tid);
            }

            if !dead_slots.is_empty() {
                for slot_id in &dead_slots {
                    page.delete_tuple(*slot_id)?;
                }
                page.compact();
                table.heap().write_page(&page)?;
                stats.pages_compacted += 1;
                stats.tuples_removed += dead_slots.len() as u64;
            }
        }

        if !reaped.is_empty() {
            let reaped_set: HashSet<TupleId> = reaped.iter().copied().collect();
            table.retain_tuple_ids(|tid| !reaped_set.contains(tid));
            for (column, key, tid) in reaped_keys {
                table.remove_index_entry(&column, &key, &tid);
            }
            table.heap().sync()?;
        }
        table.settle_dead_tuples(stats.tuples_removed as usize);

        log::info!(
            "vacuumed {}: {} pages scanned, {} compacted, {} tuples removed",
            table.schema().name(),
            stats.pages_scanned,
            stats.pages_compacted,
            stats.tuples_removed
        );
        Ok(stats)
    }
}
