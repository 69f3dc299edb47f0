use crate::common::constants::{INVALID_XID, NO_DATABASE_SELECTED_MSG};
use crate::common::{pool, Constraint, Error, Result};
use crate::config::config::Settings;
use crate::sql::planner::{filter_row, Plan};
use crate::sql::statement::Condition;
use crate::storage::engine::catalog::{self, CatalogFile, DatabaseEntry};
use crate::storage::engine::metrics::{Metrics, Status};
use crate::storage::engine::validator::{self, TableMap};
use crate::storage::heap::HeapFile;
use crate::storage::index::BTreeIndex;
use crate::storage::page::TupleId;
use crate::storage::tuple::{overwrite_xmax, Row, Tuple};
use crate::storage::txn::{Transaction, TransactionManager};
use crate::storage::vacuum::{VacuumManager, VacuumStats};
use crate::types::schema::split_qualified_name;
use crate::types::{Column, Field, TableSchema};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// A table under the paged engine: its schema, the heap file holding its
/// tuples, the authoritative ordered list of live tuple ids (which defines
/// scan order), and one in-memory B+ tree per indexed column.
#[derive(Debug)]
pub struct PagedTable {
    pub(crate) schema: TableSchema,
    pub(crate) heap: HeapFile,
    pub(crate) tuple_ids: Vec<TupleId>,
    pub(crate) indexes: HashMap<String, BTreeIndex>,
    pub(crate) dead_tuples: usize,
}

impl PagedTable {
    /// Opens (or creates) the table's heap file and rebuilds the in-memory
    /// state from it: the FSM (inside [`HeapFile::open`]), the live tuple-id
    /// list in (page, slot) order, and the indexes.
    pub fn open(schema: TableSchema, path: &Path) -> Result<PagedTable> {
        let heap = HeapFile::open(path)?;
        let mut table = PagedTable {
            schema,
            heap,
            tuple_ids: Vec::new(),
            indexes: HashMap::new(),
            dead_tuples: 0,
        };
        let indexed: Vec<String> = table
            .schema
            .indexed_columns()
            .map(|c| c.get_name().to_string())
            .collect();
        for column in indexed {
            table.indexes.insert(column, BTreeIndex::new());
        }
        table.rebuild()?;
        Ok(table)
    }

    fn rebuild(&mut self) -> Result<()> {
        self.tuple_ids.clear();
        for index in self.indexes.values_mut() {
            *index = BTreeIndex::new();
        }

        for page_id in 0..self.heap.page_count() {
            let page = self.heap.read_page(page_id)?;
            for slot_id in 0..page.slot_count() {
                let Ok(bytes) = page.get_tuple(slot_id) else {
                    continue;
                };
                let tuple = match Tuple::deserialize(bytes) {
                    Ok(tuple) => tuple,
                    Err(err) => {
                        log::warn!("skipping unreadable tuple {page_id}:{slot_id} on open: {err}");
                        continue;
                    }
                };
                // Only committed, live versions are rebuilt into the scan list.
                if tuple.header.xmin == INVALID_XID || tuple.header.xmax != INVALID_XID {
                    continue;
                }
                let tid = TupleId::new(page_id, slot_id);
                self.tuple_ids.push(tid);

                let keys: Vec<(String, Field)> = self
                    .indexes
                    .keys()
                    .map(|column| (column.clone(), self.read_view_value(&tuple.row, column)))
                    .collect();
                for (column, key) in keys {
                    if let Some(index) = self.indexes.get_mut(&column) {
                        index.insert(key, tid);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn heap(&self) -> &HeapFile {
        &self.heap
    }

    pub fn row_count(&self) -> usize {
        self.tuple_ids.len()
    }

    pub fn tuple_ids(&self) -> &[TupleId] {
        &self.tuple_ids
    }

    pub fn index(&self, column: &str) -> Option<&BTreeIndex> {
        self.indexes.get(column)
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexes.contains_key(column)
    }

    pub fn dead_tuples(&self) -> usize {
        self.dead_tuples
    }

    pub(crate) fn retain_tuple_ids(&mut self, keep: impl Fn(&TupleId) -> bool) {
        self.tuple_ids.retain(|tid| keep(tid));
    }

    pub(crate) fn remove_index_entry(&mut self, column: &str, key: &Field, tid: &TupleId) {
        if let Some(index) = self.indexes.get_mut(column) {
            index.delete(key, tid);
        }
    }

    pub(crate) fn settle_dead_tuples(&mut self, removed: usize) {
        self.dead_tuples = self.dead_tuples.saturating_sub(removed);
    }

    /// The value a reader observes for `column` in a stored row: the stored
    /// value when present, otherwise the column default (columns added by
    /// ALTER TABLE after the row was written), otherwise NULL.
    fn read_view_value(&self, stored: &Row, column: &str) -> Field {
        match stored.get(column) {
            Some(value) => value.clone(),
            None => self
                .schema
                .column_by_name(column)
                .and_then(|c| c.default().cloned())
                .unwrap_or(Field::Null),
        }
    }

    /// Materializes a stored row against the current schema, filling columns
    /// the stored payload predates. Existing tuple bytes are never rewritten
    /// for ALTER TABLE; this is where the lazy default becomes observable.
    pub fn materialize(&self, stored: &Row) -> Row {
        self.schema
            .columns()
            .iter()
            .map(|column| {
                (
                    column.get_name().to_string(),
                    self.read_view_value(stored, column.get_name()),
                )
            })
            .collect()
    }

    /// Collects candidate tuple ids for a plan. Full scans preserve
    /// `tuple_ids` order; index scans yield key order.
    fn candidates(&self, plan: &Plan) -> Result<Vec<TupleId>> {
        let mut tids = pool::take_tid_buffer();
        match plan {
            Plan::FullScan { .. } => tids.extend_from_slice(&self.tuple_ids),
            Plan::IndexSeek { column, values, .. } => {
                let index = self
                    .indexes
                    .get(column)
                    .ok_or_else(|| Error::Planner(format!("No index on column {column}")))?;
                for value in values {
                    tids.extend(index.lookup_all(value));
                }
            }
            Plan::IndexRangeScan {
                column, low, high, ..
            } => {
                let index = self
                    .indexes
                    .get(column)
                    .ok_or_else(|| Error::Planner(format!("No index on column {column}")))?;
                tids.extend(index.range_search(low.as_ref(), high.as_ref()));
            }
        }
        Ok(tids)
    }
}

/// A database: a named collection of tables.
#[derive(Debug)]
pub struct Database {
    pub name: String,
    pub(crate) tables: HashMap<String, Arc<RwLock<PagedTable>>>,
}

#[derive(Debug)]
struct EngineState {
    databases: HashMap<String, Database>,
    current: Option<String>,
}

/// The paged storage engine: orchestrates the validator, planner, codec,
/// heap files, and indexes behind a DDL/DML surface, and persists the
/// catalog under its data directory.
///
/// Lock discipline: `state` is the global engine lock (shared for catalog
/// reads, exclusive for DDL); every table carries its own reader/writer
/// lock; the free-space maps and the vacuum manager have their own locks.
#[derive(Debug)]
pub struct PagedEngine {
    data_dir: PathBuf,
    state: RwLock<EngineState>,
    txns: TransactionManager,
    vacuum: VacuumManager,
    metrics: Metrics,
}

impl PagedEngine {
    /// Opens the engine over `settings.data_dir`, loading the persisted
    /// catalog and rebuilding every table's in-memory state.
    pub fn open(settings: Settings) -> Result<PagedEngine> {
        let data_dir = PathBuf::from(&settings.data_dir);
        std::fs::create_dir_all(&data_dir)?;

        let persisted = catalog::load(&data_dir)?;
        let mut databases = HashMap::new();
        for entry in persisted.databases {
            let mut tables = HashMap::new();
            for schema in entry.tables {
                let path = catalog::heap_path(&data_dir, &entry.name, schema.name());
                let table_name = schema.name().to_string();
                let table = PagedTable::open(schema, &path)?;
                tables.insert(table_name, Arc::new(RwLock::new(table)));
            }
            log::info!("opened database {} with {} tables", entry.name, tables.len());
            databases.insert(entry.name.clone(), Database {
                name: entry.name,
                tables,
            });
        }

        Ok(PagedEngine {
            data_dir,
            state: RwLock::new(EngineState {
                databases,
                current: None,
            }),
            txns: TransactionManager::new(),
            vacuum: VacuumManager::new(settings.auto_vacuum_threshold),
            metrics: Metrics::new(),
        })
    }

    // ---------------------------------------------------------------- DDL

    /// Registers a database and persists the catalog. Returns false when
    /// the database already existed and `if_not_exists` was set.
    pub fn create_database(&self, name: &str, if_not_exists: bool) -> Result<bool> {
        let mut state = self.state.write()?;
        if state.databases.contains_key(name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(Error::Duplicate(format!("Database {name} already exists")));
        }

        std::fs::create_dir_all(self.data_dir.join(name))?;
        state.databases.insert(
            name.to_string(),
            Database {
                name: name.to_string(),
                tables: HashMap::new(),
            },
        );
        self.persist_catalog(&state)?;
        Ok(true)
    }

    pub fn use_database(&self, name: &str) -> Result<()> {
        let mut state = self.state.write()?;
        if !state.databases.contains_key(name) {
            return Err(Error::NotFound(format!("Database {name} does not exist")));
        }
        state.current = Some(name.to_string());
        Ok(())
    }

    pub fn current_database(&self) -> Result<String> {
        self.state
            .read()?
            .current
            .clone()
            .ok_or_else(|| Error::InvalidInput(NO_DATABASE_SELECTED_MSG.to_string()))
    }

    /// Validates the schema, creates the heap file, and builds empty
    /// indexes for the primary-key and UNIQUE columns. Returns false when
    /// the table already existed and `if_not_exists` was set.
    pub fn create_table(
        &self,
        name: &str,
        columns: Vec<Column>,
        if_not_exists: bool,
    ) -> Result<bool> {
        let mut state = self.state.write()?;
        let (db_name, table_name) = Self::resolve_names(&state, name)?;
        validator::validate_schema(&table_name, &columns)?;

        let database = state
            .databases
            .get_mut(&db_name)
            .ok_or_else(|| Error::NotFound(format!("Database {db_name} does not exist")))?;
        if database.tables.contains_key(&table_name) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(Error::Duplicate(format!(
                "Table {table_name} already exists"
            )));
        }

        let mut builder = TableSchema::builder();
        builder.name(&table_name).columns(columns);
        let schema = builder.build();

        let path = catalog::heap_path(&self.data_dir, &db_name, &table_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let table = PagedTable::open(schema, &path)?;
        database
            .tables
            .insert(table_name, Arc::new(RwLock::new(table)));
        self.persist_catalog(&state)?;
        Ok(true)
    }

    /// Drops the table and deletes its heap file. Returns false when the
    /// table did not exist and `if_exists` was set.
    pub fn drop_table(&self, name: &str, if_exists: bool) -> Result<bool> {
        let mut state = self.state.write()?;
        let (db_name, table_name) = Self::resolve_names(&state, name)?;
        let database = state
            .databases
            .get_mut(&db_name)
            .ok_or_else(|| Error::NotFound(format!("Database {db_name} does not exist")))?;

        if database.tables.remove(&table_name).is_none() {
            if if_exists {
                return Ok(false);
            }
            return Err(Error::NotFound(format!("Table {table_name} does not exist")));
        }

        let path = catalog::heap_path(&self.data_dir, &db_name, &table_name);
        if let Err(err) = std::fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                return Err(err.into());
            }
        }
        self.persist_catalog(&state)?;
        Ok(true)
    }

    /// Appends a column to the table's schema. Stored tuples are not
    /// rewritten: existing rows read the new column as its default (else
    /// NULL) at materialization time. A unique column gains an index,
    /// backfilled with the read-view values of existing rows.
    pub fn alter_table_add_column(&self, name: &str, column: Column) -> Result<()> {
        let state = self.state.write()?;
        let handle = Self::lookup_table(&state, name)?;
        {
            let mut table = handle.write()?;
            if table.schema.column_by_name(column.get_name()).is_some() {
                return Err(Error::Duplicate(format!(
                    "Column {} already exists in table {}",
                    column.get_name(),
                    table.schema.name()
                )));
            }
            if column.is_primary_key() && table.schema.primary_key().is_some() {
                return Err(Error::Schema(format!(
                    "Table {} already has a primary key",
                    table.schema.name()
                )));
            }
            // Every existing row would read the same non-null default, so a
            // unique column with one is only addable to an empty table.
            if column.is_unique()
                && !table.tuple_ids.is_empty()
                && column.default().map_or(false, |d| !d.is_null())
            {
                return Err(Error::Schema(format!(
                    "Cannot add unique column {} with a non-null default to non-empty table {}",
                    column.get_name(),
                    table.schema.name()
                )));
            }

            table.schema.add_column(column.clone());
            if column.is_unique() {
                let mut index = BTreeIndex::new();
                let default_key = column.default().cloned().unwrap_or(Field::Null);
                for tid in &table.tuple_ids {
                    index.insert(default_key.clone(), *tid);
                }
                table.indexes.insert(column.get_name().to_string(), index);
            }
        }
        self.persist_catalog(&state)?;
        Ok(())
    }

    pub fn describe(&self, name: &str) -> Result<TableSchema> {
        let handle = self.table_handle(name)?;
        let table = handle.read()?;
        Ok(table.schema.clone())
    }

    // ---------------------------------------------------------------- DML

    /// Applies column defaults, validates, and writes one row: serialize
    /// with `xmin = current_xid`, heap insert, index updates, and an append
    /// to the table's scan list.
    pub fn insert_row(&self, name: &str, mut row: Row) -> Result<TupleId> {
        let start = Instant::now();
        let handle = self.table_handle(name)?;
        let siblings = self.sibling_tables(name)?;
        let mut table = handle.write()?;

        let result = self.with_txn(|txn| {
            for column in table.schema.columns() {
                if !row.contains(column.get_name()) {
                    let value = column.default().cloned().unwrap_or(Field::Null);
                    row.set(column.get_name(), value);
                }
            }
            validator::validate_insert(&table, &siblings, &row)?;

            let bytes = Tuple::serialize(&row, &table.schema, txn.xid, INVALID_XID)?;
            let tid = table.heap.insert_tuple(&bytes)?;
            for (column, index) in table.indexes.iter_mut() {
                index.insert(row.get_or_null(column), tid);
            }
            table.tuple_ids.push(tid);
            table.heap.sync()?;
            Ok(tid)
        });

        self.metrics.record(start.elapsed());
        result
    }

    /// Plans, executes, and filters a read over the table, returning
    /// materialized rows. Column projection is the caller's concern.
    pub fn select_rows(&self, name: &str, conditions: &[Condition]) -> Result<Vec<Row>> {
        let start = Instant::now();
        let handle = self.table_handle(name)?;
        let table = handle.read()?;

        let result = self.with_txn(|txn| {
            let plan = Plan::choose(conditions, |c| table.is_indexed(c), table.row_count());
            Self::execute_scan(&table, &plan, conditions, txn.xid)
        });

        self.metrics.record(start.elapsed());
        result
    }

    /// The plan `select_rows` would execute for these conditions.
    pub fn plan_select(&self, name: &str, conditions: &[Condition]) -> Result<Plan> {
        let handle = self.table_handle(name)?;
        let table = handle.read()?;
        Ok(Plan::choose(
            conditions,
            |c| table.is_indexed(c),
            table.row_count(),
        ))
    }

    fn execute_scan(
        table: &PagedTable,
        plan: &Plan,
        conditions: &[Condition],
        reader_xid: u32,
    ) -> Result<Vec<Row>> {
        let candidates = table.candidates(plan)?;
        let mut buffer = pool::take_byte_buffer();
        let mut rows = Vec::new();

        for tid in candidates.iter() {
            table.heap.get_tuple_into(tid, &mut buffer)?;
            let tuple = match Tuple::deserialize(&buffer) {
                Ok(tuple) => tuple,
                Err(err) => {
                    // A corrupted tuple must not take down the query.
                    log::warn!("skipping unreadable tuple {tid} during scan: {err}");
                    continue;
                }
            };
            if !tuple.is_visible(reader_xid) {
                continue;
            }
            let row = table.materialize(&tuple.row);
            if filter_row(&row, conditions) {
                rows.push(row);
            }
        }

        pool::return_byte_buffer(buffer);
        pool::return_tid_buffer(candidates);
        Ok(rows)
    }

    /// Updates every matching row via a validated delete-insert sequence:
    /// the old version's `xmax` is set in place, the new version is written
    /// with a fresh `xmin`, the new tuple id takes the old one's position in
    /// the scan list, and every index entry is remapped.
    pub fn update_rows(
        &self,
        name: &str,
        updates: &[(String, Field)],
        conditions: &[Condition],
    ) -> Result<usize> {
        let start = Instant::now();
        let handle = self.table_handle(name)?;
        let siblings = self.sibling_tables(name)?;
        let mut table = handle.write()?;

        let result = self.with_txn(|txn| {
            Self::update_inner(&mut table, &siblings, updates, conditions, txn.xid)
        });

        if matches!(result, Ok(count) if count > 0) {
            self.maybe_auto_vacuum(&mut table)?;
        }
        self.metrics.record(start.elapsed());
        result
    }

    fn update_inner(
        table: &mut PagedTable,
        siblings: &TableMap,
        updates: &[(String, Field)],
        conditions: &[Condition],
        xid: u32,
    ) -> Result<usize> {
        for (column, _) in updates {
            if table.schema.column_by_name(column).is_none() {
                return Err(Error::NotFound(format!(
                    "Column {column} does not exist in table {}",
                    table.schema.name()
                )));
            }
        }

        let plan = Plan::choose(conditions, |c| table.is_indexed(c), table.row_count());
        let candidates = table.candidates(&plan)?;

        // Stage first: no page is mutated until every row has validated.
        let mut staged: Vec<(TupleId, Row, Row)> = Vec::new();
        for tid in candidates.iter() {
            let bytes = table.heap.get_tuple(tid)?;
            let tuple = match Tuple::deserialize(&bytes) {
                Ok(tuple) => tuple,
                Err(err) => {
                    log::warn!("skipping unreadable tuple {tid} during update: {err}");
                    continue;
                }
            };
            if !tuple.is_visible(xid) {
                continue;
            }
            let old_row = table.materialize(&tuple.row);
            if !filter_row(&old_row, conditions) {
                continue;
            }

            let mut new_row = old_row.clone();
            for (column, value) in updates {
                new_row.set(column.clone(), value.clone());
            }
            validator::validate_update(table, siblings, &new_row, tid)?;
            staged.push((*tid, old_row, new_row));
        }
        pool::return_tid_buffer(candidates);

        // Two staged rows must not land on the same unique value either.
        for column in table.schema.indexed_columns() {
            let mut seen: Vec<&Field> = Vec::new();
            for (_, _, new_row) in &staged {
                let Some(value) = new_row.get(column.get_name()) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                if seen.iter().any(|v| v.compare(value) == Ordering::Equal) {
                    return Err(Error::constraint(
                        if column.is_primary_key() {
                            Constraint::PrimaryKey
                        } else {
                            Constraint::Unique
                        },
                        table.schema.name(),
                        column.get_name(),
                        value,
                    ));
                }
                seen.push(value);
            }
        }

        let count = staged.len();
        for (tid, old_row, new_row) in staged {
            let mut page = table.heap.read_page(tid.page_id())?;
            let mut bytes = page.get_tuple(tid.slot())?.to_vec();
            overwrite_xmax(&mut bytes, xid)?;
            page.update_tuple_in_place(tid.slot(), &bytes)?;
            table.heap.write_page(&page)?;

            let new_bytes = Tuple::serialize(&new_row, &table.schema, xid, INVALID_XID)?;
            let new_tid = table.heap.insert_tuple(&new_bytes)?;

            if let Some(position) = table.tuple_ids.iter().position(|t| t == &tid) {
                table.tuple_ids[position] = new_tid;
            } else {
                table.tuple_ids.push(new_tid);
            }

            for (column, index) in table.indexes.iter_mut() {
                index.delete(&old_row.get_or_null(column), &tid);
                index.insert(new_row.get_or_null(column), new_tid);
            }
            table.dead_tuples += 1;
        }

        table.heap.sync()?;
        Ok(count)
    }

    /// Deletes every matching row: the version's `xmax` is rewritten in
    /// place, and the tuple id leaves the scan list and indexes immediately
    /// so later scans exclude it. The bytes themselves wait for vacuum.
    pub fn delete_rows(&self, name: &str, conditions: &[Condition]) -> Result<usize> {
        let start = Instant::now();
        let handle = self.table_handle(name)?;
        let mut table = handle.write()?;

        let result = self.with_txn(|txn| Self::delete_inner(&mut table, conditions, txn.xid));

        if matches!(result, Ok(count) if count > 0) {
            self.maybe_auto_vacuum(&mut table)?;
        }
        self.metrics.record(start.elapsed());
        result
    }

    fn delete_inner(table: &mut PagedTable, conditions: &[Condition], xid: u32) -> Result<usize> {
        let plan = Plan::choose(conditions, |c| table.is_indexed(c), table.row_count());
        let candidates = table.candidates(&plan)?;

        let mut matches: Vec<(TupleId, Row)> = Vec::new();
        for tid in candidates.iter() {
            let bytes = table.heap.get_tuple(tid)?;
            let tuple = match Tuple::deserialize(&bytes) {
                Ok(tuple) => tuple,
                Err(err) => {
                    log::warn!("skipping unreadable tuple {tid} during delete: {err}");
                    continue;
                }
            };
            if !tuple.is_visible(xid) {
                continue;
            }
            let row = table.materialize(&tuple.row);
            if filter_row(&row, conditions) {
                matches.push((*tid, row));
            }
        }
        pool::return_tid_buffer(candidates);

        for (tid, row) in &matches {
            let mut page = table.heap.read_page(tid.page_id())?;
            let mut bytes = page.get_tuple(tid.slot())?.to_vec();
            overwrite_xmax(&mut bytes, xid)?;
            page.update_tuple_in_place(tid.slot(), &bytes)?;
            table.heap.write_page(&page)?;

            for (column, index) in table.indexes.iter_mut() {
                index.delete(&row.get_or_null(column), tid);
            }
        }

        let deleted: std::collections::HashSet<TupleId> =
            matches.iter().map(|(tid, _)| *tid).collect();
        table.tuple_ids.retain(|tid| !deleted.contains(tid));
        table.dead_tuples += matches.len();

        table.heap.sync()?;
        Ok(matches.len())
    }

    // ------------------------------------------------------------- vacuum

    /// Runs a vacuum pass over one table.
    pub fn vacuum_table(&self, name: &str) -> Result<VacuumStats> {
        let handle = self.table_handle(name)?;
        let mut table = handle.write()?;
        self.vacuum.vacuum_table(&mut table, self.txns.oldest_active())
    }

    /// Runs a vacuum pass over every table of the current database.
    pub fn vacuum_all(&self) -> Result<VacuumStats> {
        let handles: Vec<Arc<RwLock<PagedTable>>> = {
            let state = self.state.read()?;
            let current = state
                .current
                .clone()
                .ok_or_else(|| Error::InvalidInput(NO_DATABASE_SELECTED_MSG.to_string()))?;
            let database = state
                .databases
                .get(&current)
                .ok_or_else(|| Error::NotFound(format!("Database {current} does not exist")))?;
            database.tables.values().cloned().collect()
        };

        let mut stats = VacuumStats::default();
        for handle in handles {
            let mut table = handle.write()?;
            stats.merge(self.vacuum.vacuum_table(&mut table, self.txns.oldest_active())?);
        }
        Ok(stats)
    }

    fn maybe_auto_vacuum(&self, table: &mut PagedTable) -> Result<()> {
        if self.vacuum.should_auto_vacuum(table.dead_tuples) {
            log::info!(
                "auto-vacuum triggered for {} ({} dead tuples)",
                table.schema.name(),
                table.dead_tuples
            );
            self.vacuum.vacuum_table(table, self.txns.oldest_active())?;
        }
        Ok(())
    }

    // ------------------------------------------------------------- status

    pub fn status(&self) -> Result<Status> {
        let state = self.state.read()?;
        let databases = state.databases.len() as u64;
        let tables = state.databases.values().map(|db| db.tables.len() as u64).sum();
        Ok(self.metrics.snapshot(databases, tables))
    }

    // ------------------------------------------------------------ helpers

    /// Runs a statement body inside an auto-commit transaction.
    fn with_txn<T>(&self, body: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let mut txn = self.txns.begin();
        match body(&txn) {
            Ok(value) => {
                self.txns.commit(&mut txn);
                Ok(value)
            }
            Err(err) => {
                self.txns.abort(&mut txn);
                Err(err)
            }
        }
    }

    fn resolve_names(state: &EngineState, name: &str) -> Result<(String, String)> {
        match split_qualified_name(name) {
            (Some(database), table) => Ok((database.to_string(), table.to_string())),
            (None, table) => {
                let current = state
                    .current
                    .clone()
                    .ok_or_else(|| Error::InvalidInput(NO_DATABASE_SELECTED_MSG.to_string()))?;
                Ok((current, table.to_string()))
            }
        }
    }

    fn lookup_table(state: &EngineState, name: &str) -> Result<Arc<RwLock<PagedTable>>> {
        let (db_name, table_name) = Self::resolve_names(state, name)?;
        let database = state
            .databases
            .get(&db_name)
            .ok_or_else(|| Error::NotFound(format!("Database {db_name} does not exist")))?;
        database
            .tables
            .get(&table_name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Table {table_name} does not exist")))
    }

    pub(crate) fn table_handle(&self, name: &str) -> Result<Arc<RwLock<PagedTable>>> {
        let state = self.state.read()?;
        Self::lookup_table(&state, name)
    }

    /// The other tables of the target's database, for foreign-key probes.
    fn sibling_tables(&self, name: &str) -> Result<TableMap> {
        let state = self.state.read()?;
        let (db_name, _) = Self::resolve_names(&state, name)?;
        let database = state
            .databases
            .get(&db_name)
            .ok_or_else(|| Error::NotFound(format!("Database {db_name} does not exist")))?;
        Ok(database.tables.clone())
    }

    fn persist_catalog(&self, state: &EngineState) -> Result<()> {
        let mut entries: Vec<DatabaseEntry> = Vec::with_capacity(state.databases.len());
        for database in state.databases.values() {
            let mut tables = Vec::with_capacity(database.tables.len());
            for handle in database.tables.values() {
                tables.push(handle.read()?.schema.clone());
            }
            tables.sort_by(|a, b| a.name().cmp(b.name()));
            entries.push(DatabaseEntry {
                name: database.name.clone(),
                tables,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        catalog::save(&self.data_dir, &CatalogFile { databases: entries })
    }
}
