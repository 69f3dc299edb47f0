//! Constraint validation for the write paths. The caller holds the target
//! table's exclusive lock, so nothing here re-locks the target; referenced
//! tables are resolved through the engine's table map that the engine hands
//! in explicitly.

use crate::common::{Constraint, Error, Result};
use crate::storage::engine::paged::PagedTable;
use crate::storage::page::TupleId;
use crate::storage::tuple::{Row, Tuple};
use crate::types::{Column, Field};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type TableMap = HashMap<String, Arc<RwLock<PagedTable>>>;

/// Rejects table definitions with duplicate column names or more than one
/// primary key.
pub fn validate_schema(table_name: &str, columns: &[Column]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::Schema(format!(
            "Table {table_name} must have at least one column"
        )));
    }

    let mut seen = Vec::with_capacity(columns.len());
    let mut primary_keys = 0;
    for column in columns {
        if seen.contains(&column.get_name()) {
            return Err(Error::Schema(format!(
                "Duplicate column {} in table {table_name}",
                column.get_name()
            )));
        }
        seen.push(column.get_name());
        if column.is_primary_key() {
            primary_keys += 1;
        }
    }
    if primary_keys > 1 {
        return Err(Error::Schema(format!(
            "Table {table_name} declares {primary_keys} primary keys; at most one is allowed"
        )));
    }
    Ok(())
}

/// Insert-path validation: NOT NULL, UNIQUE/PRIMARY KEY, and FOREIGN KEY
/// checks for every column. `row` carries a value for every schema column
/// (defaults are applied before validation).
pub fn validate_insert(table: &PagedTable, siblings: &TableMap, row: &Row) -> Result<()> {
    validate_row(table, siblings, row, None)
}

/// Update-path validation: identical to the insert path, but `updated`
/// is excluded from uniqueness probes so a row may update to itself.
pub fn validate_update(
    table: &PagedTable,
    siblings: &TableMap,
    row: &Row,
    updated: &TupleId,
) -> Result<()> {
    validate_row(table, siblings, row, Some(updated))
}

fn validate_row(
    table: &PagedTable,
    siblings: &TableMap,
    row: &Row,
    exclude: Option<&TupleId>,
) -> Result<()> {
    let table_name = table.schema().name();
    for column in table.schema().columns() {
        let value = row.get_or_null(column.get_name());

        if column.is_not_null() && value.is_null() {
            return Err(Error::constraint(
                Constraint::NotNull,
                table_name,
                column.get_name(),
                &value,
            ));
        }
        if value.is_null() {
            continue;
        }

        if column.is_unique() && value_exists(table, column, &value, exclude)? {
            let constraint = if column.is_primary_key() {
                Constraint::PrimaryKey
            } else {
                Constraint::Unique
            };
            return Err(Error::constraint(
                constraint,
                table_name,
                column.get_name(),
                &value,
            ));
        }

        if let Some(fk) = column.foreign_key() {
            let found = with_referenced(table, siblings, &fk.table, |referenced| {
                let referenced_column =
                    referenced.schema().column_by_name(&fk.column).ok_or_else(|| {
                        Error::NotFound(format!(
                            "Referenced column {}.{} does not exist",
                            fk.table, fk.column
                        ))
                    })?;
                value_exists(referenced, referenced_column, &value, None)
            })?;
            if !found {
                return Err(Error::constraint(
                    Constraint::ForeignKey,
                    table_name,
                    column.get_name(),
                    &value,
                ));
            }
        }
    }
    Ok(())
}

/// Whether any live tuple other than `exclude` carries `value` in `column`.
/// Uses the column's index when one exists (a single lookup); otherwise
/// falls back to a full tuple scan. Both paths use the engine-wide value
/// order, so they detect the same duplicates.
fn value_exists(
    table: &PagedTable,
    column: &Column,
    value: &Field,
    exclude: Option<&TupleId>,
) -> Result<bool> {
    if let Some(index) = table.index(column.get_name()) {
        return Ok(index
            .lookup_all(value)
            .iter()
            .any(|tid| exclude != Some(tid)));
    }

    for tid in table.tuple_ids() {
        if exclude == Some(tid) {
            continue;
        }
        let bytes = table.heap().get_tuple(tid)?;
        let tuple = match Tuple::deserialize(&bytes) {
            Ok(tuple) => tuple,
            Err(err) => {
                log::warn!("skipping unreadable tuple {tid} during validation: {err}");
                continue;
            }
        };
        let stored = match tuple.row.get(column.get_name()) {
            Some(stored) => stored.clone(),
            None => column.default().cloned().unwrap_or(Field::Null),
        };
        if stored.compare(value) == Ordering::Equal {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Runs `f` against the referenced table. A self-reference reuses the
/// already-locked target table instead of re-locking it.
fn with_referenced<R>(
    target: &PagedTable,
    siblings: &TableMap,
    referenced_name: &str,
    f: impl FnOnce(&PagedTable) -> Result<R>,
) -> Result<R> {
    if referenced_name == target.schema().name() {
        return f(target);
    }
    let handle = siblings.get(referenced_name).ok_or_else(|| {
        Error::NotFound(format!("Referenced table {referenced_name} does not exist"))
    })?;
    let guard = handle.read()?;
    f(&guard)
}
