//! Catalog persistence: database names and table schemas are written to
//! `<data_dir>/catalog.json` at every DDL change and read back on open.

use crate::common::Result;
use crate::types::TableSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CATALOG_FILE: &str = "catalog.json";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    pub tables: Vec<TableSchema>,
}

pub fn catalog_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CATALOG_FILE)
}

/// The heap file for a table, named deterministically from the qualified
/// table name: `<data_dir>/<db>/<table>.heap`.
pub fn heap_path(data_dir: &Path, database: &str, table: &str) -> PathBuf {
    data_dir.join(database).join(format!("{table}.heap"))
}

pub fn load(data_dir: &Path) -> Result<CatalogFile> {
    let path = catalog_path(data_dir);
    if !path.exists() {
        return Ok(CatalogFile::default());
    }
    let raw = std::fs::read_to_string(&path)?;
    let catalog = serde_json::from_str(&raw)?;
    log::debug!("loaded catalog from {}", path.display());
    Ok(catalog)
}

pub fn save(data_dir: &Path, catalog: &CatalogFile) -> Result<()> {
    let path = catalog_path(data_dir);
    let raw = serde_json::to_string_pretty(catalog)?;
    std::fs::write(&path, raw)?;
    log::debug!("persisted catalog to {}", path.display());
    Ok(())
}
