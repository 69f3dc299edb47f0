use crate::common::Result;
use serde::Deserialize;

/// Fixed on-disk page size. Every heap file is an integer multiple of this.
pub const PAGE_DB_PAGE_SIZE_BYTES: usize = 8192;

/// Default directory for the catalog and heap files.
pub const PAGE_DB_DATA_DIR: &str = "data";

/// Default number of accumulated dead tuples that triggers an automatic
/// vacuum pass on a table.
pub const DEFAULT_AUTO_VACUUM_THRESHOLD: usize = 1000;

/// Default wall-clock deadline for stored-procedure execution.
pub const DEFAULT_PROCEDURE_TIMEOUT_MS: u64 = 5000;

/// Tunable engine settings, loadable from `PAGEDB_*` environment variables
/// (e.g. `PAGEDB_DATA_DIR`, `PAGEDB_AUTO_VACUUM_THRESHOLD`).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: String,
    pub auto_vacuum_threshold: usize,
    pub procedure_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: PAGE_DB_DATA_DIR.to_string(),
            auto_vacuum_threshold: DEFAULT_AUTO_VACUUM_THRESHOLD,
            procedure_timeout_ms: DEFAULT_PROCEDURE_TIMEOUT_MS,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let settings = ::config::Config::builder()
            .add_source(::config::Environment::with_prefix("PAGEDB"))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap_or_default();
        Ok(settings)
    }

    #[cfg(test)]
    pub fn for_test(data_dir: &str) -> Settings {
        Settings {
            data_dir: data_dir.to_string(),
            ..Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.data_dir, PAGE_DB_DATA_DIR);
        assert_eq!(settings.auto_vacuum_threshold, DEFAULT_AUTO_VACUUM_THRESHOLD);
        assert_eq!(settings.procedure_timeout_ms, DEFAULT_PROCEDURE_TIMEOUT_MS);
    }
}
