//! Index: a local, on-disk cache of decrypted metadata records (C4).

pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

pub use sqlite::SqliteIndex;

/// One backed-up logical file. Primary key is `(back_end_id, entry_key)`;
/// `name` is deliberately not part of the key (SPEC_FULL.md §5) since it is
/// derivable from `path` and two records with different paths can share a
/// basename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub metadata_version: u32,
    pub back_end_id: String,
    pub entry_key: String,
    pub name: String,
    pub path: String,
    pub size: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub checksum: String,
    pub encryption_key: Option<String>,
    pub encrypted_size: u64,
    pub encrypted_checksum: String,
}

pub const CURRENT_METADATA_VERSION: u32 = 1;

/// A conjunction of equality predicates over record fields, used for dedup
/// lookup and the CLI's "already exists" probe.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub back_end_id: Option<String>,
    pub entry_key: Option<String>,
    pub checksum: Option<String>,
    pub path: Option<String>,
    pub path_prefix: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &MetadataRecord) -> bool {
        if let Some(v) = &self.back_end_id {
            if &record.back_end_id != v {
                return false;
            }
        }
        if let Some(v) = &self.entry_key {
            if &record.entry_key != v {
                return false;
            }
        }
        if let Some(v) = &self.checksum {
            if &record.checksum != v {
                return false;
            }
        }
        if let Some(v) = &self.path {
            if &record.path != v {
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !record.path.starts_with(prefix.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A persistent table of decrypted metadata records, authoritatively
/// rebuildable from the metadata bucket (`sync`).
pub trait Index {
    fn upsert(&mut self, record: &MetadataRecord) -> Result<(), VaultError>;
    fn delete_by(&mut self, filter: &RecordFilter) -> Result<(), VaultError>;
    fn list(&self, filter: &RecordFilter) -> Result<Vec<MetadataRecord>, VaultError>;
    fn find(&self, filter: &RecordFilter) -> Result<Vec<MetadataRecord>, VaultError> {
        self.list(filter)
    }
    fn find_one(&self, filter: &RecordFilter) -> Result<Option<MetadataRecord>, VaultError> {
        Ok(self.find(filter)?.into_iter().next())
    }
    /// Deletes all matching rows; an empty filter truncates the table.
    fn drop(&mut self, filter: &RecordFilter) -> Result<(), VaultError>;
}
