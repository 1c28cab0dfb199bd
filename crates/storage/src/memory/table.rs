//! In-memory records table
//!
//! FxHashMap keyed by [`RecordKey`] for O(1) lookups. Each row remembers its
//! insertion sequence so scans come back in insertion order, the same order
//! a rowid table would produce.

use crate::repository::Row;
use crate::RECORDS_TABLE;
use recordstore_core::{RecordKey, Result, StoreError};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct StoredRow {
    seq: u64,
    row: Row,
}

/// The records table
///
/// Starts out missing: every access fails until the table is created by a
/// migration, as with a database file that has no schema yet.
#[derive(Debug, Default)]
pub(crate) struct Table {
    created: bool,
    rows: FxHashMap<RecordKey, StoredRow>,
    next_seq: u64,
}

impl Table {
    pub(crate) fn require_created(&self) -> Result<()> {
        if !self.created {
            return Err(StoreError::storage_msg(format!(
                "no such table: {}",
                RECORDS_TABLE
            )));
        }
        Ok(())
    }

    pub(crate) fn create_if_missing(&mut self) {
        self.created = true;
    }

    pub(crate) fn recreate(&mut self) {
        self.rows.clear();
        self.next_seq = 0;
        self.created = true;
    }

    pub(crate) fn get(&self, key: &RecordKey) -> Result<Option<Row>> {
        self.require_created()?;
        Ok(self.rows.get(key).map(|stored| stored.row.clone()))
    }

    pub(crate) fn insert(&mut self, row: Row) -> Result<u64> {
        self.require_created()?;
        if self.rows.contains_key(&row.key) {
            return Err(StoreError::storage_msg(format!(
                "UNIQUE constraint failed: {}.key",
                RECORDS_TABLE
            )));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rows.insert(row.key.clone(), StoredRow { seq, row });
        Ok(1)
    }

    /// Overwrite title/content, and version when the update carries one
    pub(crate) fn update(&mut self, row: &Row) -> Result<u64> {
        self.require_created()?;
        match self.rows.get_mut(&row.key) {
            Some(stored) => {
                stored.row.title.clone_from(&row.title);
                stored.row.content.clone_from(&row.content);
                if let Some(version) = &row.version {
                    stored.row.version = Some(version.clone());
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    pub(crate) fn delete(&mut self, key: &RecordKey) -> Result<u64> {
        self.require_created()?;
        Ok(self.rows.remove(key).map_or(0, |_| 1))
    }

    pub(crate) fn scan(&self) -> Result<Vec<Row>> {
        self.require_created()?;
        let mut stored: Vec<&StoredRow> = self.rows.values().collect();
        stored.sort_by_key(|s| s.seq);
        Ok(stored.into_iter().map(|s| s.row.clone()).collect())
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
