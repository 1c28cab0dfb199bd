//! Conversions between records and repository rows

use recordstore_core::{Context, Record, RecordKey, Result, StoreError, VersionToken};
use recordstore_storage::{KeyLookup, Row};

/// Look up `key`, mapping absence to `NotFound`
pub(crate) fn find_with<L: KeyLookup + ?Sized>(
    lookup: &L,
    ctx: &Context,
    key: &RecordKey,
) -> Result<Row> {
    lookup
        .find_by_key(ctx, key)?
        .ok_or_else(|| StoreError::NotFound { key: key.clone() })
}

pub(crate) fn to_record(row: Row) -> Record {
    Record {
        key: Some(row.key),
        title: row.title,
        content: row.content,
        version: row.version,
    }
}

pub(crate) fn to_row(record: &Record, key: RecordKey, version: Option<VersionToken>) -> Row {
    Row {
        key,
        title: record.title.clone(),
        content: record.content.clone(),
        version,
    }
}
