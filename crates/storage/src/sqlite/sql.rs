//! SQL statements for the records table
//!
//! Every function takes a plain `&Connection` so the same statements run on
//! a pooled connection and inside an open transaction.

use super::sql_err;
use crate::repository::{MigrationMode, Row, Schema};
use crate::RECORDS_TABLE;
use recordstore_core::{Context, RecordKey, Result, VersionToken};
use rusqlite::{params, Connection, OptionalExtension};

fn columns(schema: Schema) -> &'static str {
    match schema {
        Schema::Baseline => "key, title, content",
        Schema::Versioned => "key, title, content, version",
    }
}

fn column_defs(schema: Schema) -> &'static str {
    match schema {
        Schema::Baseline => {
            "key TEXT NOT NULL PRIMARY KEY, title TEXT NOT NULL, content TEXT NOT NULL"
        }
        Schema::Versioned => {
            "key TEXT NOT NULL PRIMARY KEY, title TEXT NOT NULL, content TEXT NOT NULL, version TEXT NOT NULL"
        }
    }
}

fn read_row(schema: Schema, r: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let version = match schema {
        Schema::Baseline => None,
        Schema::Versioned => Some(VersionToken::from(r.get::<_, String>(3)?)),
    };
    Ok(Row {
        key: RecordKey::from(r.get::<_, String>(0)?),
        title: r.get(1)?,
        content: r.get(2)?,
        version,
    })
}

pub(crate) fn migrate(conn: &Connection, schema: Schema, mode: MigrationMode) -> Result<()> {
    let batch = match mode {
        MigrationMode::CreateIfMissing => format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            RECORDS_TABLE,
            column_defs(schema)
        ),
        MigrationMode::Recreate => format!(
            "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} ({defs});",
            table = RECORDS_TABLE,
            defs = column_defs(schema)
        ),
    };
    conn.execute_batch(&batch).map_err(sql_err("migrate records table"))
}

pub(crate) fn find(conn: &Connection, schema: Schema, key: &RecordKey) -> Result<Option<Row>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE key = ?1",
        columns(schema),
        RECORDS_TABLE
    );
    conn.query_row(&sql, params![key.as_str()], |r| read_row(schema, r))
        .optional()
        .map_err(sql_err("find record"))
}

pub(crate) fn insert(conn: &Connection, schema: Schema, row: &Row) -> Result<u64> {
    let affected = match schema {
        Schema::Baseline => conn.execute(
            &format!(
                "INSERT INTO {} (key, title, content) VALUES (?1, ?2, ?3)",
                RECORDS_TABLE
            ),
            params![row.key.as_str(), row.title, row.content],
        ),
        Schema::Versioned => conn.execute(
            &format!(
                "INSERT INTO {} (key, title, content, version) VALUES (?1, ?2, ?3, ?4)",
                RECORDS_TABLE
            ),
            params![
                row.key.as_str(),
                row.title,
                row.content,
                row.version.as_ref().map(|v| v.as_str())
            ],
        ),
    }
    .map_err(sql_err("insert record"))?;
    Ok(affected as u64)
}

/// A `None` version leaves the stored version untouched
pub(crate) fn update(conn: &Connection, schema: Schema, row: &Row) -> Result<u64> {
    let affected = match schema {
        Schema::Baseline => conn.execute(
            &format!(
                "UPDATE {} SET title = ?2, content = ?3 WHERE key = ?1",
                RECORDS_TABLE
            ),
            params![row.key.as_str(), row.title, row.content],
        ),
        Schema::Versioned => conn.execute(
            &format!(
                "UPDATE {} SET title = ?2, content = ?3, version = COALESCE(?4, version) WHERE key = ?1",
                RECORDS_TABLE
            ),
            params![
                row.key.as_str(),
                row.title,
                row.content,
                row.version.as_ref().map(|v| v.as_str())
            ],
        ),
    }
    .map_err(sql_err("update record"))?;
    Ok(affected as u64)
}

pub(crate) fn delete(conn: &Connection, key: &RecordKey) -> Result<u64> {
    let affected = conn
        .execute(
            &format!("DELETE FROM {} WHERE key = ?1", RECORDS_TABLE),
            params![key.as_str()],
        )
        .map_err(sql_err("delete record"))?;
    Ok(affected as u64)
}

/// Rows in rowid (insertion) order; the context is checked per row
pub(crate) fn scan(conn: &Connection, schema: Schema, ctx: &Context) -> Result<Vec<Row>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY rowid",
        columns(schema),
        RECORDS_TABLE
    );
    let mut stmt = conn.prepare(&sql).map_err(sql_err("prepare scan"))?;
    let rows = stmt
        .query_map([], |r| read_row(schema, r))
        .map_err(sql_err("scan records"))?;

    let mut out = Vec::with_capacity(10);
    for row in rows {
        ctx.check()?;
        out.push(row.map_err(sql_err("read scanned record"))?);
    }
    Ok(out)
}
