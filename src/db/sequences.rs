//! Monthly invoice-number sequences.
//!
//! One row per (year, month) bucket; `last_number` only ever grows. The
//! read-and-increment is a single UPSERT with `RETURNING`, so two
//! concurrent allocations serialize at the unique index and can never hand
//! out the same value. Gaps are permitted: a rolled-back creation leaves
//! its allocated number unused.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::map_db;
use crate::core::Error;

/// Atomically bump and return the next sequence value for a bucket.
/// Must be called inside the creation transaction so a failed insert
/// rolls the bump back together with everything else.
pub fn allocate(
    conn: &Connection,
    year: i32,
    month: u32,
    now: DateTime<Utc>,
) -> Result<i64, Error> {
    conn.query_row(
        "INSERT INTO invoice_sequences (year, month, last_number, created_at, updated_at)
         VALUES (?1, ?2, 1, ?3, ?3)
         ON CONFLICT(year, month) DO UPDATE
           SET last_number = last_number + 1, updated_at = ?3
         RETURNING last_number",
        params![year, month, now],
        |row| row.get(0),
    )
    .map_err(map_db)
}

/// Current counter value of a bucket, if it exists.
pub fn last_number(conn: &Connection, year: i32, month: u32) -> Result<Option<i64>, Error> {
    conn.query_row(
        "SELECT last_number FROM invoice_sequences WHERE year = ?1 AND month = ?2",
        params![year, month],
        |row| row.get(0),
    )
    .optional()
    .map_err(map_db)
}
