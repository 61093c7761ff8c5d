//! Embedded SQLite persistence.
//!
//! One shared connection behind a mutex; the store itself serializes
//! writers, and every multi-row mutation runs through [`Database::with_tx`]
//! as one immediate transaction. The schema is self-creating and
//! idempotent; WAL journaling and foreign keys are enabled on open.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::core::Error;

pub mod clients;
pub mod invoices;
pub mod sequences;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    nip          TEXT NOT NULL UNIQUE,
    address      TEXT,
    city         TEXT,
    postal_code  TEXT,
    email        TEXT,
    phone        TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invoices (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_number   TEXT NOT NULL UNIQUE,
    issue_date       TEXT NOT NULL,
    sale_date        TEXT NOT NULL,
    client_id        INTEGER NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
    status           TEXT NOT NULL DEFAULT 'draft',
    payment_method   TEXT NOT NULL DEFAULT 'bank_transfer',
    payment_deadline TEXT,
    currency         TEXT NOT NULL DEFAULT 'PLN',
    exchange_rate    REAL,
    notes            TEXT,
    subtotal_grosze  INTEGER NOT NULL DEFAULT 0,
    tax_grosze       INTEGER NOT NULL DEFAULT 0,
    total_grosze     INTEGER NOT NULL DEFAULT 0,
    xml_path         TEXT,
    pdf_path         TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoices_issue_date ON invoices(issue_date);
CREATE INDEX IF NOT EXISTS idx_invoices_client_id ON invoices(client_id);

CREATE TABLE IF NOT EXISTS invoice_items (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_id        INTEGER NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    name              TEXT NOT NULL,
    quantity          TEXT NOT NULL,
    unit              TEXT NOT NULL,
    unit_price_grosze INTEGER NOT NULL,
    vat_rate          TEXT NOT NULL,
    net_grosze        INTEGER NOT NULL,
    vat_grosze        INTEGER NOT NULL,
    gross_grosze      INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoice_items_invoice_id ON invoice_items(invoice_id);

CREATE TABLE IF NOT EXISTS invoice_sequences (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    year        INTEGER NOT NULL,
    month       INTEGER NOT NULL,
    last_number INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE(year, month)
);
"#;

/// Shared handle to the embedded database. Cheap to clone; internally
/// thread-safe.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (creating if missing) the database file and apply the schema.
    pub fn open(path: &Path) -> Result<Self, Error> {
        debug!(path = %path.display(), "opening database");
        let conn = Connection::open(path)
            .map_err(|e| Error::Io(format!("cannot open database {}: {e}", path.display())))?;
        Self::from_connection(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Io(format!("cannot open in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, Error> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(map_db)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(map_db)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(map_db)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(map_db)?;
        conn.execute_batch(SCHEMA).map_err(map_db)?;
        debug!("schema ready");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run read-only or single-statement work on the shared connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| Error::Internal("database mutex poisoned".into()))?;
        f(&guard)
    }

    /// Run `f` inside one immediate write transaction. Commit on `Ok`,
    /// roll back the whole unit on `Err`.
    pub fn with_tx<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::Internal("database mutex poisoned".into()))?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_db)?;
        let value = f(&tx)?;
        tx.commit().map_err(map_db)?;
        Ok(value)
    }
}

/// Classify engine errors onto the core taxonomy: unique-constraint
/// violations are conflicts, foreign-key violations are in-use references,
/// anything else is an environment failure.
pub(crate) fn map_db(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &e {
        let detail = message.clone().unwrap_or_else(|| e.to_string());
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => return Error::Conflict(detail),
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER => return Error::ReferenceInUse(detail),
            _ => {}
        }
    }
    Error::Io(format!("database error: {e}"))
}

/// Column-decode failure for a stored enum. Reaching this means the row
/// was written by something other than this crate.
pub(crate) fn corrupt_column(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("corrupt {column}: {value:?}").into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch(SCHEMA).map_err(map_db)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO invoices (invoice_number, issue_date, sale_date, client_id, created_at, updated_at)
                     VALUES ('FV/2026/01/0001', '2026-01-15', '2026-01-15', 999, '', '')",
                    [],
                )
                .map_err(map_db)?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::ReferenceInUse(_)));
    }
}
