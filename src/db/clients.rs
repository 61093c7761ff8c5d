//! Client table access. Functions take a plain connection so they compose
//! inside service transactions (a [`rusqlite::Transaction`] derefs to one).

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::map_db;
use crate::core::{Client, Error};

fn from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get("id")?,
        name: row.get("name")?,
        nip: row.get("nip")?,
        address: row.get("address")?,
        city: row.get("city")?,
        postal_code: row.get("postal_code")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a client (the `id` field is ignored) and return the new row id.
pub fn insert(conn: &Connection, client: &Client) -> Result<i64, Error> {
    debug!(nip = %client.nip, "inserting client");
    conn.execute(
        "INSERT INTO clients (name, nip, address, city, postal_code, email, phone, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            client.name,
            client.nip,
            client.address,
            client.city,
            client.postal_code,
            client.email,
            client.phone,
            client.created_at,
            client.updated_at,
        ],
    )
    .map_err(map_db)?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Client>, Error> {
    conn.query_row("SELECT * FROM clients WHERE id = ?1", params![id], from_row)
        .optional()
        .map_err(map_db)
}

/// Rewrite all mutable columns of the row identified by `client.id`.
pub fn update(conn: &Connection, client: &Client) -> Result<(), Error> {
    conn.execute(
        "UPDATE clients
         SET name = ?1, nip = ?2, address = ?3, city = ?4, postal_code = ?5,
             email = ?6, phone = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            client.name,
            client.nip,
            client.address,
            client.city,
            client.postal_code,
            client.email,
            client.phone,
            client.updated_at,
            client.id,
        ],
    )
    .map_err(map_db)?;
    Ok(())
}

/// Delete a client. Fails with a reference-in-use error while invoices
/// still point at it (RESTRICT foreign key). Returns whether a row existed.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, Error> {
    let affected = conn
        .execute("DELETE FROM clients WHERE id = ?1", params![id])
        .map_err(map_db)?;
    Ok(affected > 0)
}

pub fn list(conn: &Connection) -> Result<Vec<Client>, Error> {
    let mut stmt = conn
        .prepare("SELECT * FROM clients ORDER BY name, id")
        .map_err(map_db)?;
    let rows = stmt.query_map([], from_row).map_err(map_db)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_db)
}
