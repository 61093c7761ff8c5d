//! Invoice and invoice-item table access.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{corrupt_column, map_db};
use crate::core::{Error, Invoice, InvoiceItem, InvoiceStatus, PaymentMethod, VatRate};

fn from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let status_raw: String = row.get("status")?;
    let status =
        InvoiceStatus::from_str(&status_raw).ok_or_else(|| corrupt_column("status", &status_raw))?;
    let method_raw: String = row.get("payment_method")?;
    let payment_method = PaymentMethod::from_str(&method_raw)
        .ok_or_else(|| corrupt_column("payment_method", &method_raw))?;
    let xml_path: Option<String> = row.get("xml_path")?;
    let pdf_path: Option<String> = row.get("pdf_path")?;

    Ok(Invoice {
        id: row.get("id")?,
        invoice_number: row.get("invoice_number")?,
        issue_date: row.get("issue_date")?,
        sale_date: row.get("sale_date")?,
        client_id: row.get("client_id")?,
        status,
        payment_method,
        payment_deadline: row.get("payment_deadline")?,
        currency: row.get("currency")?,
        exchange_rate: row.get("exchange_rate")?,
        notes: row.get("notes")?,
        subtotal_grosze: row.get("subtotal_grosze")?,
        tax_grosze: row.get("tax_grosze")?,
        total_grosze: row.get("total_grosze")?,
        xml_path: xml_path.map(PathBuf::from),
        pdf_path: pdf_path.map(PathBuf::from),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    let rate_raw: String = row.get("vat_rate")?;
    let vat_rate =
        VatRate::from_db_str(&rate_raw).ok_or_else(|| corrupt_column("vat_rate", &rate_raw))?;

    Ok(InvoiceItem {
        id: row.get("id")?,
        invoice_id: row.get("invoice_id")?,
        name: row.get("name")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
        unit_price_grosze: row.get("unit_price_grosze")?,
        vat_rate,
        net_grosze: row.get("net_grosze")?,
        vat_grosze: row.get("vat_grosze")?,
        gross_grosze: row.get("gross_grosze")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert an invoice row (the `id` field is ignored) and return the new id.
pub fn insert(conn: &Connection, invoice: &Invoice) -> Result<i64, Error> {
    debug!(number = %invoice.invoice_number, "inserting invoice");
    conn.execute(
        "INSERT INTO invoices (
            invoice_number, issue_date, sale_date, client_id, status,
            payment_method, payment_deadline, currency, exchange_rate, notes,
            subtotal_grosze, tax_grosze, total_grosze, xml_path, pdf_path,
            created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            invoice.invoice_number,
            invoice.issue_date,
            invoice.sale_date,
            invoice.client_id,
            invoice.status.as_str(),
            invoice.payment_method.as_str(),
            invoice.payment_deadline,
            invoice.currency,
            invoice.exchange_rate,
            invoice.notes,
            invoice.subtotal_grosze,
            invoice.tax_grosze,
            invoice.total_grosze,
            invoice.xml_path.as_ref().map(|p| p.display().to_string()),
            invoice.pdf_path.as_ref().map(|p| p.display().to_string()),
            invoice.created_at,
            invoice.updated_at,
        ],
    )
    .map_err(map_db)?;
    Ok(conn.last_insert_rowid())
}

/// Insert all items for an invoice, preserving input order.
pub fn insert_items(
    conn: &Connection,
    invoice_id: i64,
    items: &[InvoiceItem],
) -> Result<(), Error> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO invoice_items (
                invoice_id, name, quantity, unit, unit_price_grosze, vat_rate,
                net_grosze, vat_grosze, gross_grosze, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .map_err(map_db)?;
    for item in items {
        stmt.execute(params![
            invoice_id,
            item.name,
            item.quantity,
            item.unit,
            item.unit_price_grosze,
            item.vat_rate.as_db_str(),
            item.net_grosze,
            item.vat_grosze,
            item.gross_grosze,
            item.created_at,
        ])
        .map_err(map_db)?;
    }
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Invoice>, Error> {
    conn.query_row("SELECT * FROM invoices WHERE id = ?1", params![id], from_row)
        .optional()
        .map_err(map_db)
}

/// Items of one invoice, in insertion order.
pub fn items(conn: &Connection, invoice_id: i64) -> Result<Vec<InvoiceItem>, Error> {
    let mut stmt = conn
        .prepare("SELECT * FROM invoice_items WHERE invoice_id = ?1 ORDER BY id")
        .map_err(map_db)?;
    let rows = stmt.query_map(params![invoice_id], item_from_row).map_err(map_db)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_db)
}

pub fn number_exists(conn: &Connection, number: &str) -> Result<bool, Error> {
    conn.query_row(
        "SELECT 1 FROM invoices WHERE invoice_number = ?1",
        params![number],
        |_| Ok(()),
    )
    .optional()
    .map_err(map_db)
    .map(|found| found.is_some())
}

/// Rewrite all mutable columns of the row identified by `invoice.id`.
pub fn update(conn: &Connection, invoice: &Invoice) -> Result<(), Error> {
    conn.execute(
        "UPDATE invoices
         SET invoice_number = ?1, issue_date = ?2, sale_date = ?3, client_id = ?4,
             status = ?5, payment_method = ?6, payment_deadline = ?7, currency = ?8,
             exchange_rate = ?9, notes = ?10, subtotal_grosze = ?11, tax_grosze = ?12,
             total_grosze = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            invoice.invoice_number,
            invoice.issue_date,
            invoice.sale_date,
            invoice.client_id,
            invoice.status.as_str(),
            invoice.payment_method.as_str(),
            invoice.payment_deadline,
            invoice.currency,
            invoice.exchange_rate,
            invoice.notes,
            invoice.subtotal_grosze,
            invoice.tax_grosze,
            invoice.total_grosze,
            invoice.updated_at,
            invoice.id,
        ],
    )
    .map_err(map_db)?;
    Ok(())
}

pub fn delete_items(conn: &Connection, invoice_id: i64) -> Result<(), Error> {
    conn.execute(
        "DELETE FROM invoice_items WHERE invoice_id = ?1",
        params![invoice_id],
    )
    .map_err(map_db)?;
    Ok(())
}

pub fn set_status(
    conn: &Connection,
    id: i64,
    status: InvoiceStatus,
    updated_at: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "UPDATE invoices SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), updated_at, id],
    )
    .map_err(map_db)?;
    Ok(())
}

pub fn set_xml_path(
    conn: &Connection,
    id: i64,
    path: &Path,
    updated_at: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "UPDATE invoices SET xml_path = ?1, updated_at = ?2 WHERE id = ?3",
        params![path.display().to_string(), updated_at, id],
    )
    .map_err(map_db)?;
    Ok(())
}

pub fn set_pdf_path(
    conn: &Connection,
    id: i64,
    path: &Path,
    updated_at: DateTime<Utc>,
) -> Result<(), Error> {
    conn.execute(
        "UPDATE invoices SET pdf_path = ?1, updated_at = ?2 WHERE id = ?3",
        params![path.display().to_string(), updated_at, id],
    )
    .map_err(map_db)?;
    Ok(())
}

/// Delete an invoice; items cascade. Returns whether a row existed.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, Error> {
    let affected = conn
        .execute("DELETE FROM invoices WHERE id = ?1", params![id])
        .map_err(map_db)?;
    Ok(affected > 0)
}

pub fn list(conn: &Connection) -> Result<Vec<Invoice>, Error> {
    let mut stmt = conn
        .prepare("SELECT * FROM invoices ORDER BY issue_date DESC, id DESC")
        .map_err(map_db)?;
    let rows = stmt.query_map([], from_row).map_err(map_db)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_db)
}
