//! Invoice lifecycle: create, update, issue, delete.
//!
//! Creation and update are single transactions. Issuance commits the
//! status change first, then generates artifacts (XML, then PDF),
//! persisting each path after its own success; a retried `issue` call
//! regenerates only what is missing.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::App;
use crate::core::validate::{
    optional_text, parse_date, required_text, validate_currency, MAX_NAME_LEN, MAX_NOTES_LEN,
    MAX_UNIT_LEN,
};
use crate::core::{
    artifact_file_name, format_invoice_number, invoice_totals, line_amounts,
    normalize_explicit_number, normalize_quantity, parse_quantity, year_month, Error, Invoice,
    InvoiceDocument, InvoiceItem, InvoicePatch, InvoiceStatus, InvoiceTotals, Issue, NewInvoice,
    NewItem, PaymentMethod,
};
use crate::db;
use crate::fa3;
use crate::pdf;

/// Accessor view over invoices and their items.
pub struct InvoiceService<'a> {
    app: &'a App,
}

fn issue_from(field: String, err: Error) -> Issue {
    let message = match err {
        Error::Validation { message, .. } => message,
        other => other.to_string(),
    };
    Issue::new(field, message)
}

/// Validate item inputs and compute their amounts, accumulating every
/// finding across all items before failing.
fn build_items(
    items: &[NewItem],
    now: DateTime<Utc>,
) -> Result<(Vec<InvoiceItem>, InvoiceTotals), Error> {
    if items.is_empty() {
        return Err(Error::validation("invoice must have at least one item"));
    }

    let mut issues: Vec<Issue> = Vec::new();
    let mut rows: Vec<InvoiceItem> = Vec::new();
    let mut amounts = Vec::new();

    for (i, input) in items.iter().enumerate() {
        let name = required_text(&format!("items[{i}].name"), &input.name, MAX_NAME_LEN);
        let unit = required_text(&format!("items[{i}].unit"), &input.unit, MAX_UNIT_LEN);
        let quantity = normalize_quantity(&input.quantity)
            .map_err(|e| issue_from(format!("items[{i}].quantity"), e));
        let quantity_milli = parse_quantity(&input.quantity)
            .map_err(|e| issue_from(format!("items[{i}].quantity"), e));
        let unit_price = input
            .unit_price_grosze
            .to_grosze()
            .map_err(|e| issue_from(format!("items[{i}].unit_price_grosze"), e));

        match (name, unit, quantity, quantity_milli, unit_price) {
            (Ok(name), Ok(unit), Ok(quantity), Ok(quantity_milli), Ok(unit_price)) => {
                match line_amounts(unit_price, quantity_milli, input.vat_rate) {
                    Ok(line) => {
                        amounts.push(line);
                        rows.push(InvoiceItem {
                            id: 0,
                            invoice_id: 0,
                            name,
                            quantity,
                            unit,
                            unit_price_grosze: unit_price,
                            vat_rate: input.vat_rate,
                            net_grosze: line.net,
                            vat_grosze: line.vat,
                            gross_grosze: line.gross,
                            created_at: now,
                        });
                    }
                    Err(e) => issues.push(issue_from(format!("items[{i}]"), e)),
                }
            }
            (name, unit, quantity, quantity_milli, unit_price) => {
                issues.extend(name.err());
                issues.extend(unit.err());
                // the two quantity checks fail identically; keep one
                issues.extend(quantity.err().or(quantity_milli.err()));
                issues.extend(unit_price.err());
            }
        }
    }

    if !issues.is_empty() {
        return Err(Error::invalid(issues));
    }

    let totals = invoice_totals(&amounts)?;
    Ok((rows, totals))
}

impl<'a> InvoiceService<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Create an invoice with its items in one transaction, allocating a
    /// monthly number unless the caller supplied one.
    pub fn create(&self, input: NewInvoice) -> Result<Invoice, Error> {
        let now = Utc::now();

        let issue_date = parse_date("issue_date", &input.issue_date)?;
        let sale_date = parse_date("sale_date", &input.sale_date)?;
        let payment_deadline = input
            .payment_deadline
            .as_deref()
            .map(|d| parse_date("payment_deadline", d))
            .transpose()?;
        let currency = validate_currency("currency", input.currency.as_deref().unwrap_or("PLN"))?;
        let notes = optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;
        let status = input.status.unwrap_or(InvoiceStatus::Draft);
        let payment_method = input.payment_method.unwrap_or(PaymentMethod::BankTransfer);
        let explicit_number = input
            .invoice_number
            .as_deref()
            .map(normalize_explicit_number)
            .transpose()?;
        let (items, totals) = build_items(&input.items, now)?;

        let invoice = self.app.database().with_tx(|tx| {
            if db::clients::get(tx, input.client_id)?.is_none() {
                return Err(Error::NotFound {
                    entity: "client",
                    id: input.client_id,
                });
            }

            let invoice_number = match &explicit_number {
                Some(number) => {
                    if db::invoices::number_exists(tx, number)? {
                        return Err(Error::Conflict(format!(
                            "invoice number {number} is already in use"
                        )));
                    }
                    number.clone()
                }
                None => {
                    let (year, month) = year_month(issue_date)?;
                    let sequence = db::sequences::allocate(tx, year, month, now)?;
                    let number = format_invoice_number(year, month, sequence);
                    // defence in depth: the sequence table is the only
                    // writer of this shape, a collision means a bug
                    if db::invoices::number_exists(tx, &number)? {
                        return Err(Error::Internal(format!(
                            "allocated invoice number {number} collides with an existing invoice"
                        )));
                    }
                    number
                }
            };

            let mut invoice = Invoice {
                id: 0,
                invoice_number,
                issue_date,
                sale_date,
                client_id: input.client_id,
                status,
                payment_method,
                payment_deadline,
                currency: currency.clone(),
                exchange_rate: input.exchange_rate,
                notes: notes.clone(),
                subtotal_grosze: totals.subtotal,
                tax_grosze: totals.tax,
                total_grosze: totals.total,
                xml_path: None,
                pdf_path: None,
                created_at: now,
                updated_at: now,
            };
            invoice.id = db::invoices::insert(tx, &invoice)?;
            db::invoices::insert_items(tx, invoice.id, &items)?;
            Ok(invoice)
        })?;

        info!(number = %invoice.invoice_number, id = invoice.id, "invoice created");
        Ok(invoice)
    }

    pub fn get(&self, id: i64) -> Result<Invoice, Error> {
        self.app
            .database()
            .with_conn(|conn| db::invoices::get(conn, id))?
            .ok_or(Error::NotFound {
                entity: "invoice",
                id,
            })
    }

    /// Items of an invoice, in input order.
    pub fn items(&self, id: i64) -> Result<Vec<InvoiceItem>, Error> {
        self.app
            .database()
            .with_conn(|conn| db::invoices::items(conn, id))
    }

    pub fn list(&self) -> Result<Vec<Invoice>, Error> {
        self.app.database().with_conn(db::invoices::list)
    }

    /// Assemble the full document bundle (invoice, items, buyer, seller)
    /// the artifact generators consume.
    pub fn document(&self, id: i64) -> Result<InvoiceDocument, Error> {
        let (invoice, items, buyer) = self.app.database().with_conn(|conn| {
            let invoice = db::invoices::get(conn, id)?.ok_or(Error::NotFound {
                entity: "invoice",
                id,
            })?;
            let items = db::invoices::items(conn, id)?;
            let buyer = db::clients::get(conn, invoice.client_id)?.ok_or_else(|| {
                Error::Internal(format!(
                    "invoice {} references missing client {}",
                    invoice.invoice_number, invoice.client_id
                ))
            })?;
            Ok((invoice, items, buyer))
        })?;

        Ok(InvoiceDocument {
            invoice,
            items,
            buyer,
            seller: self.app.config().seller.clone(),
        })
    }

    /// Update a draft: merge non-null fields and, when items are present,
    /// replace them wholly and recompute totals — all in one transaction.
    pub fn update(&self, id: i64, patch: InvoicePatch) -> Result<Invoice, Error> {
        let now = Utc::now();

        if patch.status == Some(InvoiceStatus::Issued) {
            return Err(Error::validation(
                "status cannot be set to issued directly; call issue()",
            ));
        }

        let issue_date = patch
            .issue_date
            .as_deref()
            .map(|d| parse_date("issue_date", d))
            .transpose()?;
        let sale_date = patch
            .sale_date
            .as_deref()
            .map(|d| parse_date("sale_date", d))
            .transpose()?;
        let payment_deadline = patch
            .payment_deadline
            .as_deref()
            .map(|d| parse_date("payment_deadline", d))
            .transpose()?;
        let currency = patch
            .currency
            .as_deref()
            .map(|c| validate_currency("currency", c))
            .transpose()?;
        let notes = patch
            .notes
            .as_deref()
            .map(|n| optional_text("notes", Some(n), MAX_NOTES_LEN))
            .transpose()?;
        let explicit_number = patch
            .invoice_number
            .as_deref()
            .map(normalize_explicit_number)
            .transpose()?;
        let replacement = patch
            .items
            .as_deref()
            .map(|items| build_items(items, now))
            .transpose()?;

        let invoice = self.app.database().with_tx(|tx| {
            let mut invoice = db::invoices::get(tx, id)?.ok_or(Error::NotFound {
                entity: "invoice",
                id,
            })?;

            if invoice.status != InvoiceStatus::Draft {
                return Err(Error::Conflict(format!(
                    "invoice {} is {} and cannot be modified",
                    invoice.invoice_number,
                    invoice.status.as_str()
                )));
            }

            if let Some(number) = explicit_number {
                if number != invoice.invoice_number && db::invoices::number_exists(tx, &number)? {
                    return Err(Error::Conflict(format!(
                        "invoice number {number} is already in use"
                    )));
                }
                invoice.invoice_number = number;
            }
            if let Some(date) = issue_date {
                invoice.issue_date = date;
            }
            if let Some(date) = sale_date {
                invoice.sale_date = date;
            }
            if let Some(client_id) = patch.client_id {
                if db::clients::get(tx, client_id)?.is_none() {
                    return Err(Error::NotFound {
                        entity: "client",
                        id: client_id,
                    });
                }
                invoice.client_id = client_id;
            }
            if let Some(status) = patch.status {
                invoice.status = status;
            }
            if let Some(method) = patch.payment_method {
                invoice.payment_method = method;
            }
            if let Some(deadline) = payment_deadline {
                invoice.payment_deadline = Some(deadline);
            }
            if let Some(currency) = currency {
                invoice.currency = currency;
            }
            if let Some(rate) = patch.exchange_rate {
                invoice.exchange_rate = Some(rate);
            }
            if let Some(notes) = notes {
                invoice.notes = notes;
            }

            if let Some((items, totals)) = &replacement {
                db::invoices::delete_items(tx, id)?;
                db::invoices::insert_items(tx, id, items)?;
                invoice.subtotal_grosze = totals.subtotal;
                invoice.tax_grosze = totals.tax;
                invoice.total_grosze = totals.total;
            }

            invoice.updated_at = now;
            db::invoices::update(tx, &invoice)?;
            Ok(invoice)
        })?;

        info!(number = %invoice.invoice_number, id, "invoice updated");
        Ok(invoice)
    }

    /// Issue an invoice: commit the status change, then generate the XML
    /// and PDF artifacts. Idempotent — re-issuing regenerates only missing
    /// artifacts and never allocates a new number.
    pub fn issue(&self, id: i64) -> Result<Invoice, Error> {
        let now = Utc::now();

        let mut invoice = self.app.database().with_tx(|tx| {
            let mut invoice = db::invoices::get(tx, id)?.ok_or(Error::NotFound {
                entity: "invoice",
                id,
            })?;
            match invoice.status {
                InvoiceStatus::Issued => {}
                InvoiceStatus::Draft => {
                    db::invoices::set_status(tx, id, InvoiceStatus::Issued, now)?;
                    invoice.status = InvoiceStatus::Issued;
                    invoice.updated_at = now;
                }
                InvoiceStatus::Cancelled => {
                    return Err(Error::Conflict(format!(
                        "invoice {} is cancelled and cannot be issued",
                        invoice.invoice_number
                    )));
                }
            }
            Ok(invoice)
        })?;

        let doc = self.document(id)?;

        if artifact_missing(&invoice.xml_path) {
            if invoice.xml_path.is_some() {
                warn!(number = %invoice.invoice_number, "regenerating missing XML artifact");
            }
            let path = self.write_xml(&doc)?;
            self.app
                .database()
                .with_conn(|conn| db::invoices::set_xml_path(conn, id, &path, now))?;
            invoice.xml_path = Some(path);
            invoice.updated_at = now;
        }

        if artifact_missing(&invoice.pdf_path) {
            if invoice.pdf_path.is_some() {
                warn!(number = %invoice.invoice_number, "regenerating missing PDF artifact");
            }
            let path = self.write_pdf(&doc)?;
            self.app
                .database()
                .with_conn(|conn| db::invoices::set_pdf_path(conn, id, &path, now))?;
            invoice.pdf_path = Some(path);
            invoice.updated_at = now;
        }

        info!(number = %invoice.invoice_number, id, "invoice issued");
        Ok(invoice)
    }

    /// Delete an invoice; its items cascade. Callers guard deletion of
    /// issued invoices at the boundary.
    pub fn delete(&self, id: i64) -> Result<(), Error> {
        let deleted = self
            .app
            .database()
            .with_tx(|tx| db::invoices::delete(tx, id))?;
        if !deleted {
            return Err(Error::NotFound {
                entity: "invoice",
                id,
            });
        }
        info!(id, "invoice deleted");
        Ok(())
    }

    /// Write the FA(3) file and run it through the schema validator; the
    /// path is returned only after both succeeded.
    fn write_xml(&self, doc: &InvoiceDocument) -> Result<PathBuf, Error> {
        let xml = fa3::to_fa3_xml(doc, &self.app.config().system_info, Utc::now())?;
        let path = self.artifact_path(
            &self.app.config().xml_dir(),
            &doc.invoice.invoice_number,
            "xml",
        )?;
        fs::write(&path, xml.as_bytes())
            .map_err(|e| Error::Io(format!("cannot write {}: {e}", path.display())))?;
        self.app.validator().validate(&path)?;
        info!(path = %path.display(), "FA(3) document written and validated");
        Ok(path)
    }

    fn write_pdf(&self, doc: &InvoiceDocument) -> Result<PathBuf, Error> {
        let bytes = pdf::render_invoice(doc, self.app.font())?;
        let path = self.artifact_path(
            &self.app.config().pdf_dir(),
            &doc.invoice.invoice_number,
            "pdf",
        )?;
        fs::write(&path, &bytes)
            .map_err(|e| Error::Io(format!("cannot write {}: {e}", path.display())))?;
        info!(path = %path.display(), "PDF rendered");
        Ok(path)
    }

    /// Absolute artifact path inside the configured output directory,
    /// created on demand.
    fn artifact_path(&self, dir: &Path, invoice_number: &str, ext: &str) -> Result<PathBuf, Error> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Io(format!("cannot create {}: {e}", dir.display())))?;
        let dir = fs::canonicalize(dir)
            .map_err(|e| Error::Io(format!("cannot resolve {}: {e}", dir.display())))?;
        let file_name = artifact_file_name(invoice_number, ext)?;
        let path = dir.join(&file_name);
        if path.parent() != Some(dir.as_path()) {
            return Err(Error::validation(
                "invalid filename: escapes the output directory",
            ));
        }
        Ok(path)
    }
}

/// An artifact needs (re)generation when no path is recorded or the
/// recorded file is gone from disk.
fn artifact_missing(path: &Option<PathBuf>) -> bool {
    match path {
        Some(path) => !path.exists(),
        None => true,
    }
}
