//! PDF renderer tests: structural checks on the produced bytes via lopdf.
//!
//! The built-in monospace fallback font keeps the suite hermetic — no
//! platform font files are required.

#![cfg(feature = "pdf")]

use chrono::{NaiveDate, TimeZone, Utc};
use fakturka::core::{
    invoice_totals, line_amounts, parse_quantity, Client, Invoice, InvoiceDocument, InvoiceItem,
    InvoiceStatus, LineAmounts, PaymentMethod, Seller, VatRate,
};
use fakturka::pdf::{render_invoice, FontResolver, ResolvedFont};

fn seller() -> Seller {
    Seller {
        name: "Jan Kowalski IT".into(),
        nip: "1234563218".into(),
        street: "ul. Prosta 1".into(),
        postal_code: "00-001".into(),
        city: "Warszawa".into(),
        email: Some("jan@kowalski.pl".into()),
        phone: Some("+48 600 100 200".into()),
        bank_account: Some("PL61 1090 1014 0000 0712 1981 2874".into()),
    }
}

fn buyer() -> Client {
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
    Client {
        id: 1,
        name: "Klient Sp. z o.o.".into(),
        nip: "5260001246".into(),
        address: Some("ul. Marszałkowska 100".into()),
        city: Some("Warszawa".into()),
        postal_code: Some("00-026".into()),
        email: None,
        phone: None,
        created_at: now,
        updated_at: now,
    }
}

fn item(name: &str, qty: &str, unit: &str, price: i64, rate: VatRate) -> InvoiceItem {
    let amounts = line_amounts(price, parse_quantity(qty).unwrap(), rate).unwrap();
    InvoiceItem {
        id: 0,
        invoice_id: 1,
        name: name.into(),
        quantity: qty.into(),
        unit: unit.into(),
        unit_price_grosze: price,
        vat_rate: rate,
        net_grosze: amounts.net,
        vat_grosze: amounts.vat,
        gross_grosze: amounts.gross,
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap(),
    }
}

fn document(items: Vec<InvoiceItem>, notes: Option<&str>) -> InvoiceDocument {
    let amounts: Vec<LineAmounts> = items
        .iter()
        .map(|i| LineAmounts {
            net: i.net_grosze,
            vat: i.vat_grosze,
            gross: i.gross_grosze,
        })
        .collect();
    let totals = invoice_totals(&amounts).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();

    InvoiceDocument {
        invoice: Invoice {
            id: 1,
            invoice_number: "FV/2026/01/0001".into(),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            sale_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            client_id: 1,
            status: InvoiceStatus::Issued,
            payment_method: PaymentMethod::BankTransfer,
            payment_deadline: NaiveDate::from_ymd_opt(2026, 1, 29),
            currency: "PLN".into(),
            exchange_rate: None,
            notes: notes.map(String::from),
            subtotal_grosze: totals.subtotal,
            tax_grosze: totals.tax,
            total_grosze: totals.total,
            xml_path: None,
            pdf_path: None,
            created_at: now,
            updated_at: now,
        },
        items,
        buyer: buyer(),
        seller: seller(),
    }
}

#[test]
fn renders_a_single_page_a4_document() {
    let doc = document(
        vec![
            item("Usługa programistyczna", "10", "h", 10000, VatRate::Rate23),
            item("Konsultacja", "2.5", "h", 8000, VatRate::Rate8),
            item("Szkolenie zespołu (materiały żółte, ćwiczenia)", "1", "szt", 50000, VatRate::Zw),
        ],
        Some("Płatność przelewem na rachunek wskazany poniżej."),
    );

    let bytes = render_invoice(&doc, &ResolvedFont::BuiltinMonospace).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let parsed = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 1);
}

#[test]
fn rejects_items_beyond_single_page_capacity() {
    let items: Vec<InvoiceItem> = (0..80)
        .map(|i| item(&format!("Pozycja {i}"), "1", "szt", 1000, VatRate::Rate23))
        .collect();
    let doc = document(items, None);

    let err = render_invoice(&doc, &ResolvedFont::BuiltinMonospace).unwrap_err();
    assert!(err.to_string().contains("too many items"));
}

#[test]
fn renders_without_optional_blocks() {
    let mut doc = document(vec![item("A", "1", "szt", 100, VatRate::Rate23)], None);
    doc.seller.bank_account = None;
    doc.invoice.payment_deadline = None;
    doc.buyer.address = None;
    doc.buyer.postal_code = None;
    doc.buyer.city = None;

    let bytes = render_invoice(&doc, &ResolvedFont::BuiltinMonospace).unwrap();
    assert!(lopdf::Document::load_mem(&bytes).is_ok());
}

#[test]
fn font_resolver_falls_back_to_monospace() {
    let resolver = FontResolver::with_candidates(vec!["/definitely/not/here.ttf".into()]);
    assert!(matches!(resolver.resolve(), ResolvedFont::BuiltinMonospace));
}

#[test]
fn embedded_ttf_font_is_used_when_readable() {
    // Any real TTF works; probe the default list and skip when the
    // machine has none (CI images without fonts).
    match FontResolver::default().resolve() {
        ResolvedFont::Ttf(bytes) => {
            let doc = document(vec![item("Żółć", "1", "szt", 100, VatRate::Rate23)], None);
            let rendered = render_invoice(&doc, &ResolvedFont::Ttf(bytes)).unwrap();
            assert!(lopdf::Document::load_mem(&rendered).is_ok());
        }
        ResolvedFont::BuiltinMonospace => eprintln!("no platform font available, skipping"),
    }
}
