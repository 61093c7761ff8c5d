//! FA(3) document generation tests: literal scenarios, child order,
//! optional groups, and escaping.

#![cfg(feature = "fa3")]

use chrono::{NaiveDate, TimeZone, Utc};
use fakturka::core::{
    invoice_totals, line_amounts, parse_quantity, Client, Invoice, InvoiceDocument, InvoiceItem,
    InvoiceStatus, PaymentMethod, Seller, VatRate,
};
use fakturka::fa3::{to_fa3_xml, FA3_NAMESPACE};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seller() -> Seller {
    Seller {
        name: "Jan Kowalski IT".into(),
        nip: "1234563218".into(),
        street: "ul. Prosta 1".into(),
        postal_code: "00-001".into(),
        city: "Warszawa".into(),
        email: Some("jan@kowalski.pl".into()),
        phone: None,
        bank_account: None,
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

fn document(items: Vec<InvoiceItem>) -> InvoiceDocument {
    let amounts: Vec<_> = items
        .iter()
        .map(|i| fakturka::core::LineAmounts {
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
            issue_date: date(2026, 1, 15),
            sale_date: date(2026, 1, 15),
            client_id: 1,
            status: InvoiceStatus::Issued,
            payment_method: PaymentMethod::BankTransfer,
            payment_deadline: None,
            currency: "PLN".into(),
            exchange_rate: None,
            notes: None,
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

fn generate(doc: &InvoiceDocument) -> String {
    let generated_at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
    to_fa3_xml(doc, "fakturka-test", generated_at).unwrap()
}

// --- Scenario S1: single 23% line ---

#[test]
fn single_standard_rate_line() {
    let doc = document(vec![item("A", "1", "szt", 10000, VatRate::Rate23)]);
    assert_eq!(doc.invoice.subtotal_grosze, 10000);
    assert_eq!(doc.invoice.tax_grosze, 2300);
    assert_eq!(doc.invoice.total_grosze, 12300);

    let xml = generate(&doc);
    assert!(xml.contains("<P_13_1>100.00</P_13_1>"));
    assert!(xml.contains("<P_14_1>23.00</P_14_1>"));
    assert!(xml.contains("<P_15>123.00</P_15>"));
    assert!(xml.contains("<P_12>23</P_12>"));
    assert_eq!(xml.matches("<FaWiersz>").count(), 1);
    // unused rate aggregates are omitted
    assert!(!xml.contains("<P_13_2>"));
    assert!(!xml.contains("<P_13_3>"));
    assert!(!xml.contains("<P_13_6_1>"));
    assert!(!xml.contains("<P_13_7>"));
    assert!(!xml.contains("<P_13_8>"));
}

// --- Scenario S2: mixed 23% + 8% with fractional quantity ---

#[test]
fn mixed_rates_emit_both_aggregates() {
    let doc = document(vec![
        item("Usługa A", "1", "szt", 10000, VatRate::Rate23),
        item("Usługa B", "2.5", "h", 8000, VatRate::Rate8),
    ]);
    assert_eq!(doc.items[1].net_grosze, 20000);
    assert_eq!(doc.items[1].vat_grosze, 1600);
    assert_eq!(doc.invoice.subtotal_grosze, 30000);
    assert_eq!(doc.invoice.tax_grosze, 3900);
    assert_eq!(doc.invoice.total_grosze, 33900);

    let xml = generate(&doc);
    assert!(xml.contains("<P_13_1>100.00</P_13_1>"));
    assert!(xml.contains("<P_14_1>23.00</P_14_1>"));
    assert!(xml.contains("<P_13_2>200.00</P_13_2>"));
    assert!(xml.contains("<P_14_2>16.00</P_14_2>"));
    assert!(!xml.contains("<P_13_3>"));
    assert!(!xml.contains("<P_14_3>"));
    assert!(xml.contains("<P_15>339.00</P_15>"));
    assert!(xml.contains("<P_8B>2.5</P_8B>"));
    assert_eq!(xml.matches("<FaWiersz>").count(), 2);
}

// --- Scenario S3: exempt invoice ---

#[test]
fn exempt_invoice_uses_zwolnienie_group() {
    let doc = document(vec![item("Szkolenie", "3", "szt", 5000, VatRate::Zw)]);
    assert_eq!(doc.invoice.subtotal_grosze, 15000);
    assert_eq!(doc.invoice.tax_grosze, 0);

    let xml = generate(&doc);
    assert!(xml.contains("<P_13_7>150.00</P_13_7>"));
    assert!(!xml.contains("<P_13_1>"));
    assert!(!xml.contains("<P_14_1>"));
    assert!(xml.contains("<P_19>1</P_19>"));
    assert!(xml.contains("<P_19C>zw</P_19C>"));
    assert!(!xml.contains("<P_19N>"));
    assert!(xml.contains("<P_12>zw</P_12>"));
}

#[test]
fn non_exempt_invoice_uses_p19n() {
    let doc = document(vec![item("A", "1", "szt", 10000, VatRate::Rate23)]);
    let xml = generate(&doc);
    assert!(xml.contains("<P_19N>1</P_19N>"));
    assert!(!xml.contains("<P_19>1</P_19>"));
    assert!(!xml.contains("<P_19C>"));
}

// --- Structure ---

#[test]
fn header_carries_schema_identity() {
    let doc = document(vec![item("A", "1", "szt", 10000, VatRate::Rate23)]);
    let xml = generate(&doc);

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(&format!("<Faktura xmlns=\"{FA3_NAMESPACE}\">")));
    assert!(xml.contains(
        "<KodFormularza kodSystemowy=\"FA (3)\" wersjaSchemy=\"1-0E\">FA</KodFormularza>"
    ));
    assert!(xml.contains("<WariantFormularza>3</WariantFormularza>"));
    assert!(xml.contains("<DataWytworzeniaFa>2026-01-15T10:30:00Z</DataWytworzeniaFa>"));
    assert!(xml.contains("<SystemInfo>fakturka-test</SystemInfo>"));
    assert!(xml.contains("<JST>2</JST>"));
    assert!(xml.contains("<GV>2</GV>"));
    assert!(xml.contains("<RodzajFaktury>VAT</RodzajFaktury>"));
}

#[test]
fn fixed_adnotacje_flags() {
    let doc = document(vec![item("A", "1", "szt", 10000, VatRate::Rate23)]);
    let xml = generate(&doc);
    for leaf in [
        "<P_16>2</P_16>",
        "<P_17>2</P_17>",
        "<P_18>2</P_18>",
        "<P_18A>2</P_18A>",
        "<P_22N>1</P_22N>",
        "<P_23>2</P_23>",
        "<P_PMarzyN>1</P_PMarzyN>",
    ] {
        assert!(xml.contains(leaf), "missing {leaf}");
    }
}

#[test]
fn fa_children_keep_mandated_order() {
    let doc = document(vec![
        item("A", "1", "szt", 10000, VatRate::Rate23),
        item("B", "1", "szt", 10000, VatRate::Zw),
    ]);
    let xml = generate(&doc);

    let ordered = [
        "<Naglowek>",
        "<Podmiot1>",
        "<Podmiot2>",
        "<Fa>",
        "<KodWaluty>",
        "<P_1>",
        "<P_2>",
        "<P_6>",
        "<P_13_1>",
        "<P_14_1>",
        "<P_13_7>",
        "<P_15>",
        "<Adnotacje>",
        "<RodzajFaktury>",
        "<FaWiersz>",
    ];
    let mut last = 0;
    for tag in ordered {
        let pos = xml[last..]
            .find(tag)
            .unwrap_or_else(|| panic!("{tag} missing or out of order"));
        last += pos;
    }
}

#[test]
fn line_rows_keep_input_order_and_indexing() {
    let doc = document(vec![
        item("Pierwsza", "1", "szt", 1000, VatRate::Rate23),
        item("Druga", "2", "h", 2000, VatRate::Rate8),
    ]);
    let xml = generate(&doc);

    let first = xml.find("<NrWierszaFa>1</NrWierszaFa>").unwrap();
    let second = xml.find("<NrWierszaFa>2</NrWierszaFa>").unwrap();
    assert!(first < second);
    assert!(xml.find("Pierwsza").unwrap() < xml.find("Druga").unwrap());
}

#[test]
fn zero_rate_maps_to_0_kr() {
    let doc = document(vec![item("Eksportowa", "1", "szt", 10000, VatRate::Rate0)]);
    let xml = generate(&doc);
    assert!(xml.contains("<P_13_6_1>100.00</P_13_6_1>"));
    assert!(xml.contains("<P_12>0 KR</P_12>"));
    // net-only aggregate for the 0% bucket
    assert!(!xml.contains("<P_14_1>"));
}

#[test]
fn np_rate_maps_to_np_i() {
    let doc = document(vec![item("Zagraniczna", "1", "szt", 10000, VatRate::Np)]);
    let xml = generate(&doc);
    assert!(xml.contains("<P_13_8>100.00</P_13_8>"));
    assert!(xml.contains("<P_12>np I</P_12>"));
}

#[test]
fn text_nodes_are_escaped() {
    let mut doc = document(vec![item("Kable <2mm> & złączki", "1", "szt", 100, VatRate::Rate23)]);
    doc.buyer.name = "Spółka \"A&B\"".into();
    let xml = generate(&doc);
    assert!(xml.contains("Kable &lt;2mm&gt; &amp; złączki"));
    assert!(!xml.contains("<2mm>"));
    assert!(xml.contains("A&amp;B"));
}

#[test]
fn seller_address_line_is_assembled() {
    let doc = document(vec![item("A", "1", "szt", 100, VatRate::Rate23)]);
    let xml = generate(&doc);
    assert!(xml.contains("<AdresL1>ul. Prosta 1, 00-001 Warszawa</AdresL1>"));
    assert!(xml.contains("<AdresL1>ul. Marszałkowska 100, 00-026 Warszawa</AdresL1>"));
    assert!(xml.contains("<KodKraju>PL</KodKraju>"));
}

#[test]
fn buyer_without_address_omits_the_block() {
    let mut doc = document(vec![item("A", "1", "szt", 100, VatRate::Rate23)]);
    doc.buyer.address = None;
    doc.buyer.city = None;
    doc.buyer.postal_code = None;
    let xml = generate(&doc);
    // only the seller block carries an address
    assert_eq!(xml.matches("<AdresL1>").count(), 1);
}

#[test]
fn contact_group_only_when_present() {
    let mut doc = document(vec![item("A", "1", "szt", 100, VatRate::Rate23)]);
    let xml = generate(&doc);
    assert!(xml.contains("<DaneKontaktowe>"));
    assert!(xml.contains("<Email>jan@kowalski.pl</Email>"));

    doc.seller.email = None;
    doc.seller.phone = None;
    let xml = generate(&doc);
    assert!(!xml.contains("<DaneKontaktowe>"));
}

/// Requires `xmllint` on PATH; run with `cargo test -- --ignored`.
#[test]
#[ignore]
fn generated_document_passes_bundled_schema() {
    use fakturka::fa3::{materialize_bundled_schema, SchemaValidator, XmllintValidator};

    let dir = tempfile::TempDir::new().unwrap();
    let schema = materialize_bundled_schema(dir.path()).unwrap();

    let doc = document(vec![
        item("Usługa A", "1", "szt", 10000, VatRate::Rate23),
        item("Usługa B", "2.5", "h", 8000, VatRate::Rate8),
        item("Szkolenie", "3", "szt", 5000, VatRate::Zw),
    ]);
    let xml_path = dir.path().join("invoice.xml");
    std::fs::write(&xml_path, generate(&doc)).unwrap();

    XmllintValidator::new(schema, None)
        .validate(&xml_path)
        .unwrap();
}
