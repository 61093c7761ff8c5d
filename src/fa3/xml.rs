//! FA(3) document generation.
//!
//! Child order inside every block is mandated by the schema; the emitters
//! below write elements in exactly that order and omit optional groups
//! that have no content.

use chrono::{DateTime, Utc};

use super::writer::XmlWriter;
use crate::core::{Error, InvoiceDocument, VatRate};

/// Namespace of the FA(3) structured-invoice schema.
pub const FA3_NAMESPACE: &str = "http://crd.gov.pl/wzor/2025/06/25/13775/";

/// `KodFormularza/@kodSystemowy`.
pub const FA3_SYSTEM_CODE: &str = "FA (3)";

/// `KodFormularza/@wersjaSchemy`.
pub const FA3_SCHEMA_VERSION: &str = "1-0E";

/// Per-rate net/VAT accumulator for the `P_13_*`/`P_14_*` aggregates.
#[derive(Debug, Default, Clone, Copy)]
struct RateBucket {
    net: i64,
    vat: i64,
    used: bool,
}

impl RateBucket {
    fn add(&mut self, net: i64, vat: i64) {
        self.net += net;
        self.vat += vat;
        self.used = true;
    }
}

/// `P_12` line tax tag for a VAT rate.
fn p12_code(rate: VatRate) -> &'static str {
    match rate {
        VatRate::Rate23 => "23",
        VatRate::Rate8 => "8",
        VatRate::Rate5 => "5",
        VatRate::Rate0 => "0 KR",
        VatRate::Zw => "zw",
        VatRate::Np => "np I",
    }
}

/// Assemble a single address line as `"<street>, <postal_code> <city>"`,
/// eliding empty parts. Returns `None` when every part is empty.
fn address_line(
    street: Option<&str>,
    postal_code: Option<&str>,
    city: Option<&str>,
) -> Option<String> {
    let street = street.map(str::trim).filter(|s| !s.is_empty());
    let postal_city = {
        let parts: Vec<&str> = [postal_code, city]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    };

    match (street, postal_city) {
        (None, None) => None,
        (Some(s), None) => Some(s.to_string()),
        (None, Some(pc)) => Some(pc),
        (Some(s), Some(pc)) => Some(format!("{s}, {pc}")),
    }
}

/// Emit the complete FA(3) document for one invoice.
///
/// `generated_at` becomes `DataWytworzeniaFa` (UTC, second precision);
/// `system_info` identifies the producer.
pub fn to_fa3_xml(
    doc: &InvoiceDocument,
    system_info: &str,
    generated_at: DateTime<Utc>,
) -> Result<String, Error> {
    let invoice = &doc.invoice;
    let seller = &doc.seller;
    let buyer = &doc.buyer;

    let mut w = XmlWriter::new()?;
    w.start_with_attrs("Faktura", &[("xmlns", FA3_NAMESPACE)])?;

    // Naglowek
    w.start("Naglowek")?;
    w.leaf_with_attrs(
        "KodFormularza",
        "FA",
        &[
            ("kodSystemowy", FA3_SYSTEM_CODE),
            ("wersjaSchemy", FA3_SCHEMA_VERSION),
        ],
    )?;
    w.leaf("WariantFormularza", "3")?;
    w.leaf(
        "DataWytworzeniaFa",
        &generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    )?;
    w.leaf("SystemInfo", system_info)?;
    w.end("Naglowek")?;

    // Podmiot1 — seller; the address is required.
    let seller_address = address_line(
        Some(&seller.street),
        Some(&seller.postal_code),
        Some(&seller.city),
    )
    .ok_or_else(|| Error::validation("seller address must not be empty"))?;

    w.start("Podmiot1")?;
    w.start("DaneIdentyfikacyjne")?;
    w.leaf("NIP", &seller.nip)?;
    w.leaf("Nazwa", &seller.name)?;
    w.end("DaneIdentyfikacyjne")?;
    w.start("Adres")?;
    w.leaf("KodKraju", "PL")?;
    w.leaf("AdresL1", &seller_address)?;
    w.end("Adres")?;
    if seller.email.is_some() || seller.phone.is_some() {
        w.start("DaneKontaktowe")?;
        if let Some(email) = &seller.email {
            w.leaf("Email", email)?;
        }
        if let Some(phone) = &seller.phone {
            w.leaf("Telefon", phone)?;
        }
        w.end("DaneKontaktowe")?;
    }
    w.end("Podmiot1")?;

    // Podmiot2 — buyer; address only when any part is on record.
    w.start("Podmiot2")?;
    w.start("DaneIdentyfikacyjne")?;
    w.leaf("NIP", &buyer.nip)?;
    w.leaf("Nazwa", &buyer.name)?;
    w.end("DaneIdentyfikacyjne")?;
    if let Some(line) = address_line(
        buyer.address.as_deref(),
        buyer.postal_code.as_deref(),
        buyer.city.as_deref(),
    ) {
        w.start("Adres")?;
        w.leaf("KodKraju", "PL")?;
        w.leaf("AdresL1", &line)?;
        w.end("Adres")?;
    }
    w.leaf("JST", "2")?;
    w.leaf("GV", "2")?;
    w.end("Podmiot2")?;

    // Fa — invoice body.
    let mut r23 = RateBucket::default();
    let mut r8 = RateBucket::default();
    let mut r5 = RateBucket::default();
    let mut r0 = RateBucket::default();
    let mut zw = RateBucket::default();
    let mut np = RateBucket::default();
    for item in &doc.items {
        match item.vat_rate {
            VatRate::Rate23 => r23.add(item.net_grosze, item.vat_grosze),
            VatRate::Rate8 => r8.add(item.net_grosze, item.vat_grosze),
            VatRate::Rate5 => r5.add(item.net_grosze, item.vat_grosze),
            VatRate::Rate0 => r0.add(item.net_grosze, item.vat_grosze),
            VatRate::Zw => zw.add(item.net_grosze, item.vat_grosze),
            VatRate::Np => np.add(item.net_grosze, item.vat_grosze),
        }
    }

    w.start("Fa")?;
    w.leaf("KodWaluty", &invoice.currency)?;
    w.leaf("P_1", &invoice.issue_date.to_string())?;
    w.leaf("P_2", &invoice.invoice_number)?;
    w.leaf("P_6", &invoice.sale_date.to_string())?;

    if r23.used {
        w.money("P_13_1", r23.net)?;
        w.money("P_14_1", r23.vat)?;
    }
    if r8.used {
        w.money("P_13_2", r8.net)?;
        w.money("P_14_2", r8.vat)?;
    }
    if r5.used {
        w.money("P_13_3", r5.net)?;
        w.money("P_14_3", r5.vat)?;
    }
    if r0.used {
        w.money("P_13_6_1", r0.net)?;
    }
    if zw.used {
        w.money("P_13_7", zw.net)?;
    }
    if np.used {
        w.money("P_13_8", np.net)?;
    }
    w.money("P_15", invoice.total_grosze)?;

    // Adnotacje — fixed flags; the Zwolnienie choice depends on whether
    // any line is exempt.
    w.start("Adnotacje")?;
    w.leaf("P_16", "2")?;
    w.leaf("P_17", "2")?;
    w.leaf("P_18", "2")?;
    w.leaf("P_18A", "2")?;
    w.start("Zwolnienie")?;
    if zw.used {
        w.leaf("P_19", "1")?;
        w.leaf("P_19C", "zw")?;
    } else {
        w.leaf("P_19N", "1")?;
    }
    w.end("Zwolnienie")?;
    w.start("NoweSrodkiTransportu")?;
    w.leaf("P_22N", "1")?;
    w.end("NoweSrodkiTransportu")?;
    w.leaf("P_23", "2")?;
    w.start("PMarzy")?;
    w.leaf("P_PMarzyN", "1")?;
    w.end("PMarzy")?;
    w.end("Adnotacje")?;

    w.leaf("RodzajFaktury", "VAT")?;

    for (index, item) in doc.items.iter().enumerate() {
        w.start("FaWiersz")?;
        w.leaf("NrWierszaFa", &(index + 1).to_string())?;
        w.leaf("P_7", &item.name)?;
        w.leaf("P_8A", &item.unit)?;
        w.leaf("P_8B", &item.quantity)?;
        w.money("P_9A", item.unit_price_grosze)?;
        w.money("P_11", item.net_grosze)?;
        w.leaf("P_12", p12_code(item.vat_rate))?;
        w.end("FaWiersz")?;
    }

    w.end("Fa")?;
    w.end("Faktura")?;
    w.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p12_mapping() {
        assert_eq!(p12_code(VatRate::Rate23), "23");
        assert_eq!(p12_code(VatRate::Rate0), "0 KR");
        assert_eq!(p12_code(VatRate::Zw), "zw");
        assert_eq!(p12_code(VatRate::Np), "np I");
    }

    #[test]
    fn address_line_elides_empty_parts() {
        assert_eq!(
            address_line(Some("Prosta 1"), Some("00-001"), Some("Warszawa")).as_deref(),
            Some("Prosta 1, 00-001 Warszawa")
        );
        assert_eq!(
            address_line(None, Some("00-001"), Some("Warszawa")).as_deref(),
            Some("00-001 Warszawa")
        );
        assert_eq!(
            address_line(Some("Prosta 1"), None, None).as_deref(),
            Some("Prosta 1")
        );
        assert_eq!(address_line(Some("  "), None, Some("")), None);
    }
}
