//! Fixed single-page A4 invoice layout.
//!
//! All labels are Polish; every monetary value goes through
//! `format_money`. The layout flows top to bottom with a cursor; items
//! that cannot fit above the totals/footer reserve are rejected, the page
//! never overflows.

use std::io::{BufWriter, Cursor};

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use super::fonts::ResolvedFont;
use crate::core::{format_money, Error, InvoiceDocument, PaymentMethod, VatRate};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 14.0;
const LEFT: f32 = MARGIN_X;
const RIGHT: f32 = PAGE_W - MARGIN_X;

const PT_TO_MM: f32 = 0.352_778;

// Item table columns (mm); `_R` columns are right-aligned.
const COL_LP: f32 = LEFT;
const COL_NAME: f32 = 22.0;
const NAME_WRAP_CHARS: usize = 36;
const COL_QTY_R: f32 = 102.0;
const COL_UNIT: f32 = 105.0;
const COL_PRICE_R: f32 = 138.0;
const COL_VAT_R: f32 = 152.0;
const COL_NET_R: f32 = 174.0;
const COL_GROSS_R: f32 = RIGHT;

const BODY_SIZE: f32 = 9.0;
const LINE_GAP: f32 = 4.8;
const ROW_GAP: f32 = 5.4;

fn pdf_err(e: impl std::fmt::Display) -> Error {
    Error::Internal(format!("PDF error: {e}"))
}

/// Width estimate for alignment; exact metrics are not worth a font
/// parser here, an average glyph factor keeps columns stable.
fn text_width_mm(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, s: &str, size: f32, x: f32, y: f32) {
    layer.use_text(s, size, Mm(x), Mm(y), font);
}

fn text_right(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    s: &str,
    size: f32,
    right_x: f32,
    y: f32,
) {
    text(layer, font, s, size, right_x - text_width_mm(s, size), y);
}

fn text_center(layer: &PdfLayerReference, font: &IndirectFontRef, s: &str, size: f32, y: f32) {
    text(
        layer,
        font,
        s,
        size,
        (PAGE_W - text_width_mm(s, size)) / 2.0,
        y,
    );
}

fn rule(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    layer.set_outline_thickness(0.3);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

/// Word wrap to a character limit; words longer than the limit get a
/// line of their own.
fn wrap_words(input: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in input.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn payment_method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "gotówka",
        PaymentMethod::BankTransfer => "przelew",
        PaymentMethod::Card => "karta",
        PaymentMethod::Other => "inne",
    }
}

/// Numeric rates display with a percent sign; alphabetic tags as-is.
fn vat_rate_label(rate: VatRate) -> String {
    match rate.percent() {
        Some(p) => format!("{p}%"),
        None => rate.as_db_str().to_string(),
    }
}

/// Render the invoice into PDF bytes.
pub fn render_invoice(doc: &InvoiceDocument, font: &ResolvedFont) -> Result<Vec<u8>, Error> {
    let invoice = &doc.invoice;
    let seller = &doc.seller;
    let buyer = &doc.buyer;

    let (pdf, page, layer_index) = PdfDocument::new(
        format!("Faktura {}", invoice.invoice_number),
        Mm(PAGE_W),
        Mm(PAGE_H),
        "Layer 1",
    );
    let layer = pdf.get_page(page).get_layer(layer_index);

    let font_ref = match font {
        ResolvedFont::Ttf(bytes) => pdf
            .add_external_font(Cursor::new(bytes.as_slice()))
            .map_err(pdf_err)?,
        ResolvedFont::BuiltinMonospace => {
            pdf.add_builtin_font(BuiltinFont::Courier).map_err(pdf_err)?
        }
    };

    let mut y = PAGE_H - 18.0;

    // Title
    text_center(&layer, &font_ref, "FAKTURA VAT", 18.0, y);
    y -= 8.0;
    text_center(&layer, &font_ref, &invoice.invoice_number, 12.0, y);
    y -= 14.0;

    // Seller / buyer blocks
    let buyer_x = 112.0;
    text(&layer, &font_ref, "Sprzedawca", 11.0, LEFT, y);
    text(&layer, &font_ref, "Nabywca", 11.0, buyer_x, y);
    y -= 6.0;

    let mut seller_lines: Vec<String> = wrap_words(&seller.name, 42);
    seller_lines.push(format!("NIP: {}", seller.nip));
    seller_lines.push(seller.street.clone());
    seller_lines.push(format!("{} {}", seller.postal_code, seller.city));
    if let Some(email) = &seller.email {
        seller_lines.push(email.clone());
    }
    if let Some(phone) = &seller.phone {
        seller_lines.push(phone.clone());
    }

    let mut buyer_lines: Vec<String> = wrap_words(&buyer.name, 42);
    buyer_lines.push(format!("NIP: {}", buyer.nip));
    if let Some(address) = &buyer.address {
        buyer_lines.push(address.clone());
    }
    match (&buyer.postal_code, &buyer.city) {
        (Some(pc), Some(city)) => buyer_lines.push(format!("{pc} {city}")),
        (Some(pc), None) => buyer_lines.push(pc.clone()),
        (None, Some(city)) => buyer_lines.push(city.clone()),
        (None, None) => {}
    }
    if let Some(email) = &buyer.email {
        buyer_lines.push(email.clone());
    }
    if let Some(phone) = &buyer.phone {
        buyer_lines.push(phone.clone());
    }

    let block_lines = seller_lines.len().max(buyer_lines.len());
    for (i, line) in seller_lines.iter().enumerate() {
        text(&layer, &font_ref, line, BODY_SIZE, LEFT, y - i as f32 * LINE_GAP);
    }
    for (i, line) in buyer_lines.iter().enumerate() {
        text(&layer, &font_ref, line, BODY_SIZE, buyer_x, y - i as f32 * LINE_GAP);
    }
    y -= block_lines as f32 * LINE_GAP + 6.0;

    // Dates and terms
    let mut terms: Vec<String> = vec![
        format!("Data wystawienia: {}", invoice.issue_date),
        format!("Data sprzedaży: {}", invoice.sale_date),
    ];
    if let Some(deadline) = &invoice.payment_deadline {
        terms.push(format!("Termin płatności: {deadline}"));
    }
    terms.push(format!(
        "Sposób płatności: {}",
        payment_method_label(invoice.payment_method)
    ));
    terms.push(format!("Waluta: {}", invoice.currency));
    for line in &terms {
        text(&layer, &font_ref, line, BODY_SIZE, LEFT, y);
        y -= LINE_GAP;
    }
    y -= 4.0;

    // Items table header
    rule(&layer, LEFT, RIGHT, y + 3.6);
    text(&layer, &font_ref, "Lp.", BODY_SIZE, COL_LP, y);
    text(&layer, &font_ref, "Nazwa", BODY_SIZE, COL_NAME, y);
    text_right(&layer, &font_ref, "Ilość", BODY_SIZE, COL_QTY_R, y);
    text(&layer, &font_ref, "J.m.", BODY_SIZE, COL_UNIT, y);
    text_right(&layer, &font_ref, "Cena netto", BODY_SIZE, COL_PRICE_R, y);
    text_right(&layer, &font_ref, "VAT", BODY_SIZE, COL_VAT_R, y);
    text_right(&layer, &font_ref, "Netto", BODY_SIZE, COL_NET_R, y);
    text_right(&layer, &font_ref, "Brutto", BODY_SIZE, COL_GROSS_R, y);
    rule(&layer, LEFT, RIGHT, y - 1.8);
    y -= ROW_GAP + 1.2;

    // Reserve below the table: totals, optional bank line, notes, footer.
    let notes_lines: Vec<String> = match &invoice.notes {
        Some(notes) => notes
            .lines()
            .flat_map(|l| wrap_words(l, 95))
            .collect(),
        None => Vec::new(),
    };
    let mut reserve = 15.0 + 3.0 * 6.0 + 8.0;
    if seller.bank_account.is_some() {
        reserve += 6.0;
    }
    if !notes_lines.is_empty() {
        reserve += 6.0 + notes_lines.len() as f32 * LINE_GAP;
    }

    for (index, item) in doc.items.iter().enumerate() {
        let name_lines = wrap_words(&item.name, NAME_WRAP_CHARS);
        let row_height = ROW_GAP + (name_lines.len() - 1) as f32 * LINE_GAP;
        if y - row_height < reserve {
            return Err(Error::validation(
                "invoice has too many items for the single-page layout",
            ));
        }

        text(&layer, &font_ref, &(index + 1).to_string(), BODY_SIZE, COL_LP, y);
        for (i, line) in name_lines.iter().enumerate() {
            text(&layer, &font_ref, line, BODY_SIZE, COL_NAME, y - i as f32 * LINE_GAP);
        }
        text_right(&layer, &font_ref, &item.quantity, BODY_SIZE, COL_QTY_R, y);
        text(&layer, &font_ref, &item.unit, BODY_SIZE, COL_UNIT, y);
        text_right(
            &layer,
            &font_ref,
            &format_money(item.unit_price_grosze),
            BODY_SIZE,
            COL_PRICE_R,
            y,
        );
        text_right(
            &layer,
            &font_ref,
            &vat_rate_label(item.vat_rate),
            BODY_SIZE,
            COL_VAT_R,
            y,
        );
        text_right(
            &layer,
            &font_ref,
            &format_money(item.net_grosze),
            BODY_SIZE,
            COL_NET_R,
            y,
        );
        text_right(
            &layer,
            &font_ref,
            &format_money(item.gross_grosze),
            BODY_SIZE,
            COL_GROSS_R,
            y,
        );
        y -= row_height;
    }

    rule(&layer, LEFT, RIGHT, y + 3.0);
    y -= 3.0;

    // Totals
    let currency = &invoice.currency;
    text_right(
        &layer,
        &font_ref,
        &format!("Razem netto: {} {currency}", format_money(invoice.subtotal_grosze)),
        10.0,
        COL_GROSS_R,
        y,
    );
    y -= 6.0;
    text_right(
        &layer,
        &font_ref,
        &format!("Podatek VAT: {} {currency}", format_money(invoice.tax_grosze)),
        10.0,
        COL_GROSS_R,
        y,
    );
    y -= 6.0;
    text_right(
        &layer,
        &font_ref,
        &format!("Razem brutto: {} {currency}", format_money(invoice.total_grosze)),
        12.0,
        COL_GROSS_R,
        y,
    );
    y -= 8.0;

    if let Some(account) = &seller.bank_account {
        text(&layer, &font_ref, &format!("Nr konta: {account}"), BODY_SIZE, LEFT, y);
        y -= 6.0;
    }

    if !notes_lines.is_empty() {
        text(&layer, &font_ref, "Uwagi:", BODY_SIZE, LEFT, y);
        y -= LINE_GAP;
        for line in &notes_lines {
            text(&layer, &font_ref, line, BODY_SIZE, LEFT, y);
            y -= LINE_GAP;
        }
    }

    // Footer disclaimer
    text_center(
        &layer,
        &font_ref,
        "Dokument wystawiony elektronicznie i nie wymaga podpisu.",
        7.0,
        10.0,
    );

    let mut writer = BufWriter::new(Vec::<u8>::new());
    pdf.save(&mut writer).map_err(pdf_err)?;
    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("PDF buffer error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_words_respects_limit() {
        assert_eq!(wrap_words("a b c", 10), vec!["a b c"]);
        assert_eq!(wrap_words("alpha beta gamma", 11), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_words("", 10), vec![""]);
    }

    #[test]
    fn vat_labels() {
        assert_eq!(vat_rate_label(VatRate::Rate23), "23%");
        assert_eq!(vat_rate_label(VatRate::Rate0), "0%");
        assert_eq!(vat_rate_label(VatRate::Zw), "ZW");
        assert_eq!(vat_rate_label(VatRate::Np), "NP");
    }

    #[test]
    fn payment_labels_localized() {
        assert_eq!(payment_method_label(PaymentMethod::Cash), "gotówka");
        assert_eq!(payment_method_label(PaymentMethod::BankTransfer), "przelew");
    }
}
