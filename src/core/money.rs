//! Fixed-point money and quantity arithmetic.
//!
//! Every monetary amount inside the core is a non-negative `i64` in grosze
//! (1/100 PLN); quantities are `i64` thousandths. All derived amounts use
//! half-up rounding on integers, so VAT totals reconcile to the grosz
//! across line items, per-rate subtotals, and invoice grand totals.

use super::error::Error;
use super::types::VatRate;

/// Amount in grosze (1/100 of the primary currency unit).
pub type Grosze = i64;

/// Quantity in thousandths (e.g. `"2.5"` parses to `2500`).
pub type MilliQuantity = i64;

fn invalid_format(what: &str) -> Error {
    Error::validation(format!("invalid {what} format"))
}

fn too_large() -> Error {
    Error::validation("amount too large")
}

/// Parse a decimal string into an integer scaled by `10^frac_digits`.
///
/// Accepts `,` or `.` as the decimal separator. The fractional part, when
/// present, must have 1..=`frac_digits` digits; missing digits are padded.
fn parse_scaled(input: &str, frac_digits: u32, what: &str) -> Result<i64, Error> {
    let s = input.trim().replace(',', ".");
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_format(what));
    }
    if let Some(frac) = frac_part {
        if frac.is_empty()
            || frac.len() > frac_digits as usize
            || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid_format(what));
        }
    }

    let scale = 10i64.pow(frac_digits);
    let int_value: i64 = int_part.parse().map_err(|_| too_large())?;
    let frac_value: i64 = match frac_part {
        Some(frac) => {
            let parsed: i64 = frac.parse().map_err(|_| invalid_format(what))?;
            parsed * 10i64.pow(frac_digits - frac.len() as u32)
        }
        None => 0,
    };

    int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(too_large)
}

/// Parse a money string (`"123"`, `"123.4"`, `"123,45"`) into grosze.
///
/// Rejects negatives, more than two fractional digits, and amounts beyond
/// the `i64` range.
pub fn parse_money(input: &str) -> Result<Grosze, Error> {
    parse_scaled(input, 2, "amount")
}

/// Format grosze as a plain two-decimal string (`12345` → `"123.45"`).
/// No thousand separators, no locale. Input must be non-negative.
pub fn format_money(grosze: Grosze) -> String {
    format!("{}.{:02}", grosze / 100, grosze % 100)
}

/// Parse a quantity string with up to three fractional digits into
/// thousandths. Zero and negative quantities are rejected.
pub fn parse_quantity(input: &str) -> Result<MilliQuantity, Error> {
    let milli = parse_scaled(input, 3, "quantity")?;
    if milli <= 0 {
        return Err(Error::validation("quantity must be > 0"));
    }
    Ok(milli)
}

/// Canonicalize a quantity string: strip leading zeros in the integer part
/// (keeping at least one digit) and trailing zeros in the fraction.
/// `"007.100"` → `"7.1"`, `"2.000"` → `"2"`. The result is what gets
/// stored on the line item.
pub fn normalize_quantity(input: &str) -> Result<String, Error> {
    parse_quantity(input)?;

    let s = input.trim().replace(',', ".");
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s.as_str(), ""),
    };

    let int_trimmed = int_part.trim_start_matches('0');
    let int_canon = if int_trimmed.is_empty() { "0" } else { int_trimmed };
    let frac_canon = frac_part.trim_end_matches('0');

    if frac_canon.is_empty() {
        Ok(int_canon.to_string())
    } else {
        Ok(format!("{int_canon}.{frac_canon}"))
    }
}

/// Half-up division on non-negative integers: `(n + d/2) / d`.
/// Errors with "amount too large" if the adjustment overflows.
pub fn round_half_up(numerator: i64, denominator: i64) -> Result<i64, Error> {
    numerator
        .checked_add(denominator / 2)
        .map(|n| n / denominator)
        .ok_or_else(too_large)
}

/// Net, VAT and gross amounts of a single line, all in grosze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub net: Grosze,
    pub vat: Grosze,
    pub gross: Grosze,
}

/// Compute per-line amounts from a unit price, a milli-quantity and a VAT
/// rate tag:
///
/// - `net = round_half_up(unit_price * quantity_milli, 1000)`
/// - numeric rate `r`: `vat = round_half_up(net * r, 100)`; ZW/NP: `vat = 0`
/// - `gross = net + vat`
pub fn line_amounts(
    unit_price_grosze: Grosze,
    quantity_milli: MilliQuantity,
    vat_rate: VatRate,
) -> Result<LineAmounts, Error> {
    if unit_price_grosze < 0 {
        return Err(Error::validation("unit price must not be negative"));
    }
    if quantity_milli <= 0 {
        return Err(Error::validation("quantity must be > 0"));
    }

    let net = round_half_up(
        unit_price_grosze
            .checked_mul(quantity_milli)
            .ok_or_else(too_large)?,
        1000,
    )?;

    let vat = match vat_rate.percent() {
        Some(rate) => round_half_up(net.checked_mul(rate).ok_or_else(too_large)?, 100)?,
        None => 0,
    };

    let gross = net.checked_add(vat).ok_or_else(too_large)?;

    Ok(LineAmounts { net, vat, gross })
}

/// Invoice-level sums across line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Grosze,
    pub tax: Grosze,
    pub total: Grosze,
}

/// Sum line amounts into invoice totals. `total` is the independent sum of
/// per-line gross amounts; by construction it equals `subtotal + tax`, and
/// a mismatch is reported as an internal error.
pub fn invoice_totals<'a, I>(amounts: I) -> Result<InvoiceTotals, Error>
where
    I: IntoIterator<Item = &'a LineAmounts>,
{
    let mut subtotal: i64 = 0;
    let mut tax: i64 = 0;
    let mut total: i64 = 0;

    for line in amounts {
        subtotal = subtotal.checked_add(line.net).ok_or_else(too_large)?;
        tax = tax.checked_add(line.vat).ok_or_else(too_large)?;
        total = total.checked_add(line.gross).ok_or_else(too_large)?;
    }

    if total != subtotal + tax {
        return Err(Error::Internal(format!(
            "invoice totals mismatch: total {total} != subtotal {subtotal} + tax {tax}"
        )));
    }

    Ok(InvoiceTotals {
        subtotal,
        tax,
        total,
    })
}
