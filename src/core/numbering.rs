//! Invoice-number formatting: `FV/YYYY/MM/NNNN`.
//!
//! The stateful half of the numbering authority (the per-month counter)
//! lives in the `invoice_sequences` table; this module holds the pure
//! pieces shared by allocation and by explicit caller-supplied numbers.

use chrono::{Datelike, NaiveDate};

use super::error::Error;

/// Extract the numbering bucket from an issue date. Years outside
/// 2000..=9999 are rejected.
pub fn year_month(issue_date: NaiveDate) -> Result<(i32, u32), Error> {
    let year = issue_date.year();
    if !(2000..=9999).contains(&year) {
        return Err(Error::validation(
            "issue date year must be between 2000 and 9999",
        ));
    }
    Ok((year, issue_date.month()))
}

/// Format a monthly invoice number. The sequence is zero-padded to at
/// least four digits with no upper cap.
pub fn format_invoice_number(year: i32, month: u32, sequence: i64) -> String {
    format!("FV/{year:04}/{month:02}/{sequence:04}")
}

/// Trim and accept an explicit caller-supplied invoice number, bypassing
/// allocation. Uniqueness is checked by the caller inside its transaction.
pub fn normalize_explicit_number(input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("invoice number must not be empty"));
    }
    Ok(trimmed.to_string())
}
