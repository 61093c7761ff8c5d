//! Input validation and normalisation: NIP, dates, currency, free text.
//!
//! Helpers return [`Issue`] so entity-level validators can accumulate all
//! findings before failing; `Issue` converts into a single-finding
//! [`Error`] for use with `?`.

use chrono::NaiveDate;

use super::error::{Error, Issue};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_UNIT_LEN: usize = 32;
pub const MAX_NOTES_LEN: usize = 2000;

impl From<Issue> for Error {
    fn from(issue: Issue) -> Self {
        Error::invalid(vec![issue])
    }
}

/// Strip every non-digit and require exactly 10 decimal digits.
/// `"PL 123-456-32-18"` normalises to `"1234563218"`. The checksum is not
/// verified, only the digit count.
pub fn normalize_nip(field: &str, input: &str) -> Result<String, Issue> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 10 {
        return Err(Issue::new(field, "NIP must contain exactly 10 digits"));
    }
    Ok(digits)
}

/// Strict `YYYY-MM-DD` parse: exact shape first, then calendar validity.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, Issue> {
    let b = value.as_bytes();
    let shape_ok = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shape_ok {
        return Err(Issue::new(field, "must be a YYYY-MM-DD date"));
    }

    let year: i32 = value[0..4].parse().unwrap();
    let month: u32 = value[5..7].parse().unwrap();
    let day: u32 = value[8..10].parse().unwrap();
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Issue::new(field, "is not a valid calendar date"))
}

/// Trim and require a non-empty value within `max_len` characters.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, Issue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Issue::new(field, "must not be empty"));
    }
    if trimmed.chars().count() > max_len {
        return Err(Issue::new(
            field,
            format!("must not exceed {max_len} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional value; empty collapses to `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, Issue> {
    match value {
        None => Ok(None),
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > max_len {
                return Err(Issue::new(
                    field,
                    format!("must not exceed {max_len} characters"),
                ));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Standard email shape: exactly one `@` with non-empty local and domain
/// parts, no surrounding whitespace inside.
pub fn validate_email(field: &str, value: &str) -> Result<String, Issue> {
    let trimmed = value.trim();
    let at_count = trimmed.chars().filter(|c| *c == '@').count();
    let parts: Vec<&str> = trimmed.splitn(2, '@').collect();
    if at_count != 1
        || parts.len() != 2
        || parts[0].is_empty()
        || parts[1].is_empty()
        || trimmed.chars().any(char::is_whitespace)
    {
        return Err(Issue::new(field, "is not a valid email address"));
    }
    Ok(trimmed.to_string())
}

/// Currency code: 3 to 8 characters, no whitespace. Not otherwise parsed.
pub fn validate_currency(field: &str, value: &str) -> Result<String, Issue> {
    let trimmed = value.trim();
    if trimmed.len() < 3 || trimmed.len() > 8 || trimmed.chars().any(char::is_whitespace) {
        return Err(Issue::new(
            field,
            "must be a 3-8 character code without whitespace",
        ));
    }
    Ok(trimmed.to_string())
}
