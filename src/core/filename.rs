//! Deterministic invoice-number → artifact-filename transform.
//!
//! `FV/2026/01/0001` becomes `FV-2026-01-0001.xml`. Filenames are derived,
//! never stored, so a retried issuance overwrites the same artifact.

use super::error::Error;

/// Maximum filename length in bytes, extension included.
const MAX_FILENAME_BYTES: usize = 255;

fn invalid(reason: &str) -> Error {
    Error::validation(format!("invalid filename: {reason}"))
}

/// Derive a safe artifact filename from an invoice number.
///
/// 1. every `/` or `\` becomes `-`;
/// 2. every run of characters outside `[A-Za-z0-9._-]` becomes a single `-`;
/// 3. consecutive `-` collapse; leading/trailing `.`, `_`, `-` are stripped.
///
/// The result must be non-empty, at most 255 bytes with the extension,
/// relative, and free of `..`.
pub fn artifact_file_name(invoice_number: &str, extension: &str) -> Result<String, Error> {
    let mut stem = String::with_capacity(invoice_number.len());
    let mut pending_dash = false;
    for c in invoice_number.chars() {
        let mapped = match c {
            '/' | '\\' => None,
            c if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' => Some(c),
            _ => None,
        };
        match mapped {
            Some('-') => pending_dash = true,
            Some(c) => {
                if pending_dash {
                    stem.push('-');
                    pending_dash = false;
                }
                stem.push(c);
            }
            None => pending_dash = true,
        }
    }

    let stem = stem.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if stem.is_empty() {
        return Err(invalid("empty after sanitisation"));
    }
    if stem.contains("..") {
        return Err(invalid("contains '..'"));
    }

    let name = format!("{stem}.{extension}");
    if name.len() > MAX_FILENAME_BYTES {
        return Err(invalid("longer than 255 bytes"));
    }
    Ok(name)
}
