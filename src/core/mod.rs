//! Core invoice types, money arithmetic, validation, and numbering.
//!
//! Everything here is pure: no database, no filesystem. Monetary amounts
//! are integers in grosze throughout.

mod error;
mod filename;
mod money;
mod numbering;
mod types;
pub mod validate;

pub use error::{Error, ErrorKind, Issue};
pub use filename::artifact_file_name;
pub use money::{
    format_money, invoice_totals, line_amounts, normalize_quantity, parse_money, parse_quantity,
    round_half_up, Grosze, InvoiceTotals, LineAmounts, MilliQuantity,
};
pub use numbering::{format_invoice_number, normalize_explicit_number, year_month};
pub use types::*;
