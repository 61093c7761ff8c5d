use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::Error;
use super::money::{parse_money, Grosze};

/// VAT rate tag on a line item: one of the numeric percentages or the
/// alphabetic markers ZW (exempt) / NP (not subject to tax).
///
/// Serialized as a JSON number for numeric rates and a string for the
/// alphabetic tags; stored in the database as text (`"23"`, `"ZW"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VatRate {
    Rate23,
    Rate8,
    Rate5,
    Rate0,
    /// "ZW" — zwolniony (exempt).
    Zw,
    /// "NP" — nie podlega (not subject to tax).
    Np,
}

impl VatRate {
    /// Numeric percentage, or `None` for the alphabetic tags.
    pub fn percent(&self) -> Option<i64> {
        match self {
            VatRate::Rate23 => Some(23),
            VatRate::Rate8 => Some(8),
            VatRate::Rate5 => Some(5),
            VatRate::Rate0 => Some(0),
            VatRate::Zw | VatRate::Np => None,
        }
    }

    /// Textual form used in the database column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            VatRate::Rate23 => "23",
            VatRate::Rate8 => "8",
            VatRate::Rate5 => "5",
            VatRate::Rate0 => "0",
            VatRate::Zw => "ZW",
            VatRate::Np => "NP",
        }
    }

    /// Parse the database/text form back to the tag.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "23" => Some(VatRate::Rate23),
            "8" => Some(VatRate::Rate8),
            "5" => Some(VatRate::Rate5),
            "0" => Some(VatRate::Rate0),
            "ZW" => Some(VatRate::Zw),
            "NP" => Some(VatRate::Np),
            _ => None,
        }
    }
}

impl std::fmt::Display for VatRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl Serialize for VatRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.percent() {
            Some(p) => serializer.serialize_i64(p),
            None => serializer.serialize_str(self.as_db_str()),
        }
    }
}

impl<'de> Deserialize<'de> for VatRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RateVisitor;

        impl serde::de::Visitor<'_> for RateVisitor {
            type Value = VatRate;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("one of 23, 8, 5, 0, \"ZW\", \"NP\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<VatRate, E> {
                match v {
                    23 => Ok(VatRate::Rate23),
                    8 => Ok(VatRate::Rate8),
                    5 => Ok(VatRate::Rate5),
                    0 => Ok(VatRate::Rate0),
                    other => Err(E::custom(format!("unknown VAT rate: {other}"))),
                }
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<VatRate, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("unknown VAT rate: {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<VatRate, E> {
                VatRate::from_db_str(v)
                    .ok_or_else(|| E::custom(format!("unknown VAT rate: {v:?}")))
            }
        }

        deserializer.deserialize_any(RateVisitor)
    }
}

/// Invoice lifecycle status. `Cancelled` is reserved: it is never entered
/// automatically, only through an explicit status patch on a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "issued" => Some(InvoiceStatus::Issued),
            "cancelled" => Some(InvoiceStatus::Cancelled),
            _ => None,
        }
    }
}

/// Payment method enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "card" => Some(PaymentMethod::Card),
            "other" => Some(PaymentMethod::Other),
            _ => None,
        }
    }
}

/// A buyer on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    /// Legal name, trimmed, non-empty.
    pub name: String,
    /// Exactly 10 decimal digits after normalisation; unique.
    pub nip: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored invoice. All three totals are integers in grosze and obey
/// `total_grosze = subtotal_grosze + tax_grosze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    /// Human identifier, `FV/YYYY/MM/NNNN`; unique; immutable once issued.
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub client_id: i64,
    pub status: InvoiceStatus,
    pub payment_method: PaymentMethod,
    pub payment_deadline: Option<NaiveDate>,
    pub currency: String,
    /// Informational only; never used in tax arithmetic.
    pub exchange_rate: Option<f64>,
    pub notes: Option<String>,
    pub subtotal_grosze: Grosze,
    pub tax_grosze: Grosze,
    pub total_grosze: Grosze,
    /// Absolute path of the validated FA(3) file, set only after a
    /// successful write and schema validation.
    pub xml_path: Option<PathBuf>,
    /// Absolute path of the rendered PDF, set only after a successful write.
    pub pdf_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item belonging to an invoice. Deleted together with its invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub name: String,
    /// Canonical decimal string with up to three fractional digits.
    pub quantity: String,
    pub unit: String,
    pub unit_price_grosze: Grosze,
    pub vat_rate: VatRate,
    pub net_grosze: Grosze,
    pub vat_grosze: Grosze,
    pub gross_grosze: Grosze,
    pub created_at: DateTime<Utc>,
}

/// The single-tenant seller identity, provided by configuration. The
/// address fields are required: the FA(3) seller block must carry one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub name: String,
    pub nip: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
}

/// Everything the artifact generators need about one invoice: the row, its
/// items, the buyer, and the configured seller.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
    pub buyer: Client,
    pub seller: Seller,
}

/// Money as it arrives from outside: either an integer amount already in
/// grosze, or a decimal string (`"123.45"`, comma accepted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Grosze(i64),
    Text(String),
}

impl MoneyInput {
    pub fn to_grosze(&self) -> Result<Grosze, Error> {
        match self {
            MoneyInput::Grosze(g) if *g >= 0 => Ok(*g),
            MoneyInput::Grosze(_) => Err(Error::validation("amount must not be negative")),
            MoneyInput::Text(s) => parse_money(s),
        }
    }
}

impl From<i64> for MoneyInput {
    fn from(grosze: i64) -> Self {
        MoneyInput::Grosze(grosze)
    }
}

impl From<&str> for MoneyInput {
    fn from(text: &str) -> Self {
        MoneyInput::Text(text.to_string())
    }
}

/// Accept a JSON string or number for a decimal field kept as text.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

/// Input for creating a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub nip: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Field-by-field client update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nip: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// One line item as supplied by the caller. Quantity accepts a string or a
/// number; the unit price accepts integer grosze or a money string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub quantity: String,
    pub unit: String,
    pub unit_price_grosze: MoneyInput,
    pub vat_rate: VatRate,
}

/// Input for creating an invoice. Without an explicit `invoice_number`, the
/// numbering authority allocates the next monthly number from `issue_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub issue_date: String,
    pub sale_date: String,
    pub client_id: i64,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_deadline: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<NewItem>,
}

/// Draft invoice update; `None` keeps the stored value. When `items` is
/// present the existing items are wholly replaced and totals recomputed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoicePatch {
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub sale_date: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_deadline: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<NewItem>>,
}
