//! # fakturka
//!
//! Offline Polish VAT invoice engine: FA(3) structured XML (the KSeF
//! schema family), a fixed A4 PDF rendering, transactional monthly
//! numbering, and an embedded SQLite store.
//!
//! All monetary amounts are non-negative integers in grosze — never
//! floating point — with deterministic half-up rounding, so line items,
//! per-rate subtotals, and invoice grand totals reconcile exactly.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fakturka::config::Config;
//! use fakturka::core::{NewClient, NewInvoice, NewItem, Seller, VatRate};
//! use fakturka::service::App;
//!
//! let seller = Seller {
//!     name: "Jan Kowalski IT".into(),
//!     nip: "1234563218".into(),
//!     street: "ul. Prosta 1".into(),
//!     postal_code: "00-001".into(),
//!     city: "Warszawa".into(),
//!     email: None,
//!     phone: None,
//!     bank_account: None,
//! };
//! let app = App::open(Config::new("./data", seller)).unwrap();
//!
//! let client = app.clients().create(NewClient {
//!     name: "Klient Sp. z o.o.".into(),
//!     nip: "5260001246".into(),
//!     ..Default::default()
//! }).unwrap();
//!
//! let invoice = app.invoices().create(NewInvoice {
//!     invoice_number: None, // allocates FV/2026/01/0001
//!     issue_date: "2026-01-15".into(),
//!     sale_date: "2026-01-15".into(),
//!     client_id: client.id,
//!     status: None,
//!     payment_method: None,
//!     payment_deadline: None,
//!     currency: None,
//!     exchange_rate: None,
//!     notes: None,
//!     items: vec![NewItem {
//!         name: "Usługa programistyczna".into(),
//!         quantity: "10".into(),
//!         unit: "h".into(),
//!         unit_price_grosze: 10000.into(),
//!         vat_rate: VatRate::Rate23,
//!     }],
//! }).unwrap();
//!
//! // status → issued, then XML (validated) and PDF land under ./data/invoices/
//! app.invoices().issue(invoice.id).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `db` (default) | Embedded SQLite persistence |
//! | `fa3` (default) | FA(3) XML generation + external XSD validation |
//! | `pdf` (default) | A4 PDF rendering |
//!
//! The orchestration [`service`] compiles when all three are enabled.

pub mod config;
pub mod core;

#[cfg(feature = "db")]
pub mod db;

#[cfg(feature = "fa3")]
pub mod fa3;

#[cfg(feature = "pdf")]
pub mod pdf;

#[cfg(all(feature = "db", feature = "fa3", feature = "pdf"))]
pub mod service;

// Re-export core types at crate root for convenience
pub use crate::core::*;
