//! Configuration for the invoice core.
//!
//! One [`Config`] is built at process start and handed to [`crate::service::App`];
//! it pins the data-root layout and the single-tenant seller identity.
//! The struct is serde-deserializable so an embedding application can load
//! it from its own configuration file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::Seller;

/// Persisted-state layout under `data_root`:
///
/// ```text
/// data/
///   invoices/
///     xml/<invoice-filename>.xml
///     pdf/<invoice-filename>.pdf
///   schema/            (bundled XSD, materialized on first use)
///   dashboard.db
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the persisted-state layout. Created on demand.
    pub data_root: PathBuf,
    /// Seller identity emitted into every document.
    pub seller: Seller,
    /// Producer string for the FA(3) `SystemInfo` header field.
    #[serde(default = "default_system_info")]
    pub system_info: String,
    /// Override path to the FA(3) XSD; defaults to the bundled schema.
    #[serde(default)]
    pub fa3_schema: Option<PathBuf>,
    /// Optional XML catalog handed to the external validator.
    #[serde(default)]
    pub fa3_catalog: Option<PathBuf>,
}

impl Config {
    pub fn new(data_root: impl Into<PathBuf>, seller: Seller) -> Self {
        Config {
            data_root: data_root.into(),
            seller,
            system_info: default_system_info(),
            fa3_schema: None,
            fa3_catalog: None,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_root.join("dashboard.db")
    }

    pub fn xml_dir(&self) -> PathBuf {
        self.data_root.join("invoices").join("xml")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_root.join("invoices").join("pdf")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.data_root.join("schema")
    }
}

fn default_system_info() -> String {
    "fakturka".to_string()
}
