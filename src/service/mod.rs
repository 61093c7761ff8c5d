//! Orchestration: the long-lived core context and the entity services.
//!
//! [`App`] is created once at process start. It owns the database handle,
//! the configuration, the schema-validator capability, and the resolved
//! PDF font; request handlers borrow it and go through the accessor views
//! ([`App::clients`], [`App::invoices`]).

use std::fs;

use tracing::info;

use crate::config::Config;
use crate::core::Error;
use crate::db::Database;
use crate::fa3::{self, SchemaValidator, XmllintValidator};
use crate::pdf::{FontResolver, ResolvedFont};

mod clients;
mod invoices;

pub use clients::ClientService;
pub use invoices::InvoiceService;

/// The core context. Holds no per-request state; safe to share across
/// threads.
pub struct App {
    db: Database,
    config: Config,
    validator: Box<dyn SchemaValidator>,
    font: ResolvedFont,
}

impl App {
    /// Open the data root: create directories, open the database, apply
    /// the schema, materialize the bundled XSD, and probe for a PDF font.
    pub fn open(config: Config) -> Result<Self, Error> {
        fs::create_dir_all(&config.data_root).map_err(|e| {
            Error::Io(format!(
                "cannot create data root {}: {e}",
                config.data_root.display()
            ))
        })?;

        let db = Database::open(&config.database_path())?;

        let schema = match &config.fa3_schema {
            Some(path) => path.clone(),
            None => fa3::materialize_bundled_schema(&config.schema_dir())?,
        };
        let validator = Box::new(XmllintValidator::new(schema, config.fa3_catalog.clone()));
        let font = FontResolver::default().resolve();

        info!(data_root = %config.data_root.display(), "invoice core ready");
        Ok(App {
            db,
            config,
            validator,
            font,
        })
    }

    /// Replace the schema-validator capability (tests inject their own).
    pub fn with_validator(mut self, validator: Box<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the resolved PDF font.
    pub fn with_font(mut self, font: ResolvedFont) -> Self {
        self.font = font;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared database handle, for reads not covered by the services.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn clients(&self) -> ClientService<'_> {
        ClientService::new(&self.db)
    }

    pub fn invoices(&self) -> InvoiceService<'_> {
        InvoiceService::new(self)
    }

    pub(crate) fn validator(&self) -> &dyn SchemaValidator {
        self.validator.as_ref()
    }

    pub(crate) fn font(&self) -> &ResolvedFont {
        &self.font
    }
}
