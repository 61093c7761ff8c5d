//! FA(3) structured-invoice XML: generation and schema validation.
//!
//! [`to_fa3_xml`] emits a complete `Faktura` document for one invoice;
//! [`SchemaValidator`] gates written files through an external XSD
//! validator before their path is recorded on the invoice row.
//!
//! ```no_run
//! use fakturka::core::InvoiceDocument;
//! use fakturka::fa3;
//!
//! let doc: InvoiceDocument = todo!(); // assembled by the invoice service
//! let xml = fa3::to_fa3_xml(&doc, "fakturka", chrono::Utc::now()).unwrap();
//! ```

mod validate;
pub(crate) mod writer;
mod xml;

pub use validate::{materialize_bundled_schema, SchemaValidator, XmllintValidator};
pub use xml::{to_fa3_xml, FA3_NAMESPACE, FA3_SCHEMA_VERSION, FA3_SYSTEM_CODE};
