//! External XSD validation of generated documents.
//!
//! Validation gates the artifact pipeline: an invoice's `xml_path` is
//! recorded only after the validator accepted the written file. The
//! capability is a trait so tests can substitute their own gate.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::core::Error;

/// Gate for generated FA(3) files.
pub trait SchemaValidator: Send + Sync {
    /// Check the file at `xml_path` against the schema. A rejection must
    /// carry the validator's diagnostics.
    fn validate(&self, xml_path: &Path) -> Result<(), Error>;
}

/// Default validator: spawns `xmllint --noout --schema` against the
/// configured schema file, with an optional XML catalog.
#[derive(Debug, Clone)]
pub struct XmllintValidator {
    schema: PathBuf,
    catalog: Option<PathBuf>,
}

impl XmllintValidator {
    pub fn new(schema: PathBuf, catalog: Option<PathBuf>) -> Self {
        Self { schema, catalog }
    }
}

impl SchemaValidator for XmllintValidator {
    fn validate(&self, xml_path: &Path) -> Result<(), Error> {
        let mut cmd = Command::new("xmllint");
        cmd.arg("--noout")
            .arg("--schema")
            .arg(&self.schema)
            .arg(xml_path);
        if let Some(catalog) = &self.catalog {
            cmd.env("XML_CATALOG_FILES", catalog);
        }

        debug!(
            schema = %self.schema.display(),
            file = %xml_path.display(),
            "running xmllint"
        );
        let output = cmd
            .output()
            .map_err(|e| Error::Io(format!("cannot run xmllint: {e}")))?;

        if !output.status.success() {
            return Err(Error::Fa3ValidationFailed {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

const BUNDLED_SCHEMA: &str = include_str!("../../assets/fa3/FA3.xsd");

/// Write the bundled schema into `dir` (idempotent) and return its path.
/// Called once at context construction so the validator always has a
/// schema file on disk.
pub fn materialize_bundled_schema(dir: &Path) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("cannot create {}: {e}", dir.display())))?;
    let path = dir.join("FA3.xsd");
    if !path.exists() {
        fs::write(&path, BUNDLED_SCHEMA)
            .map_err(|e| Error::Io(format!("cannot write {}: {e}", path.display())))?;
    }
    Ok(path)
}
