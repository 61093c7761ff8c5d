use thiserror::Error;

/// Stable error kind, used by boundaries to map errors onto transport
/// status codes without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ReferenceInUse,
    Fa3ValidationFailed,
    Io,
    Internal,
}

/// Errors raised by the invoice core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input: NIP, date, amount, quantity, enum value, or a
    /// required/overlong text field. `issues` carries per-field detail
    /// when an entity-level validation produced more than one finding.
    #[error("validation failed: {message}")]
    Validation { message: String, issues: Vec<Issue> },

    /// An invoice or client id did not resolve to a row.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Uniqueness clash: duplicate invoice number or duplicate NIP.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A client still referenced by invoices cannot be deleted.
    #[error("{0}")]
    ReferenceInUse(String),

    /// The external XSD validator rejected a generated document.
    /// `stderr` is the validator's diagnostic output, verbatim.
    #[error("FA(3) schema validation failed")]
    Fa3ValidationFailed { stderr: String },

    /// Filesystem, external-process, or database-engine failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invariant violation inside the core (totals mismatch, sequence
    /// collision, corrupt stored enum). Always a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Single-finding validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// Validation error carrying a field-level issue list. The message is
    /// derived from the first issue.
    pub fn invalid(issues: Vec<Issue>) -> Self {
        let message = issues
            .first()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "invalid input".into());
        Error::Validation { message, issues }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::ReferenceInUse(_) => ErrorKind::ReferenceInUse,
            Error::Fa3ValidationFailed { .. } => ErrorKind::Fa3ValidationFailed,
            Error::Io(_) => ErrorKind::Io,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// A single validation finding with the field path it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Dot-separated path to the invalid field (e.g. "items[2].quantity").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
