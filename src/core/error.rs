use thiserror::Error;

use super::types::{Direction, InvoiceId, Section, SubmissionId};

/// Errors that can occur while classifying invoices or producing a control statement.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HlaseniError {
    /// Input failed a validation rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reporting period outside the calendar (month must be 1..=12).
    #[error("invalid reporting period {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },

    /// A section was assigned to an invoice of the wrong direction.
    #[error("section {section} cannot be assigned to an {direction} invoice")]
    SectionMismatch {
        section: Section,
        direction: Direction,
    },

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The persistence collaborator failed to read or write.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem error while writing a generated document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// No submission with the given id exists.
    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),

    /// No invoice with the given id exists.
    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// The extraction collaborator failed for an invoice.
    #[error("extraction failed for invoice {invoice_id}: {message}")]
    Extraction {
        invoice_id: InvoiceId,
        message: String,
    },
}

/// A single non-fatal finding with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the offending field (e.g. "taxpayer.dic").
    pub field: String,
    /// Human-readable description.
    pub message: String,
    /// Document attribute affected, if any (e.g. "VetaP/@dic").
    pub attribute: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(attribute) = &self.attribute {
            write!(f, "[{}] {}: {}", attribute, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a finding without an attribute reference.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            attribute: None,
        }
    }

    /// Create a finding tied to a document attribute.
    pub fn with_attribute(
        field: impl Into<String>,
        message: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            attribute: Some(attribute.into()),
        }
    }
}
