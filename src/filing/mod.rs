//! Control statement generation and submission lifecycle.
//!
//! [`ControlStatementService`] reads a period's invoices through an
//! [`InvoiceRepository`], writes the DPHKH1 document to a [`DocumentSink`],
//! and records each generation in a [`SubmissionStore`]. In-memory and
//! filesystem implementations are provided; database-backed stores plug in
//! through the same traits.
//!
//! # Example
//!
//! ```ignore
//! use hlaseni::filing::*;
//!
//! let service = ControlStatementService::new(
//!     InMemoryInvoiceRepository::new(),
//!     InMemorySubmissionStore::new(),
//!     FsDocumentSink::new("/var/lib/hlaseni"),
//!     load_settings("taxpayer.json")?,
//! );
//!
//! let outcome = service.generate(&GenerateRequest::regular(period))?;
//! service.mark_submitted(outcome.submission.id)?;
//! ```
//!
//! A runnable version lives in `demos/generate_statement.rs`
//! (`cargo run --example generate_statement --features filing`).

mod service;
mod settings;
mod store;
mod submission;

pub use service::{
    ClassificationReport, ControlStatementService, GenerateRequest, GenerationOutcome,
};
pub use settings::{load_settings, parse_settings};
pub use store::{
    DocumentSink, FsDocumentSink, InMemoryInvoiceRepository, InMemorySubmissionStore,
    InvoiceRepository, MemoryDocumentSink, SubmissionStore, document_file_name,
};
pub use submission::{NewSubmission, Submission, SubmissionStatus};
