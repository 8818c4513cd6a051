//! Background tax-data extraction queue.
//!
//! Invoices are queued for an [`Extractor`] (an OCR engine, a parser, or a
//! remote service) and processed one at a time by a worker thread. Results
//! are saved through the same [`InvoiceRepository`](crate::filing::InvoiceRepository)
//! the control statement is generated from, and newly extracted invoices are
//! classified straight away.
//!
//! # Example
//!
//! ```ignore
//! use hlaseni::ocr::*;
//!
//! let queue = OcrQueue::new(InMemoryJobStore::new(), my_extractor, repository);
//! queue.enqueue(InvoiceId(42))?;
//! queue.wait_idle(Duration::from_secs(30))?;
//! ```

mod job;
mod queue;

pub use job::{InMemoryJobStore, Job, JobId, JobStatus, JobStore};
pub use queue::{Enqueued, ExtractedTaxData, Extractor, OcrQueue, QueueStatus};
