//! Persistence seams: invoice data, submission rows, and document files.
//!
//! Storage engines live outside this crate. The in-memory implementations
//! here back the tests and small embedders; `FsDocumentSink` writes real
//! files.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::submission::{NewSubmission, Submission};
use crate::core::{
    FilingType, HlaseniError, Invoice, InvoiceId, InvoiceTaxData, PeriodInvoice, ReportingPeriod,
    SubmissionId,
};

/// Read and update access to invoices and their tax data.
pub trait InvoiceRepository: Send + Sync {
    /// Every invoice of a period with its tax data, if any.
    fn period_invoices(&self, period: ReportingPeriod) -> Result<Vec<PeriodInvoice>, HlaseniError>;

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, HlaseniError>;

    fn tax_data(&self, id: InvoiceId) -> Result<Option<InvoiceTaxData>, HlaseniError>;

    /// Insert or replace the tax data of an existing invoice.
    fn save_tax_data(&self, data: InvoiceTaxData) -> Result<(), HlaseniError>;
}

/// Append-only store of generated control statements.
pub trait SubmissionStore: Send + Sync {
    /// Insert a new row in `Generated` status.
    fn insert(&self, new: NewSubmission) -> Result<Submission, HlaseniError>;

    fn get(&self, id: SubmissionId) -> Result<Option<Submission>, HlaseniError>;

    /// All rows of a period, oldest first.
    fn history(&self, period: ReportingPeriod) -> Result<Vec<Submission>, HlaseniError>;

    /// Atomically move a row to `Submitted`; a no-op when already submitted.
    ///
    /// Only the period's current row may move. A `Generated` row superseded
    /// by a newer one fails with [`HlaseniError::Validation`]; the check and
    /// the update must happen under one lock or transaction.
    fn mark_submitted(
        &self,
        id: SubmissionId,
        at: DateTime<Utc>,
    ) -> Result<Submission, HlaseniError>;

    /// The row with the greatest creation time (then id) for a period.
    fn current(&self, period: ReportingPeriod) -> Result<Option<Submission>, HlaseniError> {
        Ok(self
            .history(period)?
            .into_iter()
            .max_by_key(Submission::recency))
    }
}

/// Destination for generated documents.
pub trait DocumentSink: Send + Sync {
    /// Persist `content` and return its location. Must not return until the
    /// write is complete.
    fn write(
        &self,
        period: ReportingPeriod,
        filing_type: FilingType,
        generated_at: DateTime<Utc>,
        content: &str,
    ) -> Result<String, HlaseniError>;
}

impl<T: InvoiceRepository + ?Sized> InvoiceRepository for Arc<T> {
    fn period_invoices(&self, period: ReportingPeriod) -> Result<Vec<PeriodInvoice>, HlaseniError> {
        (**self).period_invoices(period)
    }

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, HlaseniError> {
        (**self).invoice(id)
    }

    fn tax_data(&self, id: InvoiceId) -> Result<Option<InvoiceTaxData>, HlaseniError> {
        (**self).tax_data(id)
    }

    fn save_tax_data(&self, data: InvoiceTaxData) -> Result<(), HlaseniError> {
        (**self).save_tax_data(data)
    }
}

impl<T: SubmissionStore + ?Sized> SubmissionStore for Arc<T> {
    fn insert(&self, new: NewSubmission) -> Result<Submission, HlaseniError> {
        (**self).insert(new)
    }

    fn get(&self, id: SubmissionId) -> Result<Option<Submission>, HlaseniError> {
        (**self).get(id)
    }

    fn history(&self, period: ReportingPeriod) -> Result<Vec<Submission>, HlaseniError> {
        (**self).history(period)
    }

    fn mark_submitted(
        &self,
        id: SubmissionId,
        at: DateTime<Utc>,
    ) -> Result<Submission, HlaseniError> {
        (**self).mark_submitted(id, at)
    }

    fn current(&self, period: ReportingPeriod) -> Result<Option<Submission>, HlaseniError> {
        (**self).current(period)
    }
}

impl<T: DocumentSink + ?Sized> DocumentSink for Arc<T> {
    fn write(
        &self,
        period: ReportingPeriod,
        filing_type: FilingType,
        generated_at: DateTime<Utc>,
        content: &str,
    ) -> Result<String, HlaseniError> {
        (**self).write(period, filing_type, generated_at, content)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, HlaseniError> {
    mutex
        .lock()
        .map_err(|_| HlaseniError::Storage("store lock poisoned".into()))
}

/// File name of a generated document: `KH1_<yyyymm>_<forma>_<timestamp>.xml`.
pub fn document_file_name(
    period: ReportingPeriod,
    filing_type: FilingType,
    generated_at: DateTime<Utc>,
) -> String {
    format!(
        "KH1_{}{:02}_{}_{}.xml",
        period.year(),
        period.month(),
        filing_type.code(),
        generated_at.format("%Y%m%dT%H%M%S%3f")
    )
}

/// Invoice repository held in memory.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    rows: Mutex<BTreeMap<InvoiceId, PeriodInvoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an invoice together with its tax data.
    pub fn insert(
        &self,
        invoice: Invoice,
        tax_data: Option<InvoiceTaxData>,
    ) -> Result<(), HlaseniError> {
        lock(&self.rows)?.insert(invoice.id, PeriodInvoice::new(invoice, tax_data));
        Ok(())
    }

    pub fn remove(&self, id: InvoiceId) -> Result<bool, HlaseniError> {
        Ok(lock(&self.rows)?.remove(&id).is_some())
    }
}

impl InvoiceRepository for InMemoryInvoiceRepository {
    fn period_invoices(&self, period: ReportingPeriod) -> Result<Vec<PeriodInvoice>, HlaseniError> {
        Ok(lock(&self.rows)?
            .values()
            .filter(|row| row.invoice.period == period)
            .cloned()
            .collect())
    }

    fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, HlaseniError> {
        Ok(lock(&self.rows)?.get(&id).map(|row| row.invoice.clone()))
    }

    fn tax_data(&self, id: InvoiceId) -> Result<Option<InvoiceTaxData>, HlaseniError> {
        Ok(lock(&self.rows)?
            .get(&id)
            .and_then(|row| row.tax_data.clone()))
    }

    fn save_tax_data(&self, data: InvoiceTaxData) -> Result<(), HlaseniError> {
        let mut rows = lock(&self.rows)?;
        let row = rows
            .get_mut(&data.invoice_id)
            .ok_or(HlaseniError::InvoiceNotFound(data.invoice_id))?;
        row.tax_data = Some(data);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SubmissionRows {
    next_id: i64,
    rows: Vec<Submission>,
}

/// Submission store held in memory.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    inner: Mutex<SubmissionRows>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).map(|s| s.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creation times never go backwards, even when the wall clock does.
    fn insert_at(
        &self,
        new: NewSubmission,
        now: DateTime<Utc>,
    ) -> Result<Submission, HlaseniError> {
        let mut inner = lock(&self.inner)?;
        let created_at = inner
            .rows
            .iter()
            .map(|s| s.created_at)
            .max()
            .map_or(now, |last| last.max(now));
        inner.next_id += 1;
        let submission = Submission::from_new(SubmissionId(inner.next_id), new, created_at);
        inner.rows.push(submission.clone());
        Ok(submission)
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn insert(&self, new: NewSubmission) -> Result<Submission, HlaseniError> {
        self.insert_at(new, Utc::now())
    }

    fn get(&self, id: SubmissionId) -> Result<Option<Submission>, HlaseniError> {
        Ok(lock(&self.inner)?.rows.iter().find(|s| s.id == id).cloned())
    }

    fn history(&self, period: ReportingPeriod) -> Result<Vec<Submission>, HlaseniError> {
        let mut rows: Vec<Submission> = lock(&self.inner)?
            .rows
            .iter()
            .filter(|s| s.period == period)
            .cloned()
            .collect();
        rows.sort_by_key(Submission::recency);
        Ok(rows)
    }

    fn mark_submitted(
        &self,
        id: SubmissionId,
        at: DateTime<Utc>,
    ) -> Result<Submission, HlaseniError> {
        let mut inner = lock(&self.inner)?;
        let index = inner
            .rows
            .iter()
            .position(|s| s.id == id)
            .ok_or(HlaseniError::SubmissionNotFound(id))?;
        let period = inner.rows[index].period;
        if !inner.rows[index].status.is_terminal() {
            let current = inner
                .rows
                .iter()
                .filter(|s| s.period == period)
                .max_by_key(|s| s.recency())
                .map(|s| s.id);
            if let Some(current) = current.filter(|&c| c != id) {
                return Err(HlaseniError::Validation(format!(
                    "submission {id} is superseded by submission {current} for {period}"
                )));
            }
        }
        let row = &mut inner.rows[index];
        row.mark_submitted(at);
        Ok(row.clone())
    }
}

/// Writes documents below a root directory, one folder per period.
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    root: PathBuf,
}

impl FsDocumentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents of one period: `<root>/<yyyy>/<mm>`.
    pub fn period_dir(&self, period: ReportingPeriod) -> PathBuf {
        self.root
            .join(period.year().to_string())
            .join(format!("{:02}", period.month()))
    }
}

impl DocumentSink for FsDocumentSink {
    fn write(
        &self,
        period: ReportingPeriod,
        filing_type: FilingType,
        generated_at: DateTime<Utc>,
        content: &str,
    ) -> Result<String, HlaseniError> {
        let dir = self.period_dir(period);
        fs::create_dir_all(&dir)?;
        let name = document_file_name(period, filing_type, generated_at);
        let stem = name.trim_end_matches(".xml");

        // Two generations within the same millisecond get distinct files.
        let mut attempt = 0u32;
        loop {
            let path = if attempt == 0 {
                dir.join(&name)
            } else {
                dir.join(format!("{stem}_{attempt}.xml"))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    file.sync_all()?;
                    tracing::debug!(path = %path.display(), bytes = content.len(), "control statement written");
                    return Ok(path.display().to_string());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < 1000 => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Keeps written documents in memory, keyed by location.
#[derive(Debug, Default)]
pub struct MemoryDocumentSink {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemoryDocumentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, location: &str) -> Option<String> {
        lock(&self.documents)
            .ok()
            .and_then(|docs| docs.get(location).cloned())
    }

    pub fn len(&self) -> usize {
        lock(&self.documents).map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentSink for MemoryDocumentSink {
    fn write(
        &self,
        period: ReportingPeriod,
        filing_type: FilingType,
        generated_at: DateTime<Utc>,
        content: &str,
    ) -> Result<String, HlaseniError> {
        let location = format!(
            "memory://{}/{:02}/{}",
            period.year(),
            period.month(),
            document_file_name(period, filing_type, generated_at)
        );
        lock(&self.documents)?.insert(location.clone(), content.to_string());
        Ok(location)
    }
}
