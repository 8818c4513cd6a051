use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::job::{Job, JobId, JobStatus, JobStore};
use crate::core::{HlaseniError, Invoice, InvoiceId, InvoiceTaxData, TaxAmounts, ensure_section};
use crate::filing::InvoiceRepository;

/// Tax data read from an invoice document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTaxData {
    pub amounts: TaxAmounts,
    pub total_amount: Decimal,
    pub currency: String,
    pub reverse_charge_code: Option<String>,
    /// 0.0..=1.0; exactly 1.0 counts as verified.
    pub confidence: f32,
}

impl ExtractedTaxData {
    fn into_tax_data(self, invoice_id: InvoiceId) -> InvoiceTaxData {
        let mut data = InvoiceTaxData::new(invoice_id, self.amounts, self.total_amount);
        data.currency = self.currency;
        data.reverse_charge_code = self.reverse_charge_code;
        data.confidence = Some(self.confidence);
        if self.confidence >= 1.0 {
            data.mark_verified();
        }
        data
    }
}

/// Reads tax data from an invoice's source document.
pub trait Extractor: Send + Sync {
    fn extract(&self, invoice: &Invoice) -> Result<ExtractedTaxData, HlaseniError>;
}

impl<F> Extractor for F
where
    F: Fn(&Invoice) -> Result<ExtractedTaxData, HlaseniError> + Send + Sync,
{
    fn extract(&self, invoice: &Invoice) -> Result<ExtractedTaxData, HlaseniError> {
        self(invoice)
    }
}

/// Result of [`OcrQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued(JobId),
    /// The invoice already had extracted or verified data.
    Skipped(JobId),
    /// A queued or running job for the invoice already exists; nothing was added.
    AlreadyQueued(JobId),
}

impl Enqueued {
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Queued(id) | Self::Skipped(id) | Self::AlreadyQueued(id) => *id,
        }
    }
}

/// Snapshot of the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Invoice whose job is running right now.
    pub processing: Option<InvoiceId>,
}

impl QueueStatus {
    pub fn is_idle(&self) -> bool {
        self.queued == 0 && self.processing.is_none()
    }
}

#[derive(Debug, Default)]
struct WorkerState {
    running: bool,
    processing: Option<InvoiceId>,
}

struct Inner<J, E, R> {
    jobs: J,
    extractor: E,
    invoices: R,
    state: Mutex<WorkerState>,
    idle: Condvar,
}

/// Background extraction queue with a single worker thread.
///
/// The worker starts on the first enqueue and exits once no queued job is
/// left; the next enqueue starts it again. Jobs run one at a time in id
/// order. The running flag and the pick of the next job share one lock, so
/// a job enqueued while the worker is winding down is never stranded.
pub struct OcrQueue<J, E, R> {
    inner: Arc<Inner<J, E, R>>,
}

impl<J, E, R> Clone for OcrQueue<J, E, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<J, E, R> OcrQueue<J, E, R>
where
    J: JobStore + 'static,
    E: Extractor + 'static,
    R: InvoiceRepository + 'static,
{
    pub fn new(jobs: J, extractor: E, invoices: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs,
                extractor,
                invoices,
                state: Mutex::new(WorkerState::default()),
                idle: Condvar::new(),
            }),
        }
    }

    pub fn jobs(&self) -> &J {
        &self.inner.jobs
    }

    pub fn invoices(&self) -> &R {
        &self.inner.invoices
    }

    /// Request extraction for an invoice.
    pub fn enqueue(&self, invoice_id: InvoiceId) -> Result<Enqueued, HlaseniError> {
        let inner = &self.inner;
        let mut state = inner.lock_state()?;

        if inner.invoices.invoice(invoice_id)?.is_none() {
            return Err(HlaseniError::InvoiceNotFound(invoice_id));
        }
        if let Some(active) = inner
            .jobs
            .list()?
            .into_iter()
            .find(|job| job.invoice_id == invoice_id && job.status.is_active())
        {
            tracing::debug!(%invoice_id, job_id = %active.id, "extraction already queued");
            return Ok(Enqueued::AlreadyQueued(active.id));
        }

        let existing = inner.invoices.tax_data(invoice_id)?;
        if existing.is_some_and(|d| d.confidence.is_some() || d.manually_verified) {
            let job = inner.jobs.create(invoice_id, JobStatus::Skipped)?;
            tracing::debug!(%invoice_id, job_id = %job.id, "extraction skipped, data already present");
            return Ok(Enqueued::Skipped(job.id));
        }

        let job = inner.jobs.create(invoice_id, JobStatus::Queued)?;
        tracing::debug!(%invoice_id, job_id = %job.id, "extraction queued");

        if !state.running {
            let worker = Arc::clone(inner);
            thread::Builder::new()
                .name("hlaseni-ocr".into())
                .spawn(move || worker.run())?;
            state.running = true;
        }
        Ok(Enqueued::Queued(job.id))
    }

    pub fn status(&self) -> Result<QueueStatus, HlaseniError> {
        let processing = self.inner.lock_state()?.processing;
        let mut status = QueueStatus {
            processing,
            ..QueueStatus::default()
        };
        for job in self.inner.jobs.list()? {
            match job.status {
                JobStatus::Queued => status.queued += 1,
                JobStatus::Done => status.done += 1,
                JobStatus::Failed => status.failed += 1,
                JobStatus::Skipped => status.skipped += 1,
                JobStatus::Processing => {}
            }
        }
        Ok(status)
    }

    /// Block until the worker has drained the queue or `timeout` elapses.
    /// Returns `true` when the queue is idle.
    pub fn wait_idle(&self, timeout: Duration) -> Result<bool, HlaseniError> {
        let state = self.inner.lock_state()?;
        let (state, _) = self
            .inner
            .idle
            .wait_timeout_while(state, timeout, |s| s.running)
            .map_err(|_| poisoned())?;
        Ok(!state.running)
    }
}

impl<J, E, R> Inner<J, E, R>
where
    J: JobStore,
    E: Extractor,
    R: InvoiceRepository,
{
    fn lock_state(&self) -> Result<MutexGuard<'_, WorkerState>, HlaseniError> {
        self.state.lock().map_err(|_| poisoned())
    }

    fn run(&self) {
        tracing::debug!("extraction worker started");
        while let Some(job) = self.next_job() {
            self.process(job);
        }
        tracing::debug!("extraction worker stopped");
    }

    /// Claim the oldest queued job, or stop the worker when there is none.
    fn next_job(&self) -> Option<Job> {
        let Ok(mut state) = self.state.lock() else {
            return None;
        };
        state.processing = None;

        let claimed = self.jobs.next_queued().and_then(|job| match job {
            Some(mut job) => {
                job.status = JobStatus::Processing;
                self.jobs.update(&job)?;
                Ok(Some(job))
            }
            None => Ok(None),
        });
        match claimed {
            Ok(Some(job)) => {
                state.processing = Some(job.invoice_id);
                Some(job)
            }
            Ok(None) => {
                state.running = false;
                self.idle.notify_all();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "extraction worker cannot read job store");
                state.running = false;
                self.idle.notify_all();
                None
            }
        }
    }

    fn process(&self, mut job: Job) {
        let result = self.extract_and_save(job.invoice_id);
        if let Err(e) = &result {
            tracing::warn!(invoice_id = %job.invoice_id, job_id = %job.id, error = %e, "extraction failed");
        } else {
            tracing::debug!(invoice_id = %job.invoice_id, job_id = %job.id, "extraction done");
        }
        job.finish(result);
        if let Err(e) = self.jobs.update(&job) {
            tracing::warn!(job_id = %job.id, error = %e, "cannot record job result");
        }
    }

    fn extract_and_save(&self, invoice_id: InvoiceId) -> Result<(), HlaseniError> {
        let invoice = self
            .invoices
            .invoice(invoice_id)?
            .ok_or(HlaseniError::InvoiceNotFound(invoice_id))?;
        // A panicking extractor fails its job instead of killing the worker.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| self.extractor.extract(&invoice)))
            .unwrap_or_else(|payload| {
                Err(HlaseniError::Extraction {
                    invoice_id,
                    message: format!("extractor panicked: {}", panic_message(payload.as_ref())),
                })
            })
            .map_err(|e| match e {
                HlaseniError::Extraction { .. } => e,
                other => HlaseniError::Extraction {
                    invoice_id,
                    message: other.to_string(),
                },
            })?;

        let existing = self.invoices.tax_data(invoice_id)?;
        if existing.as_ref().is_some_and(|d| d.manually_verified) {
            // Confirmed while the job waited; user data wins.
            return Ok(());
        }

        let mut data = extracted.into_tax_data(invoice_id);
        data.section = existing.and_then(|d| d.section);
        ensure_section(&invoice, &mut data);
        self.invoices.save_tax_data(data)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause")
}

fn poisoned() -> HlaseniError {
    HlaseniError::Storage("extraction queue lock poisoned".into())
}
