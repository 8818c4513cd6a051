use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{HlaseniError, InvoiceId};

/// Identity of an extraction job. Ids grow with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
    /// Recorded without running because the invoice already had extracted
    /// or verified data.
    Skipped,
}

impl JobStatus {
    /// Queued or processing.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Processing)
    }
}

/// One extraction request for one invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub invoice_id: InvoiceId,
    pub status: JobStatus,
    /// Failure message of a `Failed` job.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub(crate) fn finish(&mut self, result: Result<(), HlaseniError>) {
        match result {
            Ok(()) => self.status = JobStatus::Done,
            Err(e) => {
                self.status = JobStatus::Failed;
                self.error = Some(e.to_string());
            }
        }
        self.finished_at = Some(Utc::now());
    }
}

/// Persistence of extraction jobs.
pub trait JobStore: Send + Sync {
    /// Create a job with a fresh, increasing id.
    fn create(&self, invoice_id: InvoiceId, status: JobStatus) -> Result<Job, HlaseniError>;

    fn get(&self, id: JobId) -> Result<Option<Job>, HlaseniError>;

    /// Replace a stored job.
    fn update(&self, job: &Job) -> Result<(), HlaseniError>;

    /// All jobs in id order.
    fn list(&self) -> Result<Vec<Job>, HlaseniError>;

    /// The oldest queued job, if any.
    fn next_queued(&self) -> Result<Option<Job>, HlaseniError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|job| job.status == JobStatus::Queued)
            .min_by_key(|job| job.id))
    }
}

impl<T: JobStore + ?Sized> JobStore for Arc<T> {
    fn create(&self, invoice_id: InvoiceId, status: JobStatus) -> Result<Job, HlaseniError> {
        (**self).create(invoice_id, status)
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, HlaseniError> {
        (**self).get(id)
    }

    fn update(&self, job: &Job) -> Result<(), HlaseniError> {
        (**self).update(job)
    }

    fn list(&self) -> Result<Vec<Job>, HlaseniError> {
        (**self).list()
    }

    fn next_queued(&self) -> Result<Option<Job>, HlaseniError> {
        (**self).next_queued()
    }
}

#[derive(Debug, Default)]
struct JobRows {
    next_id: i64,
    jobs: BTreeMap<JobId, Job>,
}

/// Job store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: Mutex<JobRows>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> Result<MutexGuard<'_, JobRows>, HlaseniError> {
        self.inner
            .lock()
            .map_err(|_| HlaseniError::Storage("job store lock poisoned".into()))
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, invoice_id: InvoiceId, status: JobStatus) -> Result<Job, HlaseniError> {
        let mut rows = self.rows()?;
        rows.next_id += 1;
        let now = Utc::now();
        let job = Job {
            id: JobId(rows.next_id),
            invoice_id,
            status,
            error: None,
            created_at: now,
            finished_at: (!status.is_active()).then_some(now),
        };
        rows.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn get(&self, id: JobId) -> Result<Option<Job>, HlaseniError> {
        Ok(self.rows()?.jobs.get(&id).cloned())
    }

    fn update(&self, job: &Job) -> Result<(), HlaseniError> {
        let mut rows = self.rows()?;
        let slot = rows
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| HlaseniError::Storage(format!("job {} not found", job.id)))?;
        *slot = job.clone();
        Ok(())
    }

    fn list(&self) -> Result<Vec<Job>, HlaseniError> {
        Ok(self.rows()?.jobs.values().cloned().collect())
    }
}
