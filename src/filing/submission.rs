//! Submission records and their status lifecycle.
//!
//! ```text
//! Draft ──generate──▶ Generated ──mark_submitted──▶ Submitted (terminal)
//! ```
//!
//! `Draft` is never stored: it is the status of a period with no row yet.
//! Every generation appends a fresh `Generated` row, including after a
//! submission (corrective and follow-up filings); the newest row is current.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{FilingType, ReportingPeriod, SubmissionId};

/// Lifecycle status of a control statement for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// No document generated for the period yet.
    Draft,
    /// A document exists but has not been confirmed as filed.
    Generated,
    /// Confirmed as filed. Terminal.
    Submitted,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// Whether `next` is a forward step from this status.
    pub fn can_advance_to(&self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Generated) | (Self::Generated, Self::Submitted)
        )
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Generated => f.write_str("generated"),
            Self::Submitted => f.write_str("submitted"),
        }
    }
}

/// A generated control statement awaiting insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub period: ReportingPeriod,
    pub filing_type: FilingType,
    pub document: String,
    pub document_location: String,
    pub generated_at: DateTime<Utc>,
}

/// One stored generation of a period's control statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub period: ReportingPeriod,
    pub filing_type: FilingType,
    pub status: SubmissionStatus,
    /// Full document content as written to `document_location`.
    pub document: String,
    pub document_location: String,
    /// Insertion time; the newest row of a period is its current submission.
    pub created_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Materialize a stored row from an insertion request.
    pub fn from_new(id: SubmissionId, new: NewSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            period: new.period,
            filing_type: new.filing_type,
            status: SubmissionStatus::Generated,
            document: new.document,
            document_location: new.document_location,
            created_at,
            generated_at: new.generated_at,
            submitted_at: None,
        }
    }

    /// Move to `Submitted`.
    ///
    /// Returns `false` without touching the row when it is already submitted,
    /// so repeated confirmations keep the first submission timestamp.
    pub fn mark_submitted(&mut self, at: DateTime<Utc>) -> bool {
        if !self.status.can_advance_to(SubmissionStatus::Submitted) {
            return false;
        }
        self.status = SubmissionStatus::Submitted;
        self.submitted_at = Some(at);
        true
    }

    /// Ordering key for "current submission": creation time, then id.
    pub fn recency(&self) -> (DateTime<Utc>, SubmissionId) {
        (self.created_at, self.id)
    }
}
