use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::store::{DocumentSink, InvoiceRepository, SubmissionStore};
use super::submission::{NewSubmission, Submission, SubmissionStatus};
use crate::core::{
    Aggregation, ControlSums, FilingType, HlaseniError, InvoiceId, ReportingPeriod, Section,
    SubmissionId, TaxpayerSettings, ValidationError, aggregate, assign_section, control_sums,
    ensure_section, validate_lines, validate_settings,
};
use crate::xml::{DocumentHeader, build_document};

/// Parameters of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub period: ReportingPeriod,
    pub filing_type: FilingType,
    pub discovery_date: Option<NaiveDate>,
    pub challenge_reference: Option<String>,
    /// Filing date written to `d_poddp`. Defaults to the UTC date of
    /// generation, which lags the Prague calendar date shortly after
    /// midnight; callers that care pass the local date.
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
}

impl GenerateRequest {
    pub fn new(period: ReportingPeriod, filing_type: FilingType) -> Self {
        Self {
            period,
            filing_type,
            discovery_date: None,
            challenge_reference: None,
            filing_date: None,
        }
    }

    pub fn regular(period: ReportingPeriod) -> Self {
        Self::new(period, FilingType::Regular)
    }

    pub fn discovery_date(mut self, date: NaiveDate) -> Self {
        self.discovery_date = Some(date);
        self
    }

    pub fn challenge_reference(mut self, reference: impl Into<String>) -> Self {
        self.challenge_reference = Some(reference.into());
        self
    }

    pub fn filing_date(mut self, date: NaiveDate) -> Self {
        self.filing_date = Some(date);
        self
    }
}

/// Result of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The newly inserted row, now current for the period.
    pub submission: Submission,
    pub aggregation: Aggregation,
    pub control_sums: ControlSums,
    /// Invoices left out because they have no section (or no tax data).
    pub unclassified: Vec<InvoiceId>,
    /// Classified invoices with no element in the document (A3).
    pub unreported: Vec<InvoiceId>,
    /// Taxpayer and line findings the filing portal may reject.
    pub warnings: Vec<ValidationError>,
}

impl GenerationOutcome {
    pub fn document(&self) -> &str {
        &self.submission.document
    }
}

/// Outcome of classifying a period's pending invoices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Invoices that received a section in this run.
    pub classified: Vec<(InvoiceId, Section)>,
    /// Invoices that already had a section and were left alone.
    pub already_classified: usize,
    /// Invoices that cannot be classified yet because no tax data exists.
    pub missing_tax_data: Vec<InvoiceId>,
}

/// Control statement generation and submission lifecycle over injected stores.
///
/// Generation only reads invoice data and appends a submission row, so the
/// service can be shared across threads (e.g. behind an `Arc`) without extra
/// locking. Concurrent generations for one period each produce a row; the
/// later insert becomes current.
pub struct ControlStatementService<R, S, D> {
    invoices: R,
    submissions: S,
    sink: D,
    taxpayer: TaxpayerSettings,
}

impl<R, S, D> ControlStatementService<R, S, D>
where
    R: InvoiceRepository,
    S: SubmissionStore,
    D: DocumentSink,
{
    pub fn new(invoices: R, submissions: S, sink: D, taxpayer: TaxpayerSettings) -> Self {
        Self {
            invoices,
            submissions,
            sink,
            taxpayer,
        }
    }

    pub fn invoices(&self) -> &R {
        &self.invoices
    }

    pub fn submissions(&self) -> &S {
        &self.submissions
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn taxpayer(&self) -> &TaxpayerSettings {
        &self.taxpayer
    }

    /// Generate the control statement of a period and record a new submission.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerationOutcome, HlaseniError> {
        self.generate_at(request, Utc::now())
    }

    /// [`generate`](Self::generate) with an explicit generation time.
    ///
    /// The document is written to the sink before the row is inserted; a
    /// failed write leaves no submission behind.
    pub fn generate_at(
        &self,
        request: &GenerateRequest,
        now: DateTime<Utc>,
    ) -> Result<GenerationOutcome, HlaseniError> {
        let period = request.period;
        let invoices = self.invoices.period_invoices(period)?;
        let aggregation = aggregate(&invoices);
        let sums = control_sums(&invoices);

        let header = DocumentHeader {
            period,
            filing_type: request.filing_type,
            discovery_date: request.discovery_date,
            challenge_reference: request.challenge_reference.clone(),
            filing_date: request.filing_date.unwrap_or_else(|| now.date_naive()),
        };
        let document = build_document(&header, &self.taxpayer, &aggregation, &sums)?;

        let mut warnings = validate_settings(&self.taxpayer);
        warnings.extend(validate_lines(&aggregation));
        if !aggregation.unclassified.is_empty() {
            tracing::warn!(
                %period,
                count = aggregation.unclassified.len(),
                "invoices without a section left out of the control statement"
            );
        }

        let location = self
            .sink
            .write(period, request.filing_type, now, &document)?;
        let submission = self.submissions.insert(NewSubmission {
            period,
            filing_type: request.filing_type,
            document,
            document_location: location,
            generated_at: now,
        })?;

        tracing::info!(
            %period,
            submission_id = %submission.id,
            filing_type = request.filing_type.code(),
            lines = aggregation.line_count(),
            unclassified = aggregation.unclassified.len(),
            location = %submission.document_location,
            "control statement generated"
        );

        Ok(GenerationOutcome {
            submission,
            unclassified: aggregation.unclassified.clone(),
            unreported: aggregation.unreported.clone(),
            aggregation,
            control_sums: sums,
            warnings,
        })
    }

    /// Confirm that a submission was filed. Repeating the call is harmless.
    pub fn mark_submitted(&self, id: SubmissionId) -> Result<Submission, HlaseniError> {
        self.mark_submitted_at(id, Utc::now())
    }

    /// Only the period's current row can move to `Submitted`; an older
    /// `Generated` row has been superseded and is rejected by the store.
    pub fn mark_submitted_at(
        &self,
        id: SubmissionId,
        at: DateTime<Utc>,
    ) -> Result<Submission, HlaseniError> {
        let row = self
            .submissions
            .get(id)?
            .ok_or(HlaseniError::SubmissionNotFound(id))?;
        if row.status.is_terminal() {
            return Ok(row);
        }

        let submission = self.submissions.mark_submitted(id, at)?;
        tracing::info!(
            submission_id = %id,
            period = %submission.period,
            submitted_at = ?submission.submitted_at,
            "control statement marked submitted"
        );
        Ok(submission)
    }

    pub fn current_submission(
        &self,
        period: ReportingPeriod,
    ) -> Result<Option<Submission>, HlaseniError> {
        self.submissions.current(period)
    }

    pub fn history(&self, period: ReportingPeriod) -> Result<Vec<Submission>, HlaseniError> {
        self.submissions.history(period)
    }

    /// Status of the period's current submission; `Draft` when none exists.
    pub fn period_status(&self, period: ReportingPeriod) -> Result<SubmissionStatus, HlaseniError> {
        Ok(self
            .submissions
            .current(period)?
            .map_or(SubmissionStatus::Draft, |s| s.status))
    }

    /// Invoices of a period that would be left out of the document.
    pub fn unclassified_invoices(
        &self,
        period: ReportingPeriod,
    ) -> Result<Vec<InvoiceId>, HlaseniError> {
        Ok(aggregate(&self.invoices.period_invoices(period)?).unclassified)
    }

    /// Classify and store every invoice of a period that has tax data but no section.
    pub fn classify_pending(
        &self,
        period: ReportingPeriod,
    ) -> Result<ClassificationReport, HlaseniError> {
        let mut report = ClassificationReport::default();
        for entry in self.invoices.period_invoices(period)? {
            let Some(mut tax_data) = entry.tax_data else {
                report.missing_tax_data.push(entry.invoice.id);
                continue;
            };
            match ensure_section(&entry.invoice, &mut tax_data) {
                Some(section) => {
                    self.invoices.save_tax_data(tax_data)?;
                    report.classified.push((entry.invoice.id, section));
                }
                None => report.already_classified += 1,
            }
        }
        tracing::debug!(
            %period,
            classified = report.classified.len(),
            already_classified = report.already_classified,
            missing = report.missing_tax_data.len(),
            "pending invoices classified"
        );
        Ok(report)
    }

    /// Manually assign a section. The assignment is never overwritten by
    /// automatic classification.
    pub fn assign_section(&self, id: InvoiceId, section: Section) -> Result<(), HlaseniError> {
        let invoice = self
            .invoices
            .invoice(id)?
            .ok_or(HlaseniError::InvoiceNotFound(id))?;
        let mut tax_data = self.invoices.tax_data(id)?.ok_or_else(|| {
            HlaseniError::Validation(format!("invoice {id} has no tax data to assign a section to"))
        })?;
        assign_section(&invoice, &mut tax_data, section)?;
        self.invoices.save_tax_data(tax_data)?;
        tracing::info!(invoice_id = %id, %section, "section assigned manually");
        Ok(())
    }

    /// Record explicit user confirmation of an invoice's tax data.
    pub fn confirm_tax_data(&self, id: InvoiceId) -> Result<(), HlaseniError> {
        let mut tax_data = self
            .invoices
            .tax_data(id)?
            .ok_or(HlaseniError::InvoiceNotFound(id))?;
        if tax_data.manually_verified {
            return Ok(());
        }
        tax_data.mark_verified();
        self.invoices.save_tax_data(tax_data)
    }
}
