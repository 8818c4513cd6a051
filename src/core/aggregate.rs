//! Grouping of classified invoices into control statement lines.
//!
//! Sections A1, A2, A4, B1 and B2 report one line per invoice. Sections A5
//! and B3 collapse all their invoices into a single summary line that keeps
//! no per-invoice identity; the invoice-level trail stays with the caller's
//! stored data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{InvoiceId, PeriodInvoice, Section, TaxAmounts};

/// One invoice reported individually in a line-by-line section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub section: Section,
    /// 1-based row number within the section (`c_radku`).
    pub row: u32,
    pub invoice_id: InvoiceId,
    pub document_number: String,
    pub counterparty_vat_id: Option<String>,
    pub tax_point_date: Option<NaiveDate>,
    /// Amounts rounded to two decimals.
    pub amounts: TaxAmounts,
    pub reverse_charge_code: Option<String>,
}

/// Field-wise sum of every invoice in a summary section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub section: Section,
    pub invoice_count: usize,
    pub amounts: TaxAmounts,
}

/// Lines of one reporting period, grouped by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub invoice_lines: BTreeMap<Section, Vec<InvoiceLine>>,
    pub summaries: BTreeMap<Section, SummaryLine>,
    /// Invoices without tax data or without a section.
    pub unclassified: Vec<InvoiceId>,
    /// Classified invoices the document has no element for (A3, or a
    /// section that contradicts the invoice direction).
    pub unreported: Vec<InvoiceId>,
}

impl Aggregation {
    /// Individual lines of a section, in document order.
    pub fn lines(&self, section: Section) -> &[InvoiceLine] {
        self.invoice_lines
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The summary line of an aggregate section, if any invoice landed there.
    pub fn summary(&self, section: Section) -> Option<&SummaryLine> {
        self.summaries.get(&section)
    }

    /// Number of document lines (individual plus summary).
    pub fn line_count(&self) -> usize {
        self.invoice_lines.values().map(Vec::len).sum::<usize>() + self.summaries.len()
    }
}

/// Group a period's invoices into section lines.
///
/// Output ordering depends only on the data: individual lines are sorted by
/// document number and then invoice id, never by input order.
pub fn aggregate(invoices: &[PeriodInvoice]) -> Aggregation {
    let mut result = Aggregation::default();

    for entry in invoices {
        let Some(tax_data) = entry.tax_data.as_ref() else {
            result.unclassified.push(entry.invoice.id);
            continue;
        };
        let Some(section) = tax_data.section else {
            result.unclassified.push(entry.invoice.id);
            continue;
        };
        if section.direction() != entry.invoice.direction {
            tracing::warn!(
                invoice_id = %entry.invoice.id,
                %section,
                direction = %entry.invoice.direction,
                "section contradicts invoice direction; invoice left out"
            );
            result.unreported.push(entry.invoice.id);
            continue;
        }
        if !Section::DOCUMENT_ORDER.contains(&section) {
            result.unreported.push(entry.invoice.id);
            continue;
        }

        let amounts = tax_data.amounts.rounded();
        if section.is_aggregate() {
            let summary = result
                .summaries
                .entry(section)
                .or_insert_with(|| SummaryLine {
                    section,
                    invoice_count: 0,
                    amounts: TaxAmounts::zero(),
                });
            summary.invoice_count += 1;
            summary.amounts += amounts;
        } else {
            result
                .invoice_lines
                .entry(section)
                .or_default()
                .push(InvoiceLine {
                    section,
                    row: 0,
                    invoice_id: entry.invoice.id,
                    document_number: entry.invoice.document_number.clone(),
                    counterparty_vat_id: entry.invoice.counterparty_vat_id.clone(),
                    tax_point_date: entry.invoice.tax_point_date,
                    amounts,
                    reverse_charge_code: tax_data.reverse_charge_code.clone(),
                });
        }
    }

    for lines in result.invoice_lines.values_mut() {
        lines.sort_by(|a, b| {
            a.document_number
                .cmp(&b.document_number)
                .then(a.invoice_id.cmp(&b.invoice_id))
        });
        for (i, line) in lines.iter_mut().enumerate() {
            line.row = i as u32 + 1;
        }
    }
    result.unclassified.sort();
    result.unreported.sort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Direction, Invoice, InvoiceTaxData, ReportingPeriod};
    use rust_decimal_macros::dec;

    fn entry(id: i64, number: &str, direction: Direction, section: Option<Section>) -> PeriodInvoice {
        let invoice = Invoice::new(
            InvoiceId(id),
            number,
            ReportingPeriod::new(2025, 1).unwrap(),
            direction,
        );
        let mut data = InvoiceTaxData::new(
            InvoiceId(id),
            TaxAmounts::standard(dec!(100), dec!(21)),
            dec!(121),
        );
        data.section = section;
        PeriodInvoice::new(invoice, Some(data))
    }

    #[test]
    fn individual_lines_sorted_by_document_number() {
        let input = vec![
            entry(1, "FV-003", Direction::Outgoing, Some(Section::A4)),
            entry(2, "FV-001", Direction::Outgoing, Some(Section::A4)),
            entry(3, "FV-002", Direction::Outgoing, Some(Section::A4)),
        ];
        let agg = aggregate(&input);
        let numbers: Vec<_> = agg
            .lines(Section::A4)
            .iter()
            .map(|l| (l.row, l.document_number.as_str()))
            .collect();
        assert_eq!(numbers, vec![(1, "FV-001"), (2, "FV-002"), (3, "FV-003")]);
    }

    #[test]
    fn summary_counts_invoices() {
        let input = vec![
            entry(1, "a", Direction::Incoming, Some(Section::B3)),
            entry(2, "b", Direction::Incoming, Some(Section::B3)),
        ];
        let agg = aggregate(&input);
        let summary = agg.summary(Section::B3).unwrap();
        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.amounts.standard.base, dec!(200));
        assert_eq!(summary.amounts.standard.tax, dec!(42));
        assert!(agg.lines(Section::B3).is_empty());
    }

    #[test]
    fn unclassified_and_unreported_are_separated() {
        let mut no_data = entry(4, "x", Direction::Outgoing, None);
        no_data.tax_data = None;
        let input = vec![
            entry(1, "a", Direction::Outgoing, None),
            entry(2, "b", Direction::Outgoing, Some(Section::A3)),
            entry(3, "c", Direction::Outgoing, Some(Section::B2)),
            no_data,
        ];
        let agg = aggregate(&input);
        assert_eq!(agg.unclassified, vec![InvoiceId(1), InvoiceId(4)]);
        assert_eq!(agg.unreported, vec![InvoiceId(2), InvoiceId(3)]);
        assert_eq!(agg.line_count(), 0);
    }
}
