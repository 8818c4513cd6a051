//! Cross-check totals for the `VetaC` block.
//!
//! Computed straight from the invoice data, independent of line grouping, so
//! they can be compared against the sums of the emitted section lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{PeriodInvoice, RateBucket, Section, TaxAmounts};

/// One amount per rate bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTotals {
    pub standard: Decimal,
    pub first_reduced: Decimal,
    pub second_reduced: Decimal,
}

impl RateTotals {
    pub fn get(&self, bucket: RateBucket) -> Decimal {
        match bucket {
            RateBucket::Standard => self.standard,
            RateBucket::FirstReduced => self.first_reduced,
            RateBucket::SecondReduced => self.second_reduced,
        }
    }

    /// Both reduced buckets together.
    pub fn reduced(&self) -> Decimal {
        self.first_reduced + self.second_reduced
    }

    pub fn total(&self) -> Decimal {
        self.standard + self.reduced()
    }

    fn add_bases(&mut self, amounts: &TaxAmounts) {
        self.standard += amounts.standard.base;
        self.first_reduced += amounts.first_reduced.base;
        self.second_reduced += amounts.second_reduced.base;
    }

    fn add_taxes(&mut self, amounts: &TaxAmounts) {
        self.standard += amounts.standard.tax;
        self.first_reduced += amounts.first_reduced.tax;
        self.second_reduced += amounts.second_reduced.tax;
    }
}

/// Control sums of a reporting period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSums {
    /// Taxable base of outgoing invoices (A1 + A4 + A5).
    pub outgoing_base: RateTotals,
    /// Tax of incoming invoices (B1 + B2 + B3).
    pub incoming_tax: RateTotals,
    /// Taxable base of reverse-charge supplies issued (A1), all buckets.
    pub reverse_charge_outgoing_base: Decimal,
    /// Tax of reverse-charge supplies received (B1).
    pub reverse_charge_incoming_tax: RateTotals,
}

impl ControlSums {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Compute the control sums over every classified invoice of a period.
///
/// Only A1/A4/A5 and B1/B2/B3 contribute; A2, A3, unclassified invoices and
/// sections that contradict the invoice direction do not. Amounts are rounded
/// to two decimals per invoice before summing, matching the section lines.
pub fn control_sums(invoices: &[PeriodInvoice]) -> ControlSums {
    let mut sums = ControlSums::default();

    for entry in invoices {
        let Some(tax_data) = entry.tax_data.as_ref() else {
            continue;
        };
        let Some(section) = tax_data.section else {
            continue;
        };
        if section.direction() != entry.invoice.direction {
            continue;
        }
        let amounts = tax_data.amounts.rounded();

        match section {
            Section::A1 => {
                sums.outgoing_base.add_bases(&amounts);
                sums.reverse_charge_outgoing_base += amounts.total_base();
            }
            Section::A4 | Section::A5 => sums.outgoing_base.add_bases(&amounts),
            Section::B1 => {
                sums.incoming_tax.add_taxes(&amounts);
                sums.reverse_charge_incoming_tax.add_taxes(&amounts);
            }
            Section::B2 | Section::B3 => sums.incoming_tax.add_taxes(&amounts),
            Section::A2 | Section::A3 => {}
        }
    }

    sums
}
