//! Assignment of invoices to control statement sections.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::HlaseniError;
use super::types::{Direction, Invoice, InvoiceTaxData, Section};

/// Amount including tax above which an invoice is reported line by line.
///
/// The comparison is strict: an invoice of exactly this amount lands in the
/// summary section (A5/B3). Confirm against the current DPHKH1 instructions
/// before changing it; a shift here silently misfiles boundary invoices.
pub const CLASSIFICATION_THRESHOLD: Decimal = dec!(10_000);

/// Classify an invoice from its direction, reverse-charge indicator, and
/// total amount including tax.
///
/// | direction | reverse charge | amount        | section |
/// |-----------|----------------|---------------|---------|
/// | outgoing  | yes            | any           | A1      |
/// | outgoing  | no             | > threshold   | A4      |
/// | outgoing  | no             | ≤ threshold   | A5      |
/// | incoming  | yes            | any           | B1      |
/// | incoming  | no             | > threshold   | B2      |
/// | incoming  | no             | ≤ threshold   | B3      |
///
/// The sign of `total_amount` is ignored, so credit notes classify by size.
pub fn classify(direction: Direction, reverse_charge: bool, total_amount: Decimal) -> Section {
    let above = total_amount.abs() > CLASSIFICATION_THRESHOLD;
    match (direction, reverse_charge, above) {
        (Direction::Outgoing, true, _) => Section::A1,
        (Direction::Outgoing, false, true) => Section::A4,
        (Direction::Outgoing, false, false) => Section::A5,
        (Direction::Incoming, true, _) => Section::B1,
        (Direction::Incoming, false, true) => Section::B2,
        (Direction::Incoming, false, false) => Section::B3,
    }
}

/// Classify `tax_data` unless it already carries a section.
///
/// Returns the newly assigned section, or `None` when a section was already
/// recorded. A recorded section (manual or earlier) is never overwritten.
pub fn ensure_section(invoice: &Invoice, tax_data: &mut InvoiceTaxData) -> Option<Section> {
    if tax_data.section.is_some() {
        return None;
    }
    let section = classify(
        invoice.direction,
        tax_data.is_reverse_charge(),
        tax_data.total_amount,
    );
    tax_data.section = Some(section);
    Some(section)
}

/// Manually assign a section, overriding any previous one.
///
/// Rejects sections that belong to the other direction.
pub fn assign_section(
    invoice: &Invoice,
    tax_data: &mut InvoiceTaxData,
    section: Section,
) -> Result<(), HlaseniError> {
    if section.direction() != invoice.direction {
        return Err(HlaseniError::SectionMismatch {
            section,
            direction: invoice.direction,
        });
    }
    tax_data.section = Some(section);
    Ok(())
}
