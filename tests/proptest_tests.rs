//! Property-based tests for classification, aggregation and control sums.
//!
//! Run with: `cargo test --test proptest_tests`

#![cfg(feature = "core")]

use hlaseni::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn period() -> ReportingPeriod {
    ReportingPeriod::new(2025, 6).unwrap()
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Amount with up to four decimals (-50000.0000 to 50000.0000).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (-500_000_000i64..=500_000_000i64).prop_map(|units| Decimal::new(units, 4))
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Outgoing), Just(Direction::Incoming)]
}

fn arb_amounts() -> impl Strategy<Value = TaxAmounts> {
    prop::array::uniform6(arb_amount()).prop_map(|[b1, t1, b2, t2, b3, t3]| {
        TaxAmounts::standard(b1, t1)
            .with_bucket(RateBucket::FirstReduced, b2, t2)
            .with_bucket(RateBucket::SecondReduced, b3, t3)
    })
}

/// A classified invoice; document numbers deliberately collide.
fn arb_invoice(id: i64) -> impl Strategy<Value = PeriodInvoice> {
    (
        arb_direction(),
        any::<bool>(),
        arb_amounts(),
        arb_amount(),
        0u8..5,
    )
        .prop_map(move |(direction, reverse_charge, amounts, total, number)| {
            let invoice = Invoice::new(InvoiceId(id), format!("D-{number}"), period(), direction);
            let mut data = InvoiceTaxData::new(invoice.id, amounts, total);
            if reverse_charge {
                data = data.reverse_charge("1");
            }
            ensure_section(&invoice, &mut data);
            PeriodInvoice::new(invoice, Some(data))
        })
}

/// 0-25 invoices with distinct ids.
fn arb_period() -> impl Strategy<Value = Vec<PeriodInvoice>> {
    (0i64..=25).prop_flat_map(|n| (1..=n).map(arb_invoice).collect::<Vec<_>>())
}

// ── Property Tests ──────────────────────────────────────────────────────────

proptest! {
    /// Reverse charge always lands in A1/B1 regardless of amount.
    #[test]
    fn reverse_charge_always_a1_or_b1(direction in arb_direction(), total in arb_amount()) {
        let expected = match direction {
            Direction::Outgoing => Section::A1,
            Direction::Incoming => Section::B1,
        };
        prop_assert_eq!(classify(direction, true, total), expected);
    }

    /// Rounding twice equals rounding once.
    #[test]
    fn rounding_is_idempotent(value in arb_amount()) {
        let once = round_amount(value);
        prop_assert_eq!(round_amount(once), once);
        prop_assert_eq!(format_amount(once), format_amount(value));
    }

    /// A5 and B3 summaries equal the field-wise sum of their rounded invoices.
    #[test]
    fn summary_is_sum_of_members(invoices in arb_period()) {
        let aggregation = aggregate(&invoices);
        for section in [Section::A5, Section::B3] {
            let members: Vec<&PeriodInvoice> = invoices
                .iter()
                .filter(|i| i.section() == Some(section))
                .collect();
            let expected: TaxAmounts = members
                .iter()
                .filter_map(|i| i.tax_data.as_ref())
                .map(|d| d.amounts.rounded())
                .sum();
            match aggregation.summary(section) {
                Some(summary) => {
                    prop_assert_eq!(summary.invoice_count, members.len());
                    prop_assert_eq!(summary.amounts, expected);
                }
                None => prop_assert!(members.is_empty()),
            }
        }
    }

    /// Control sums agree with the lines and summaries they cross-check.
    #[test]
    fn control_sums_match_lines(invoices in arb_period()) {
        let aggregation = aggregate(&invoices);
        let sums = control_sums(&invoices);

        let outgoing: TaxAmounts = [Section::A1, Section::A4]
            .into_iter()
            .flat_map(|s| aggregation.lines(s).iter().map(|l| l.amounts))
            .chain(aggregation.summary(Section::A5).map(|s| s.amounts))
            .sum();
        prop_assert_eq!(sums.outgoing_base.standard, outgoing.standard.base);
        prop_assert_eq!(sums.outgoing_base.first_reduced, outgoing.first_reduced.base);
        prop_assert_eq!(sums.outgoing_base.second_reduced, outgoing.second_reduced.base);

        let incoming: TaxAmounts = [Section::B1, Section::B2]
            .into_iter()
            .flat_map(|s| aggregation.lines(s).iter().map(|l| l.amounts))
            .chain(aggregation.summary(Section::B3).map(|s| s.amounts))
            .sum();
        prop_assert_eq!(sums.incoming_tax.standard, incoming.standard.tax);
        prop_assert_eq!(sums.incoming_tax.reduced(), incoming.first_reduced.tax + incoming.second_reduced.tax);

        let a1_base: Decimal = aggregation
            .lines(Section::A1)
            .iter()
            .map(|l| l.amounts.total_base())
            .sum();
        prop_assert_eq!(sums.reverse_charge_outgoing_base, a1_base);
    }

    /// Every invoice ends up in exactly one place.
    #[test]
    fn every_invoice_accounted_for(invoices in arb_period()) {
        let aggregation = aggregate(&invoices);
        let individual: usize = aggregation.invoice_lines.values().map(Vec::len).sum();
        let summarized: usize = aggregation.summaries.values().map(|s| s.invoice_count).sum();
        prop_assert_eq!(
            individual + summarized + aggregation.unclassified.len() + aggregation.unreported.len(),
            invoices.len()
        );
    }

    /// Input order never changes the result.
    #[test]
    fn aggregation_ignores_input_order(invoices in arb_period()) {
        let mut reversed = invoices.clone();
        reversed.reverse();
        prop_assert_eq!(aggregate(&invoices), aggregate(&reversed));
        prop_assert_eq!(control_sums(&invoices), control_sums(&reversed));
    }
}
