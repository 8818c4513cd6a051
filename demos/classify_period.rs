use chrono::NaiveDate;
use hlaseni::core::*;
use rust_decimal_macros::dec;

fn main() {
    let period = ReportingPeriod::new(2025, 4).expect("valid period");
    let tax_point = NaiveDate::from_ymd_opt(2025, 4, 14).unwrap();

    let mut invoices = Vec::new();
    let raw = [
        (1, "FV-2025-101", Direction::Outgoing, dec!(40000), dec!(8400), None),
        (2, "FV-2025-102", Direction::Outgoing, dec!(3000), dec!(630), None),
        (3, "FV-2025-103", Direction::Outgoing, dec!(18000), dec!(0), Some("4")),
        (4, "FP-2025-077", Direction::Incoming, dec!(12396.69), dec!(2603.31), None),
        (5, "FP-2025-078", Direction::Incoming, dec!(826.45), dec!(173.55), None),
    ];
    for (id, number, direction, base, tax, reverse_charge) in raw {
        let invoice = Invoice::new(InvoiceId(id), number, period, direction)
            .counterparty("CZ87654321")
            .tax_point(tax_point);
        let mut data = InvoiceTaxData::new(invoice.id, TaxAmounts::standard(base, tax), base + tax);
        if let Some(code) = reverse_charge {
            data = data.reverse_charge(code);
        }
        let section = ensure_section(&invoice, &mut data);
        println!("{number}: {:>9} CZK -> {}", data.total_amount, section.map_or("-".into(), |s| s.to_string()));
        invoices.push(PeriodInvoice::new(invoice, Some(data)));
    }

    let aggregation = aggregate(&invoices);
    println!("\nPeriod {period}: {} individual lines", aggregation.line_count());
    for section in Section::DOCUMENT_ORDER {
        if let Some(summary) = aggregation.summary(section) {
            println!(
                "  {section} summary: {} invoices, base {} / tax {}",
                summary.invoice_count,
                summary.amounts.total_base(),
                summary.amounts.total_tax()
            );
        }
    }

    let sums = control_sums(&invoices);
    println!("\nControl sums:");
    println!("  outgoing base (standard): {}", format_amount(sums.outgoing_base.standard));
    println!("  incoming tax (standard):  {}", format_amount(sums.incoming_tax.standard));
    println!("  reverse-charge base:      {}", format_amount(sums.reverse_charge_outgoing_base));
}
