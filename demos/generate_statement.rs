use chrono::NaiveDate;
use hlaseni::core::*;
use hlaseni::filing::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), HlaseniError> {
    let period = ReportingPeriod::new(2025, 5)?;
    let taxpayer = parse_settings(
        r#"{
            "dic": "CZ12345678",
            "tax_office_code": "451",
            "name": "Stavby Brno s.r.o.",
            "street": "Masarykova 3",
            "city": "Brno",
            "postal_code": "602 00",
            "country": "ČESKÁ REPUBLIKA"
        }"#,
    )?;

    let invoices = InMemoryInvoiceRepository::new();
    let received = Invoice::new(InvoiceId(1), "FP-2025-041", period, Direction::Incoming)
        .counterparty("CZ87654321")
        .tax_point(NaiveDate::from_ymd_opt(2025, 5, 12).unwrap());
    invoices.insert(
        received,
        Some(InvoiceTaxData::new(
            InvoiceId(1),
            TaxAmounts::standard(dec!(12396.69), dec!(2603.31)),
            dec!(15000),
        )),
    )?;
    let issued = Invoice::new(InvoiceId(2), "FV-2025-007", period, Direction::Outgoing)
        .counterparty("CZ11223344")
        .tax_point(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
    invoices.insert(
        issued,
        Some(
            InvoiceTaxData::new(InvoiceId(2), TaxAmounts::standard(dec!(5000), dec!(0)), dec!(5000))
                .reverse_charge("4"),
        ),
    )?;

    let output = std::env::temp_dir().join("hlaseni-demo");
    let service = ControlStatementService::new(
        invoices,
        InMemorySubmissionStore::new(),
        FsDocumentSink::new(&output),
        taxpayer,
    );

    let report = service.classify_pending(period)?;
    for (id, section) in &report.classified {
        println!("invoice {id} -> {section}");
    }

    let outcome = service.generate(&GenerateRequest::regular(period))?;
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    println!("written to {}", outcome.submission.document_location);
    println!("{}", outcome.document());

    let submitted = service.mark_submitted(outcome.submission.id)?;
    println!(
        "submission {} for {} is {:?}",
        submitted.id,
        submitted.period,
        service.period_status(period)?
    );
    Ok(())
}
