use hlaseni::core::*;
use hlaseni::filing::{InMemoryInvoiceRepository, InvoiceRepository};
use hlaseni::ocr::*;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), HlaseniError> {
    let period = ReportingPeriod::new(2025, 6)?;
    let invoices = Arc::new(InMemoryInvoiceRepository::new());
    for id in 1..=3 {
        let invoice = Invoice::new(InvoiceId(id), format!("FP-2025-{id:03}"), period, Direction::Incoming);
        invoices.insert(invoice, None)?;
    }

    // Stand-in for a real OCR backend: a fixed reading per invoice.
    let extractor = |invoice: &Invoice| -> Result<ExtractedTaxData, HlaseniError> {
        let base = dec!(5000) * rust_decimal::Decimal::from(invoice.id.0);
        Ok(ExtractedTaxData {
            amounts: TaxAmounts::standard(base, base * dec!(0.21)),
            total_amount: base * dec!(1.21),
            currency: "CZK".into(),
            reverse_charge_code: None,
            confidence: if invoice.id.0 == 3 { 1.0 } else { 0.85 },
        })
    };

    let queue = OcrQueue::new(InMemoryJobStore::new(), extractor, Arc::clone(&invoices));
    for id in 1..=3 {
        println!("{:?}", queue.enqueue(InvoiceId(id))?);
    }
    queue.wait_idle(Duration::from_secs(5))?;
    println!("{:?}", queue.status()?);

    for id in 1..=3 {
        if let Some(data) = invoices.tax_data(InvoiceId(id))? {
            println!(
                "invoice {id}: total {} section {:?} verified {}",
                data.total_amount, data.section, data.manually_verified
            );
        }
    }
    Ok(())
}
