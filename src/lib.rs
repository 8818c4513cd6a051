//! # hlaseni
//!
//! Czech VAT control statement (kontrolní hlášení DPH) generation: invoice
//! section classification, line aggregation, control sums, the DPHKH1 XML
//! document, and the submission lifecycle around it.
//!
//! All monetary values use [`rust_decimal::Decimal`], rounded half away from
//! zero to two decimals before they are summed or written.
//!
//! ## Quick Start
//!
//! ```rust
//! use hlaseni::core::*;
//! use rust_decimal_macros::dec;
//!
//! let period = ReportingPeriod::new(2025, 4).unwrap();
//! let invoice = Invoice::new(InvoiceId(1), "FP-2025-017", period, Direction::Incoming)
//!     .counterparty("CZ12345678");
//! let mut tax_data = InvoiceTaxData::new(
//!     invoice.id,
//!     TaxAmounts::standard(dec!(12396.69), dec!(2603.31)),
//!     dec!(15000),
//! );
//!
//! assert_eq!(ensure_section(&invoice, &mut tax_data), Some(Section::B2));
//!
//! let invoices = [PeriodInvoice::new(invoice, Some(tax_data))];
//! let aggregation = aggregate(&invoices);
//! assert_eq!(aggregation.lines(Section::B2).len(), 1);
//! assert_eq!(control_sums(&invoices).incoming_tax.standard, dec!(2603.31));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, classification, aggregation, control sums, DIČ checks |
//! | `xml` | DPHKH1 document generation |
//! | `filing` | Generation service, submission lifecycle, stores, settings |
//! | `ocr` | Background tax-data extraction queue |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

#[cfg(feature = "filing")]
pub mod filing;

#[cfg(feature = "ocr")]
pub mod ocr;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
