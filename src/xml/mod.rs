//! DPHKH1 XML generation.
//!
//! Produces the control statement document accepted by the Czech tax
//! portal (EPO). Every record is an empty element whose data lives in
//! attributes; amounts always carry exactly two decimals.
//!
//! # Example
//!
//! ```ignore
//! use hlaseni::xml::*;
//!
//! let header = DocumentHeader::regular(period, today);
//! let xml = control_statement_xml(&header, &taxpayer, &invoices)?;
//! ```
//!
//! `demos/generate_statement.rs` prints a complete document
//! (`cargo run --example generate_statement --features filing`).

mod document;
mod xml_utils;

pub use document::{DPHKH1_VERSION, DocumentHeader, build_document, control_statement_xml};
pub use xml_utils::format_date;
