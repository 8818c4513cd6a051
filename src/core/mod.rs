//! Core types and the pure control statement pipeline.
//!
//! Classification, line aggregation, and control sums. Nothing in this
//! module performs I/O, so every function is safe to run in parallel across
//! invoices and periods.

mod aggregate;
mod classify;
mod control;
pub mod dic;
mod error;
mod rounding;
mod types;
mod validation;

pub use aggregate::*;
pub use classify::*;
pub use control::*;
pub use dic::{DicFormatError, normalize_dic, validate_dic, validate_vat_format};
pub use error::*;
pub use rounding::*;
pub use types::*;
pub use validation::*;
