use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use super::error::HlaseniError;
use super::rounding::round_amount;

/// Identity of an invoice record held by the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub i64);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a submission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Calendar month over which invoices are filed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct ReportingPeriod {
    year: i32,
    month: u32,
}

/// Unchecked wire form of [`ReportingPeriod`].
#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for ReportingPeriod {
    type Error = HlaseniError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl ReportingPeriod {
    /// Create a period, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self, HlaseniError> {
        if !(1..=12).contains(&month) {
            return Err(HlaseniError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The period a date falls into.
    pub fn containing(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Whether the business issued (outgoing) or received (incoming) the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outgoing => f.write_str("outgoing"),
            Self::Incoming => f.write_str("incoming"),
        }
    }
}

/// Control statement section an invoice is reported in.
///
/// Outgoing invoices use the A sections, incoming invoices the B sections.
/// A2 and A3 exist in the schema but are only ever assigned by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    /// Reverse-charge supplies issued.
    A1,
    /// Manually assigned outgoing supplies reported line by line.
    A2,
    /// Manually assigned; has no element in the generated document.
    A3,
    /// Outgoing supplies above the threshold.
    A4,
    /// Outgoing supplies at or below the threshold, reported as one summary.
    A5,
    /// Reverse-charge supplies received.
    B1,
    /// Incoming supplies above the threshold.
    B2,
    /// Incoming supplies at or below the threshold, reported as one summary.
    B3,
}

impl Section {
    /// Sections in the order their elements appear in the document.
    pub const DOCUMENT_ORDER: [Section; 7] = [
        Section::A1,
        Section::A2,
        Section::A4,
        Section::A5,
        Section::B1,
        Section::B2,
        Section::B3,
    ];

    /// Section code as used in the schema element name (`Veta{code}`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
        }
    }

    /// Parse from a section code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "A1" => Some(Self::A1),
            "A2" => Some(Self::A2),
            "A3" => Some(Self::A3),
            "A4" => Some(Self::A4),
            "A5" => Some(Self::A5),
            "B1" => Some(Self::B1),
            "B2" => Some(Self::B2),
            "B3" => Some(Self::B3),
            _ => None,
        }
    }

    /// The invoice direction this section belongs to.
    pub fn direction(&self) -> Direction {
        match self {
            Self::A1 | Self::A2 | Self::A3 | Self::A4 | Self::A5 => Direction::Outgoing,
            Self::B1 | Self::B2 | Self::B3 => Direction::Incoming,
        }
    }

    /// Whether invoices in this section collapse into one summary line.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::A5 | Self::B3)
    }

    /// Whether this is a reverse-charge section.
    pub fn is_reverse_charge(&self) -> bool {
        matches!(self, Self::A1 | Self::B1)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// VAT rate bucket. Amounts are tracked per bucket, never per percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateBucket {
    /// Basic rate (`zakl_dane1` / `dan1`).
    Standard,
    /// First reduced rate (`zakl_dane2` / `dan2`).
    FirstReduced,
    /// Second reduced rate (`zakl_dane3` / `dan3`).
    SecondReduced,
}

impl RateBucket {
    pub const ALL: [RateBucket; 3] = [
        RateBucket::Standard,
        RateBucket::FirstReduced,
        RateBucket::SecondReduced,
    ];

    /// 1-based index used in attribute names (`zakl_dane{n}`).
    pub fn number(&self) -> u8 {
        match self {
            Self::Standard => 1,
            Self::FirstReduced => 2,
            Self::SecondReduced => 3,
        }
    }
}

/// Taxable base and tax for one rate bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAmounts {
    pub base: Decimal,
    pub tax: Decimal,
}

impl BucketAmounts {
    pub fn new(base: Decimal, tax: Decimal) -> Self {
        Self { base, tax }
    }
}

impl Add for BucketAmounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            base: self.base + rhs.base,
            tax: self.tax + rhs.tax,
        }
    }
}

/// Base/tax pairs for all three rate buckets of an invoice or line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAmounts {
    pub standard: BucketAmounts,
    pub first_reduced: BucketAmounts,
    pub second_reduced: BucketAmounts,
}

impl TaxAmounts {
    /// All-zero amounts.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Amounts with only the standard bucket filled.
    pub fn standard(base: Decimal, tax: Decimal) -> Self {
        Self {
            standard: BucketAmounts::new(base, tax),
            ..Self::default()
        }
    }

    /// Builder-style setter for one bucket.
    pub fn with_bucket(mut self, bucket: RateBucket, base: Decimal, tax: Decimal) -> Self {
        *self.bucket_mut(bucket) = BucketAmounts::new(base, tax);
        self
    }

    pub fn bucket(&self, bucket: RateBucket) -> BucketAmounts {
        match bucket {
            RateBucket::Standard => self.standard,
            RateBucket::FirstReduced => self.first_reduced,
            RateBucket::SecondReduced => self.second_reduced,
        }
    }

    pub fn bucket_mut(&mut self, bucket: RateBucket) -> &mut BucketAmounts {
        match bucket {
            RateBucket::Standard => &mut self.standard,
            RateBucket::FirstReduced => &mut self.first_reduced,
            RateBucket::SecondReduced => &mut self.second_reduced,
        }
    }

    /// Sum of the taxable base over all buckets.
    pub fn total_base(&self) -> Decimal {
        RateBucket::ALL.iter().map(|b| self.bucket(*b).base).sum()
    }

    /// Sum of the tax over all buckets.
    pub fn total_tax(&self) -> Decimal {
        RateBucket::ALL.iter().map(|b| self.bucket(*b).tax).sum()
    }

    /// Every field rounded to two decimals, half away from zero.
    pub fn rounded(&self) -> Self {
        let r = |b: BucketAmounts| BucketAmounts::new(round_amount(b.base), round_amount(b.tax));
        Self {
            standard: r(self.standard),
            first_reduced: r(self.first_reduced),
            second_reduced: r(self.second_reduced),
        }
    }
}

impl Add for TaxAmounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            standard: self.standard + rhs.standard,
            first_reduced: self.first_reduced + rhs.first_reduced,
            second_reduced: self.second_reduced + rhs.second_reduced,
        }
    }
}

impl AddAssign for TaxAmounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for TaxAmounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

/// An ingested invoice. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Evidence number of the tax document (`c_evid_dd`).
    pub document_number: String,
    pub period: ReportingPeriod,
    pub direction: Direction,
    /// Counterparty VAT id (`dic_odb` / `dic_dod`), if known.
    pub counterparty_vat_id: Option<String>,
    /// Date of the taxable supply (`dppd` / `duzp`), if known.
    pub tax_point_date: Option<NaiveDate>,
}

impl Invoice {
    pub fn new(
        id: InvoiceId,
        document_number: impl Into<String>,
        period: ReportingPeriod,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            document_number: document_number.into(),
            period,
            direction,
            counterparty_vat_id: None,
            tax_point_date: None,
        }
    }

    pub fn counterparty(mut self, vat_id: impl Into<String>) -> Self {
        self.counterparty_vat_id = Some(vat_id.into());
        self
    }

    pub fn tax_point(mut self, date: NaiveDate) -> Self {
        self.tax_point_date = Some(date);
        self
    }
}

/// Extracted or corrected tax data of an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTaxData {
    pub invoice_id: InvoiceId,
    pub amounts: TaxAmounts,
    /// Total amount including tax.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Reverse-charge supply code (`kod_pred_pl`); presence marks reverse charge.
    pub reverse_charge_code: Option<String>,
    /// Set by explicit confirmation or a full-confidence extraction. Never cleared.
    pub manually_verified: bool,
    /// Extraction confidence in 0.0..=1.0, if the data came from extraction.
    pub confidence: Option<f32>,
    /// Assigned section; `None` until classified.
    pub section: Option<Section>,
}

impl InvoiceTaxData {
    pub fn new(invoice_id: InvoiceId, amounts: TaxAmounts, total_amount: Decimal) -> Self {
        Self {
            invoice_id,
            amounts,
            total_amount,
            currency: "CZK".to_string(),
            reverse_charge_code: None,
            manually_verified: false,
            confidence: None,
            section: None,
        }
    }

    pub fn reverse_charge(mut self, code: impl Into<String>) -> Self {
        self.reverse_charge_code = Some(code.into());
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    pub fn is_reverse_charge(&self) -> bool {
        self.reverse_charge_code.is_some()
    }

    /// Set the verification flag. There is no way to clear it.
    pub fn mark_verified(&mut self) {
        self.manually_verified = true;
    }
}

/// Filing type of a control statement (`khdph_forma`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingType {
    /// `B`: regular filing.
    Regular,
    /// `O`: corrective filing within the deadline.
    Corrective,
    /// `N`: follow-up filing after the deadline.
    FollowUp,
    /// `E`: corrective follow-up filing.
    FollowUpCorrective,
}

impl FilingType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Regular => "B",
            Self::Corrective => "O",
            Self::FollowUp => "N",
            Self::FollowUpCorrective => "E",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Self::Regular),
            "O" => Some(Self::Corrective),
            "N" => Some(Self::FollowUp),
            "E" => Some(Self::FollowUpCorrective),
            _ => None,
        }
    }
}

/// Type of person filing (`typ_ds`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
    /// `P`: legal person.
    #[default]
    Legal,
    /// `F`: natural person.
    Natural,
}

impl PersonType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Legal => "P",
            Self::Natural => "F",
        }
    }
}

/// Identity of the filing taxpayer, supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxpayerSettings {
    /// Czech VAT id (DIČ), with or without the "CZ" prefix.
    pub dic: String,
    /// Registration tax office code (`c_ufo`).
    pub tax_office_code: String,
    pub person_type: PersonType,
    /// Legal or trading name (`zkrobchjm`).
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub email: Option<String>,
}

/// An invoice of a period together with its tax data, if extracted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInvoice {
    pub invoice: Invoice,
    pub tax_data: Option<InvoiceTaxData>,
}

impl PeriodInvoice {
    pub fn new(invoice: Invoice, tax_data: Option<InvoiceTaxData>) -> Self {
        Self { invoice, tax_data }
    }

    /// The recorded section, if the invoice has tax data and was classified.
    pub fn section(&self) -> Option<Section> {
        self.tax_data.as_ref().and_then(|t| t.section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_deserialization_checks_month() {
        let period: ReportingPeriod = serde_json::from_str(r#"{"year":2025,"month":3}"#).unwrap();
        assert_eq!(period, ReportingPeriod::new(2025, 3).unwrap());

        for month in [0, 13] {
            let json = format!(r#"{{"year":2025,"month":{month}}}"#);
            let err = serde_json::from_str::<ReportingPeriod>(&json).unwrap_err();
            assert!(err.to_string().contains("invalid reporting period"), "{err}");
        }
    }

    #[test]
    fn period_serializes_as_year_and_month() {
        let json = serde_json::to_string(&ReportingPeriod::new(2024, 12).unwrap()).unwrap();
        assert_eq!(json, r#"{"year":2024,"month":12}"#);
    }
}
